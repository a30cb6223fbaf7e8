//! Global hotkeys for the talk and logout actions, backed by `rdev`.
//!
//! Both hotkeys are taps, not holds: only key presses matter, releases are
//! ignored.  Pressing the talk key is equivalent to tapping the on-screen
//! microphone button.
//!
//! # Usage
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use voice_assistant::hotkey::{parse_key, HotkeyEvent, HotkeyListener};
//!
//! let (tx, mut rx) = mpsc::channel(16);
//! let talk = parse_key("F9").expect("unknown key");
//! let logout = parse_key("F10").expect("unknown key");
//! let _listener = HotkeyListener::start(talk, logout, tx);
//!
//! // In your async loop:
//! // while let Some(ev) = rx.recv().await { ... }
//! ```

pub mod listener;

pub use listener::HotkeyListener;

// ---------------------------------------------------------------------------
// HotkeyEvent
// ---------------------------------------------------------------------------

/// Events emitted by the hotkey listener thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// The talk key was tapped.
    TalkPressed,
    /// The logout key was tapped.
    LogoutPressed,
}

// ---------------------------------------------------------------------------
// parse_key
// ---------------------------------------------------------------------------

/// Parse a hotkey name from a config string into an [`rdev::Key`].
///
/// Supports F1–F12, a handful of named keys, and single ASCII letters
/// (case-insensitive).  Returns `None` for unrecognised names so callers
/// can fall back to a default.
pub fn parse_key(key_str: &str) -> Option<rdev::Key> {
    use rdev::Key;

    // F1..F12
    if let Some(n) = key_str.strip_prefix(&['F', 'f'][..]) {
        if let Ok(n) = n.parse::<u8>() {
            return match n {
                1 => Some(Key::F1),
                2 => Some(Key::F2),
                3 => Some(Key::F3),
                4 => Some(Key::F4),
                5 => Some(Key::F5),
                6 => Some(Key::F6),
                7 => Some(Key::F7),
                8 => Some(Key::F8),
                9 => Some(Key::F9),
                10 => Some(Key::F10),
                11 => Some(Key::F11),
                12 => Some(Key::F12),
                _ => None,
            };
        }
    }

    // Single ASCII letters, case-insensitive.
    if key_str.len() == 1 {
        let c = key_str.chars().next()?.to_ascii_uppercase();
        if c.is_ascii_uppercase() {
            return Some(match c {
                'A' => Key::KeyA,
                'B' => Key::KeyB,
                'C' => Key::KeyC,
                'D' => Key::KeyD,
                'E' => Key::KeyE,
                'F' => Key::KeyF,
                'G' => Key::KeyG,
                'H' => Key::KeyH,
                'I' => Key::KeyI,
                'J' => Key::KeyJ,
                'K' => Key::KeyK,
                'L' => Key::KeyL,
                'M' => Key::KeyM,
                'N' => Key::KeyN,
                'O' => Key::KeyO,
                'P' => Key::KeyP,
                'Q' => Key::KeyQ,
                'R' => Key::KeyR,
                'S' => Key::KeyS,
                'T' => Key::KeyT,
                'U' => Key::KeyU,
                'V' => Key::KeyV,
                'W' => Key::KeyW,
                'X' => Key::KeyX,
                'Y' => Key::KeyY,
                'Z' => Key::KeyZ,
                _ => return None,
            });
        }
    }

    match key_str {
        "Escape" | "Esc" => Some(Key::Escape),
        "Space" => Some(Key::Space),
        "Return" | "Enter" => Some(Key::Return),
        "Tab" => Some(Key::Tab),
        "Home" => Some(Key::Home),
        "End" => Some(Key::End),
        "PageUp" => Some(Key::PageUp),
        "PageDown" => Some(Key::PageDown),
        "Pause" => Some(Key::Pause),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_function_keys() {
        assert_eq!(parse_key("F9"), Some(rdev::Key::F9));
        assert_eq!(parse_key("F1"), Some(rdev::Key::F1));
        assert_eq!(parse_key("F12"), Some(rdev::Key::F12));
        assert_eq!(parse_key("F13"), None);
    }

    #[test]
    fn parse_named_keys() {
        assert_eq!(parse_key("Escape"), Some(rdev::Key::Escape));
        assert_eq!(parse_key("Esc"), Some(rdev::Key::Escape));
        assert_eq!(parse_key("Enter"), Some(rdev::Key::Return));
    }

    #[test]
    fn parse_letter_keys_case_insensitive() {
        assert_eq!(parse_key("A"), Some(rdev::Key::KeyA));
        assert_eq!(parse_key("a"), Some(rdev::Key::KeyA));
        assert_eq!(parse_key("z"), Some(rdev::Key::KeyZ));
    }

    #[test]
    fn parse_unknown_key_returns_none() {
        assert_eq!(parse_key("xyz"), None);
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("Ctrl+V"), None);
        assert_eq!(parse_key("1"), None);
    }
}

//! Command dispatch — resolved commands to browser side effects.
//!
//! The dispatch table is total: every [`CommandKind`] maps to either a URL
//! to open or to no side effect at all.  An unrecognized command is valid;
//! it simply does nothing beyond the spoken reply.

use std::sync::Arc;

use thiserror::Error;

use crate::intent::{Command, CommandKind};

// ---------------------------------------------------------------------------
// DispatchError
// ---------------------------------------------------------------------------

/// Errors from acting on a command.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The platform refused to open the URL.
    #[error("failed to open URL: {0}")]
    Open(String),
}

// ---------------------------------------------------------------------------
// Dispatch table
// ---------------------------------------------------------------------------

/// Map a command to the URL it opens, if any.
///
/// `user_input` is percent-encoded wherever it lands in a query string, so
/// spaces, `&` and non-ASCII text survive intact.
pub fn action_url(kind: CommandKind, user_input: &str) -> Option<String> {
    let encoded = urlencoding::encode(user_input);
    match kind {
        CommandKind::GoogleSearch => Some(format!("https://www.google.com/search?q={encoded}")),
        CommandKind::CalculatorOpen => {
            Some("https://www.google.com/search?q=calculator".to_string())
        }
        CommandKind::InstagramOpen => Some("https://www.instagram.com/".to_string()),
        CommandKind::FacebookOpen => Some("https://www.facebook.com/".to_string()),
        CommandKind::WeatherShow => Some("https://www.google.com/search?q=weather".to_string()),
        CommandKind::YoutubeSearch | CommandKind::YoutubePlay => Some(format!(
            "https://www.youtube.com/results?search_query={encoded}"
        )),
        CommandKind::GeneralQuery | CommandKind::Unknown => None,
    }
}

// ---------------------------------------------------------------------------
// UrlOpener
// ---------------------------------------------------------------------------

/// Seam over the platform's URL-opening facility, so dispatch logic can be
/// tested with a recording fake.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), DispatchError>;
}

/// Opens URLs in the system default browser.
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<(), DispatchError> {
        open::that(url).map_err(|e| DispatchError::Open(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Executes the side effect of a resolved command.
pub struct Dispatcher {
    opener: Arc<dyn UrlOpener>,
}

impl Dispatcher {
    pub fn new(opener: Arc<dyn UrlOpener>) -> Self {
        Self { opener }
    }

    /// Act on `command`.  Failures are logged, never propagated; a broken
    /// browser must not take the interaction loop down with it.
    pub fn dispatch(&self, command: &Command) {
        let Some(url) = action_url(command.kind, &command.user_input) else {
            log::debug!("command {:?} has no side effect", command.kind);
            return;
        };

        log::info!("opening {url}");
        if let Err(e) = self.opener.open(&url) {
            log::warn!("dispatch failed: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
    }

    impl RecordingOpener {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                opened: Mutex::new(Vec::new()),
            })
        }
    }

    impl UrlOpener for RecordingOpener {
        fn open(&self, url: &str) -> Result<(), DispatchError> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn command(kind: CommandKind, user_input: &str) -> Command {
        Command {
            kind,
            user_input: user_input.to_string(),
            response: String::new(),
        }
    }

    #[test]
    fn search_queries_are_percent_encoded() {
        assert_eq!(
            action_url(CommandKind::GoogleSearch, "rust & wasm"),
            Some("https://www.google.com/search?q=rust%20%26%20wasm".to_string())
        );
        assert_eq!(
            action_url(CommandKind::YoutubeSearch, "lo-fi beats"),
            Some("https://www.youtube.com/results?search_query=lo-fi%20beats".to_string())
        );
    }

    #[test]
    fn fixed_destinations_ignore_user_input() {
        assert_eq!(
            action_url(CommandKind::InstagramOpen, "anything"),
            Some("https://www.instagram.com/".to_string())
        );
        assert_eq!(
            action_url(CommandKind::FacebookOpen, ""),
            Some("https://www.facebook.com/".to_string())
        );
        assert_eq!(
            action_url(CommandKind::CalculatorOpen, "2+2"),
            Some("https://www.google.com/search?q=calculator".to_string())
        );
        assert_eq!(
            action_url(CommandKind::WeatherShow, "pune"),
            Some("https://www.google.com/search?q=weather".to_string())
        );
    }

    /// Every command kind either opens a URL or deliberately does nothing.
    #[test]
    fn table_is_total_over_all_kinds() {
        let all = [
            CommandKind::GoogleSearch,
            CommandKind::CalculatorOpen,
            CommandKind::InstagramOpen,
            CommandKind::FacebookOpen,
            CommandKind::WeatherShow,
            CommandKind::YoutubeSearch,
            CommandKind::YoutubePlay,
            CommandKind::GeneralQuery,
            CommandKind::Unknown,
        ];
        for kind in all {
            // Must not panic, whatever the input.
            let _ = action_url(kind, "query with spaces & symbols");
        }
    }

    #[test]
    fn dispatcher_opens_resolved_url() {
        let opener = RecordingOpener::new();
        let dispatcher = Dispatcher::new(Arc::clone(&opener) as Arc<dyn UrlOpener>);

        dispatcher.dispatch(&command(CommandKind::YoutubePlay, "cat videos"));

        let opened = opener.opened.lock().unwrap();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].starts_with("https://www.youtube.com/results"));
    }

    #[test]
    fn unknown_command_opens_nothing() {
        let opener = RecordingOpener::new();
        let dispatcher = Dispatcher::new(Arc::clone(&opener) as Arc<dyn UrlOpener>);

        dispatcher.dispatch(&command(CommandKind::Unknown, "make coffee"));
        dispatcher.dispatch(&command(CommandKind::GeneralQuery, "capital of France"));

        assert!(opener.opened.lock().unwrap().is_empty());
    }
}

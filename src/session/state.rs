//! Interaction state machine and shared session state.
//!
//! [`Phase`] drives the controller's state machine.  A UI shell reads it
//! via [`SharedState`] to render the appropriate view (mic animation,
//! transcript, reply text).
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<SessionState>>` — cheap
//! to clone and safe to share across threads.

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Phases of one voice interaction.
///
/// The state machine transitions are:
///
/// ```text
/// Idle ──talk key, mic live──▶ Listening
///      ──wake-word transcript─▶ Resolving
///                               ──command──▶ Speaking ──utterance ends──▶ Idle
///                               ──error────▶ Idle
/// Listening ──no wake word / session ends──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Waiting for the user to press the talk key.
    #[default]
    Idle,

    /// Microphone is active; a recognition session is running.
    Listening,

    /// A wake-word transcript is with the intent resolver.
    Resolving,

    /// The assistant's reply is synthesizing or playing.
    Speaking,
}

impl Phase {
    /// A short human-readable label suitable for a status display.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Listening => "Listening",
            Phase::Resolving => "Thinking",
            Phase::Speaking => "Speaking",
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Shared session state — the single source of truth for a UI shell.
///
/// Held behind [`SharedState`].  The interaction controller mutates it; a
/// display layer reads it.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Current phase of the interaction.
    pub phase: Phase,

    /// True while the microphone is actually live (between the input
    /// subsystem's `Started` and `Ended` events).
    pub listening: bool,

    /// The wake-word transcript currently being acted on.
    ///
    /// Cleared when the spoken reply finishes, so a display does not show
    /// a stale request next to a fresh idle screen.
    pub last_transcript: Option<String>,

    /// The assistant's most recent spoken reply.
    pub last_response: Option<String>,
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`SessionState`].
///
/// Cheap to clone (`Arc` clone).  Lock with `.lock().unwrap()` for a short
/// critical section; do **not** hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<SessionState>>;

/// Construct a new [`SharedState`] wrapping a default [`SessionState`].
pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(SessionState::default()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Speech subsystems — recognition (input) and synthesis (output).
//!
//! Both subsystems sit behind object-safe traits ([`SpeechInput`],
//! [`SpeechOutput`]) and report back through explicit event enums over
//! `tokio::sync::mpsc`, so the interaction state machine can be unit-tested
//! with substitutable fakes instead of real audio hardware.
//!
//! # Events
//!
//! ```text
//! SpeechInput ──▶ Started | Transcript(text) | Ended | Error(msg)
//! SpeechOutput ─▶ Ready | UtteranceEnded { text }
//! ```

pub mod input;
pub mod output;
pub mod stt;
pub mod tts;

pub use input::{MicRecognizer, RecognizerError, SpeechInput};
pub use output::{AudioSink, SpeakerSink, SpeechOutput, Synthesizer};
pub use stt::{SttBackend, SttError, WhisperApi};
pub use tts::{voice_for_locale, HttpTts, TtsBackend, TtsError, VoiceInfo};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Asynchronous notifications from a recognition session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechInputEvent {
    /// The microphone is live; recognition has actually begun.
    Started,
    /// The final transcript of the session.  At most one per session; when
    /// the underlying engine reports several, the last one wins.
    Transcript(String),
    /// The session is over (after a result, an error, or cancellation).
    Ended,
    /// A transient recognition failure (e.g. no speech detected, device
    /// busy).  Logged by the consumer, never fatal.
    Error(String),
}

/// Asynchronous notifications from the synthesis subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutputEvent {
    /// One-time signal that the voice catalog has been resolved (or given
    /// up on).  Deferred work such as the startup greeting waits for this.
    Ready,
    /// An utterance played to its natural end.  Never emitted for an
    /// utterance that was cancelled by a later `speak` call.
    UtteranceEnded {
        /// The text that finished playing.
        text: String,
    },
}

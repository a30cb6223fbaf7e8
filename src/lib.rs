//! Voice Assistant — a headless push-to-talk assistant client.
//!
//! # Pipeline
//!
//! ```text
//! Talk key → MicRecognizer (capture → endpoint → STT API)
//!          → wake-word gate → IntentResolver (chat-completions API)
//!          → CommandDispatcher (browser URL) + Synthesizer (TTS API → speakers)
//! ```
//!
//! The [`session::InteractionController`] is the heart of the crate: an
//! event-driven state machine that owns the recognition and synthesis
//! lifecycles and guarantees they never talk over each other.

pub mod account;
pub mod audio;
pub mod config;
pub mod dispatch;
pub mod hotkey;
pub mod intent;
pub mod profile;
pub mod session;
pub mod speech;

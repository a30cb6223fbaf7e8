//! Audio plumbing — microphone capture, format conversion, endpointing,
//! WAV encoding and cancellable speaker playback.
//!
//! # Capture path
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → downmix_to_mono
//!           → resample(…, 16 000) → EndpointDetector → encode_wav → STT API
//! ```
//!
//! # Playback path
//!
//! ```text
//! TTS API (MP3) → decode_mp3 → to_playback_rate → SpeakerOutput::play
//!                                                  (cancel-flag aware)
//! ```

pub mod capture;
pub mod endpoint;
pub mod playback;
pub mod resample;
pub mod wav;

pub use capture::{AudioChunk, CaptureError, MicCapture, StreamHandle};
pub use endpoint::EndpointDetector;
pub use playback::{
    decode_mp3, to_playback_rate, PlayOutcome, PlaybackError, SpeakerOutput, PLAYBACK_SAMPLE_RATE,
};
pub use resample::{downmix_to_mono, resample};
pub use wav::{encode_wav, WavError};

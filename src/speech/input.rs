//! Push-to-talk speech recognition.
//!
//! [`MicRecognizer`] runs one single-shot recognition session at a time:
//! open the microphone, accumulate one utterance (endpointed on silence),
//! transcribe it through the [`SttBackend`], emit the final transcript, and
//! release the microphone.  There is no continuous listening mode.
//!
//! # Session races
//!
//! A `start()` while a session is already active is an **expected** race
//! (user double-taps the talk key) — it is dropped with a debug log, never
//! queued and never an error.  `stop()` is idempotent: with no active
//! session it does nothing at all.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::audio::{
    downmix_to_mono, encode_wav, resample, CaptureError, EndpointDetector, MicCapture, WavError,
};
use crate::config::AudioConfig;
use crate::speech::stt::{SttBackend, SttError};
use crate::speech::SpeechInputEvent;

// ---------------------------------------------------------------------------
// RecognizerError
// ---------------------------------------------------------------------------

/// Errors that can surface inside a recognition session.  All of them are
/// transient: they end the session with an `Error` event and the subsystem
/// is immediately ready for the next `start()`.
#[derive(Debug, Error)]
pub enum RecognizerError {
    /// The session heard nothing above the energy threshold.
    #[error("no speech detected")]
    NoSpeech,

    /// Microphone setup or streaming failed.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// The captured utterance could not be encoded for upload.
    #[error(transparent)]
    Wav(#[from] WavError),

    /// The transcription backend failed.
    #[error(transparent)]
    Stt(#[from] SttError),
}

// ---------------------------------------------------------------------------
// SpeechInput trait
// ---------------------------------------------------------------------------

/// Object-safe handle to the recognition subsystem.
///
/// Both methods return immediately; all outcomes arrive asynchronously as
/// [`SpeechInputEvent`]s on the channel the implementation was built with.
pub trait SpeechInput: Send + Sync {
    /// Begin a capture session.  A no-op (logged) when one is already
    /// active.
    fn start(&self);

    /// End the active session, if any.  Idempotent; always safe to call on
    /// teardown.
    fn stop(&self);
}

// ---------------------------------------------------------------------------
// MicRecognizer
// ---------------------------------------------------------------------------

/// Production [`SpeechInput`]: microphone capture plus a hosted STT backend.
///
/// Must be used from within a tokio runtime — `start()` spawns the session
/// task.
pub struct MicRecognizer {
    stt: Arc<dyn SttBackend>,
    audio: AudioConfig,
    events: mpsc::Sender<SpeechInputEvent>,
    active: Arc<AtomicBool>,
    cancel: Arc<Mutex<Option<Arc<AtomicBool>>>>,
}

impl MicRecognizer {
    /// Create a recognizer that reports through `events`.
    pub fn new(
        stt: Arc<dyn SttBackend>,
        audio: AudioConfig,
        events: mpsc::Sender<SpeechInputEvent>,
    ) -> Self {
        Self {
            stt,
            audio,
            events,
            active: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(Mutex::new(None)),
        }
    }

    /// Claim the single session slot.  Returns `false` when a session is
    /// already active (the caller drops the request).
    fn try_begin(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

impl SpeechInput for MicRecognizer {
    fn start(&self) {
        if !self.try_begin() {
            // Expected on double-taps; single-session semantics, no queue.
            log::debug!("recognition session already active — dropping start request");
            return;
        }

        let session_cancel = Arc::new(AtomicBool::new(false));
        *self.cancel.lock().unwrap() = Some(Arc::clone(&session_cancel));

        let stt = Arc::clone(&self.stt);
        let audio = self.audio.clone();
        let events = self.events.clone();
        let active = Arc::clone(&self.active);

        tokio::spawn(async move {
            run_session(stt, audio, &events, session_cancel).await;
            active.store(false, Ordering::SeqCst);
        });
    }

    fn stop(&self) {
        if let Some(cancel) = self.cancel.lock().unwrap().take() {
            cancel.store(true, Ordering::SeqCst);
        }
    }
}

// ---------------------------------------------------------------------------
// Session body
// ---------------------------------------------------------------------------

/// One complete recognition session: capture → endpoint → transcribe.
///
/// Always emits a terminal `Ended` event, whatever path the session takes,
/// so the consumer's `listening` flag cannot get stuck.
async fn run_session(
    stt: Arc<dyn SttBackend>,
    audio: AudioConfig,
    events: &mpsc::Sender<SpeechInputEvent>,
    cancel: Arc<AtomicBool>,
) {
    let events_blocking = events.clone();
    let capture_audio = audio.clone();
    let capture_cancel = Arc::clone(&cancel);

    // The cpal stream is not Send; the whole capture loop lives on one
    // blocking thread and hands back the finished utterance.
    let captured = tokio::task::spawn_blocking(move || {
        capture_utterance(&capture_audio, &events_blocking, &capture_cancel)
    })
    .await;

    let samples = match captured {
        Ok(Ok(Some(samples))) => samples,
        Ok(Ok(None)) => {
            // Cancelled by stop(); nothing to transcribe.
            let _ = events.send(SpeechInputEvent::Ended).await;
            return;
        }
        Ok(Err(e)) => {
            let _ = events.send(SpeechInputEvent::Error(e.to_string())).await;
            let _ = events.send(SpeechInputEvent::Ended).await;
            return;
        }
        Err(e) => {
            let _ = events
                .send(SpeechInputEvent::Error(format!("capture task failed: {e}")))
                .await;
            let _ = events.send(SpeechInputEvent::Ended).await;
            return;
        }
    };

    let result = async {
        let wav = encode_wav(&samples, audio.sample_rate)?;
        let text = stt.transcribe(wav).await?;
        Ok::<_, RecognizerError>(text)
    }
    .await;

    match result {
        Ok(text) => {
            let text = text.trim().to_string();
            if text.is_empty() {
                let _ = events
                    .send(SpeechInputEvent::Error(
                        RecognizerError::NoSpeech.to_string(),
                    ))
                    .await;
            } else {
                let _ = events.send(SpeechInputEvent::Transcript(text)).await;
            }
        }
        Err(e) => {
            let _ = events.send(SpeechInputEvent::Error(e.to_string())).await;
        }
    }

    let _ = events.send(SpeechInputEvent::Ended).await;
}

/// Blocking capture loop.  Emits `Started` once the stream is live; returns
/// `Ok(None)` when the session was cancelled before the utterance completed.
fn capture_utterance(
    audio: &AudioConfig,
    events: &mpsc::Sender<SpeechInputEvent>,
    cancel: &AtomicBool,
) -> Result<Option<Vec<f32>>, RecognizerError> {
    let mic = MicCapture::open()?;
    let native_rate = mic.sample_rate();
    let channels = mic.channels();

    let (chunk_tx, chunk_rx) = std::sync::mpsc::channel();
    // RAII: dropping the handle on any exit path releases the microphone.
    let _handle = mic.start(chunk_tx)?;

    let _ = events.blocking_send(SpeechInputEvent::Started);
    log::debug!("recognition session started ({native_rate} Hz, {channels} ch)");

    let mut detector = EndpointDetector::new(audio);

    loop {
        if cancel.load(Ordering::SeqCst) {
            return Ok(None);
        }

        match chunk_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(chunk) => {
                let mono = downmix_to_mono(&chunk.samples, channels);
                let frame = resample(&mono, native_rate, audio.sample_rate);
                if detector.push(&frame) {
                    break;
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    if !detector.heard_speech() {
        return Err(RecognizerError::NoSpeech);
    }

    Ok(Some(detector.take_audio()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend stub; never reached in these tests.
    struct NullStt;

    #[async_trait::async_trait]
    impl SttBackend for NullStt {
        async fn transcribe(&self, _wav: Vec<u8>) -> Result<String, SttError> {
            Ok(String::new())
        }
    }

    fn make_recognizer() -> (MicRecognizer, mpsc::Receiver<SpeechInputEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let rec = MicRecognizer::new(Arc::new(NullStt), AudioConfig::default(), tx);
        (rec, rx)
    }

    /// `stop()` with no active session must be a silent no-op.
    #[tokio::test]
    async fn stop_without_session_is_noop() {
        let (rec, mut rx) = make_recognizer();
        rec.stop();
        rec.stop(); // twice, for idempotence
        assert!(rx.try_recv().is_err(), "no events may be emitted");
    }

    /// The session slot admits exactly one session at a time.
    #[test]
    fn second_begin_is_rejected_while_active() {
        let (tx, _rx) = mpsc::channel(16);
        let rec = MicRecognizer::new(Arc::new(NullStt), AudioConfig::default(), tx);

        assert!(rec.try_begin());
        assert!(!rec.try_begin(), "second session must be dropped");

        rec.active.store(false, Ordering::SeqCst);
        assert!(rec.try_begin(), "slot is reusable after the session ends");
    }

    /// The recognizer must be usable behind `Arc<dyn SpeechInput>`.
    #[test]
    fn recognizer_is_object_safe() {
        let (rec, _rx) = make_recognizer();
        let _: Arc<dyn SpeechInput> = Arc::new(rec);
    }
}

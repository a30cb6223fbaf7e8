//! Speech synthesis with a cancel-before-speak policy.
//!
//! [`Synthesizer`] accepts `speak` requests, cancels whatever is currently
//! playing, synthesizes through the [`TtsBackend`] and plays through an
//! [`AudioSink`].  The policy is last-call-wins: only the most recent
//! utterance may ever report [`SpeechOutputEvent::UtteranceEnded`]; a
//! superseded or cancelled utterance vanishes without an event.
//!
//! Supersession is tracked two ways, both checked before the end event is
//! sent: the per-utterance cancel flag (raised synchronously by the next
//! `speak` or by `cancel_all`) and a monotonically increasing generation
//! counter.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::audio::{decode_mp3, to_playback_rate, PlayOutcome, PlaybackError, SpeakerOutput};
use crate::config::SynthesisConfig;
use crate::speech::tts::{voice_for_locale, TtsBackend};
use crate::speech::SpeechOutputEvent;

// ---------------------------------------------------------------------------
// SpeechOutput trait
// ---------------------------------------------------------------------------

/// Object-safe handle to the synthesis subsystem.
pub trait SpeechOutput: Send + Sync {
    /// Queue `text` for playback, cancelling any in-flight utterance first.
    /// Returns immediately; completion arrives as an `UtteranceEnded` event.
    fn speak(&self, text: &str);

    /// Cancel any in-flight utterance.  No end event is emitted for it.
    fn cancel_all(&self);

    /// True while an utterance is synthesizing or playing.
    fn is_speaking(&self) -> bool;
}

// ---------------------------------------------------------------------------
// AudioSink
// ---------------------------------------------------------------------------

/// Blocking playback seam.  Takes encoded audio so tests can substitute a
/// sink without decoding real MP3 data.
pub trait AudioSink: Send + Sync {
    fn play(&self, audio: &[u8], cancel: &AtomicBool) -> Result<PlayOutcome, PlaybackError>;
}

/// Production sink: decode MP3, resample to the speaker's fixed rate, play
/// through the default output device.
pub struct SpeakerSink {
    output: SpeakerOutput,
}

impl SpeakerSink {
    pub fn open() -> Result<Self, PlaybackError> {
        Ok(Self {
            output: SpeakerOutput::open()?,
        })
    }
}

impl AudioSink for SpeakerSink {
    fn play(&self, audio: &[u8], cancel: &AtomicBool) -> Result<PlayOutcome, PlaybackError> {
        let (samples, rate) = decode_mp3(audio)?;
        self.output.play(to_playback_rate(&samples, rate), cancel)
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

/// Production [`SpeechOutput`].
///
/// Cheap to share: every field is behind an `Arc`, and `speak` spawns its
/// work onto the tokio runtime.
pub struct Synthesizer {
    backend: Arc<dyn TtsBackend>,
    sink: Arc<dyn AudioSink>,
    events: mpsc::Sender<SpeechOutputEvent>,
    config: SynthesisConfig,
    speaking: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    current_cancel: Arc<Mutex<Option<Arc<AtomicBool>>>>,
    voice: Arc<Mutex<Option<String>>>,
    ready_sent: Arc<AtomicBool>,
}

impl Synthesizer {
    pub fn new(
        backend: Arc<dyn TtsBackend>,
        sink: Arc<dyn AudioSink>,
        config: SynthesisConfig,
        events: mpsc::Sender<SpeechOutputEvent>,
    ) -> Self {
        Self {
            backend,
            sink,
            events,
            config,
            speaking: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            current_cancel: Arc::new(Mutex::new(None)),
            voice: Arc::new(Mutex::new(None)),
            ready_sent: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Resolve the voice catalog in the background, then emit the one-time
    /// `Ready` event.  Catalog failures degrade to the configured default
    /// voice; `Ready` fires either way so deferred work is never stuck.
    pub fn load_voices(&self) {
        let backend = Arc::clone(&self.backend);
        let voice = Arc::clone(&self.voice);
        let ready_sent = Arc::clone(&self.ready_sent);
        let events = self.events.clone();
        let locale = self.config.locale.clone();
        let default_voice = self.config.default_voice.clone();

        tokio::spawn(async move {
            match backend.voices().await {
                Ok(catalog) => match voice_for_locale(&catalog, &locale) {
                    Some(id) => {
                        log::info!("selected voice {id} for locale {locale}");
                        *voice.lock().unwrap() = Some(id);
                    }
                    None => {
                        log::info!(
                            "no voice matches locale {locale}; using default {default_voice}"
                        );
                    }
                },
                Err(e) => {
                    log::warn!("voice catalog unavailable ({e}); using default {default_voice}");
                }
            }

            if ready_sent
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                let _ = events.send(SpeechOutputEvent::Ready).await;
            }
        });
    }

    /// Raise the current utterance's cancel flag and install `next` in its
    /// place.  Runs synchronously inside `speak`/`cancel_all`, so by the
    /// time either returns the previous utterance can no longer emit its
    /// end event.
    fn supersede(&self, next: Option<Arc<AtomicBool>>) {
        let previous = {
            let mut guard = self.current_cancel.lock().unwrap();
            std::mem::replace(&mut *guard, next)
        };
        if let Some(flag) = previous {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

impl SpeechOutput for Synthesizer {
    fn speak(&self, text: &str) {
        let gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = Arc::new(AtomicBool::new(false));
        self.supersede(Some(Arc::clone(&cancel)));
        self.speaking.store(true, Ordering::SeqCst);

        let backend = Arc::clone(&self.backend);
        let sink = Arc::clone(&self.sink);
        let events = self.events.clone();
        let speaking = Arc::clone(&self.speaking);
        let generation = Arc::clone(&self.generation);
        let voice = Arc::clone(&self.voice);
        let default_voice = self.config.default_voice.clone();
        let text = text.to_string();

        tokio::spawn(async move {
            let voice_id = voice
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(default_voice);

            let audio = match backend.synthesize(&text, &voice_id).await {
                Ok(audio) => audio,
                Err(e) => {
                    if cancel.load(Ordering::SeqCst) {
                        return;
                    }
                    log::warn!("synthesis failed, reply will not be heard: {e}");
                    // Still close out the utterance so the state machine
                    // does not wait forever for an end event.
                    if generation.load(Ordering::SeqCst) == gen {
                        speaking.store(false, Ordering::SeqCst);
                        let _ = events
                            .send(SpeechOutputEvent::UtteranceEnded { text })
                            .await;
                    }
                    return;
                }
            };

            if cancel.load(Ordering::SeqCst) {
                return;
            }

            let play_cancel = Arc::clone(&cancel);
            let played =
                tokio::task::spawn_blocking(move || sink.play(&audio, &play_cancel)).await;

            let outcome = match played {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    log::warn!("playback failed: {e}");
                    PlayOutcome::Completed
                }
                Err(e) => {
                    log::warn!("playback task failed: {e}");
                    PlayOutcome::Completed
                }
            };

            // A cancelled or superseded utterance must never report its
            // end; last call wins.
            if outcome == PlayOutcome::Cancelled
                || cancel.load(Ordering::SeqCst)
                || generation.load(Ordering::SeqCst) != gen
            {
                return;
            }

            speaking.store(false, Ordering::SeqCst);
            let _ = events
                .send(SpeechOutputEvent::UtteranceEnded { text })
                .await;
        });
    }

    fn cancel_all(&self) {
        self.supersede(None);
        self.speaking.store(false, Ordering::SeqCst);
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

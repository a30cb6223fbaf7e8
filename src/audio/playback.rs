//! Cancellable speaker playback via `cpal`, with MP3 decoding.
//!
//! [`SpeakerOutput::play`] blocks until the samples have been played out,
//! the cancel flag is raised, or a safety timeout elapses.  Cancellation is
//! what makes the synthesizer's cancel-before-speak policy possible: a new
//! utterance raises the previous playback's flag and the old stream stops
//! within one poll interval.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use thiserror::Error;

use super::resample::resample;

/// Fixed rate the output stream is opened at.  Decoded audio is brought to
/// this rate with [`to_playback_rate`] before it reaches
/// [`SpeakerOutput::play`].
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// How often the playback loop checks for cancellation.
const POLL_INTERVAL_MS: u64 = 50;

// ---------------------------------------------------------------------------
// PlaybackError / PlayOutcome
// ---------------------------------------------------------------------------

/// Errors from the speaker-output subsystem.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no output device available")]
    NoDevice,

    #[error("no suitable output config found")]
    NoConfig,

    #[error("output stream error: {0}")]
    Stream(String),

    #[error("MP3 decode error: {0}")]
    Decode(String),
}

/// How a playback call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// All samples were played out.
    Completed,
    /// The cancel flag was raised before the samples finished.
    Cancelled,
}

// ---------------------------------------------------------------------------
// SpeakerOutput
// ---------------------------------------------------------------------------

/// Speaker wrapper using the system default output device.
pub struct SpeakerOutput {
    config: StreamConfig,
}

impl SpeakerOutput {
    /// Open the default output device at [`PLAYBACK_SAMPLE_RATE`], preferring
    /// mono and falling back to stereo.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::NoDevice`] / [`PlaybackError::NoConfig`] when
    /// no usable output path exists.
    pub fn open() -> Result<Self, PlaybackError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(PlaybackError::NoDevice)?;

        let supported = device
            .supported_output_configs()
            .map_err(|e| PlaybackError::Stream(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
            .or_else(|| {
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
                })
            })
            .ok_or(PlaybackError::NoConfig)?;

        let config = supported
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        Ok(Self { config })
    }

    /// Play mono `f32` samples at [`PLAYBACK_SAMPLE_RATE`], blocking until
    /// done or cancelled.
    ///
    /// `cancel` is polled every [`POLL_INTERVAL_MS`]; raising it stops the
    /// stream promptly and returns [`PlayOutcome::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Stream`] if the platform rejects the stream.
    pub fn play(
        &self,
        samples: Vec<f32>,
        cancel: &AtomicBool,
    ) -> Result<PlayOutcome, PlaybackError> {
        if samples.is_empty() {
            return Ok(PlayOutcome::Completed);
        }

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(PlaybackError::NoDevice)?;

        let config = self.config.clone();
        let channels = config.channels as usize;

        let total = samples.len();
        let shared = Arc::new(Mutex::new((samples, 0usize)));
        let finished = Arc::new(AtomicBool::new(false));

        let shared_cb = Arc::clone(&shared);
        let finished_cb = Arc::clone(&finished);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut guard = shared_cb.lock().unwrap();
                    let (samples, pos) = &mut *guard;

                    for frame in data.chunks_mut(channels) {
                        let sample = if *pos < samples.len() {
                            let s = samples[*pos];
                            *pos += 1;
                            s
                        } else {
                            finished_cb.store(true, Ordering::Relaxed);
                            0.0
                        };
                        for out in frame.iter_mut() {
                            *out = sample;
                        }
                    }
                },
                |err| {
                    log::error!("cpal output stream error: {err}");
                },
                None,
            )
            .map_err(|e| PlaybackError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| PlaybackError::Stream(e.to_string()))?;

        // Safety net: expected duration plus slack, in case the device
        // never reports completion.
        let duration_ms = (total as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
        let deadline =
            std::time::Instant::now() + std::time::Duration::from_millis(duration_ms + 500);

        let outcome = loop {
            if cancel.load(Ordering::Relaxed) {
                break PlayOutcome::Cancelled;
            }
            if finished.load(Ordering::Relaxed) || std::time::Instant::now() > deadline {
                break PlayOutcome::Completed;
            }
            std::thread::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS));
        };

        drop(stream);
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// MP3 decoding
// ---------------------------------------------------------------------------

/// Decode MP3 bytes to mono `f32` samples plus the stream's native sample
/// rate, taken from the first frame.  Hosted TTS backends commonly deliver
/// 44.1 kHz; playing that clocked at a different rate shifts speed and
/// pitch, so callers must pass the result through [`to_playback_rate`].
///
/// An empty stream reports [`PLAYBACK_SAMPLE_RATE`] so the resample step is
/// a no-op.
pub fn decode_mp3(mp3_data: &[u8]) -> Result<(Vec<f32>, u32), PlaybackError> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate: Option<u32> = None;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                let native = frame.sample_rate.max(1) as u32;
                let rate = *sample_rate.get_or_insert(native);

                let mono: Vec<f32> = if frame.channels == 2 {
                    frame
                        .data
                        .chunks(2)
                        .map(|chunk| {
                            let left = f32::from(chunk[0]) / 32768.0;
                            let right =
                                f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                            (left + right) / 2.0
                        })
                        .collect()
                } else {
                    frame.data.iter().map(|&s| f32::from(s) / 32768.0).collect()
                };

                if native == rate {
                    samples.extend(mono);
                } else {
                    // A rate change mid-stream is legal MP3; fold the odd
                    // frame onto the first frame's rate.
                    samples.extend(resample(&mono, native, rate));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(PlaybackError::Decode(e.to_string())),
        }
    }

    Ok((samples, sample_rate.unwrap_or(PLAYBACK_SAMPLE_RATE)))
}

/// Resample decoded audio to [`PLAYBACK_SAMPLE_RATE`], the rate the output
/// stream is opened at.  A matching source rate passes through unchanged.
pub fn to_playback_rate(samples: &[f32], source_hz: u32) -> Vec<f32> {
    resample(samples, source_hz, PLAYBACK_SAMPLE_RATE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_empty_input_yields_no_samples() {
        let (samples, rate) = decode_mp3(&[]).expect("empty input is just EOF");
        assert!(samples.is_empty());
        assert_eq!(rate, PLAYBACK_SAMPLE_RATE);
    }

    #[test]
    fn forty_four_k_audio_is_resampled_for_playback() {
        // One second at the common TTS delivery rate stays one second at
        // the stream rate, amplitude intact.
        let out = to_playback_rate(&vec![0.25_f32; 44_100], 44_100);
        assert_eq!(out.len(), PLAYBACK_SAMPLE_RATE as usize);
        for &s in &out {
            assert!((s - 0.25).abs() < 1e-5, "amplitude drift: {s}");
        }
    }

    #[test]
    fn playback_rate_audio_passes_through_unchanged() {
        let input: Vec<f32> = (0..240).map(|i| (i as f32 / 240.0).sin()).collect();
        assert_eq!(to_playback_rate(&input, PLAYBACK_SAMPLE_RATE), input);
    }

    #[test]
    fn play_outcome_is_comparable() {
        assert_ne!(PlayOutcome::Completed, PlayOutcome::Cancelled);
    }
}

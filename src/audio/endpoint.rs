//! Energy-based utterance endpointing for single-shot capture sessions.
//!
//! A push-to-talk session has no "release" edge here — the user taps once
//! and the recognizer decides when the utterance is over.  [`EndpointDetector`]
//! consumes 16 kHz mono frames and reports completion when enough speech has
//! been heard followed by enough trailing silence, or when the hard length
//! cap is reached.
//!
//! The detector also answers whether any speech was heard at all, so the
//! caller can raise the equivalent of a "no speech detected" error for an
//! all-silent session.

use crate::config::AudioConfig;

/// RMS energy of a frame of samples.
fn frame_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

// ---------------------------------------------------------------------------
// EndpointDetector
// ---------------------------------------------------------------------------

/// Accumulates one utterance and decides when it ends.
pub struct EndpointDetector {
    energy_threshold: f32,
    min_speech_samples: usize,
    silence_samples: usize,
    max_samples: usize,
    buffer: Vec<f32>,
    speech_samples: usize,
    trailing_silence: usize,
}

impl EndpointDetector {
    /// Build a detector from the audio configuration (thresholds are in
    /// seconds there; converted to sample counts at `config.sample_rate`).
    pub fn new(config: &AudioConfig) -> Self {
        let rate = config.sample_rate as f32;
        Self {
            energy_threshold: config.energy_threshold,
            min_speech_samples: (config.min_speech_secs * rate) as usize,
            silence_samples: (config.endpoint_silence_secs * rate) as usize,
            max_samples: (config.max_utterance_secs * rate) as usize,
            buffer: Vec::new(),
            speech_samples: 0,
            trailing_silence: 0,
        }
    }

    /// Feed one frame of 16 kHz mono samples.
    ///
    /// Returns `true` once the utterance is complete: either enough speech
    /// followed by [`endpoint_silence_secs`](crate::config::AudioConfig)
    /// of quiet, or the hard length cap.
    pub fn push(&mut self, samples: &[f32]) -> bool {
        self.buffer.extend_from_slice(samples);

        if frame_energy(samples) > self.energy_threshold {
            self.speech_samples += samples.len();
            self.trailing_silence = 0;
        } else {
            self.trailing_silence += samples.len();
        }

        self.is_complete()
    }

    /// `true` when the accumulated audio forms a finished utterance.
    pub fn is_complete(&self) -> bool {
        if self.buffer.len() >= self.max_samples {
            return true;
        }
        self.speech_samples >= self.min_speech_samples
            && self.trailing_silence >= self.silence_samples
    }

    /// Whether enough above-threshold audio accumulated to count as speech:
    /// at least `min_speech_secs` worth, not just a single loud frame.
    pub fn heard_speech(&self) -> bool {
        self.speech_samples >= self.min_speech_samples
    }

    /// Take the accumulated utterance, leaving the detector empty.
    pub fn take_audio(&mut self) -> Vec<f32> {
        self.speech_samples = 0;
        self.trailing_silence = 0;
        std::mem::take(&mut self.buffer)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioConfig;

    fn config() -> AudioConfig {
        AudioConfig {
            sample_rate: 16_000,
            energy_threshold: 0.03,
            min_speech_secs: 0.3,   // 4 800 samples
            endpoint_silence_secs: 0.5, // 8 000 samples
            max_utterance_secs: 2.0,    // 32 000 samples
        }
    }

    fn loud(n: usize) -> Vec<f32> {
        vec![0.5_f32; n]
    }

    fn quiet(n: usize) -> Vec<f32> {
        vec![0.0_f32; n]
    }

    #[test]
    fn energy_of_silence_is_near_zero() {
        assert!(frame_energy(&quiet(100)) < 0.001);
        assert!(frame_energy(&loud(100)) > 0.4);
        assert_eq!(frame_energy(&[]), 0.0);
    }

    #[test]
    fn speech_then_silence_completes() {
        let mut det = EndpointDetector::new(&config());
        assert!(!det.push(&loud(8_000))); // 0.5 s of speech
        assert!(det.push(&quiet(8_000))); // 0.5 s of silence → done
        assert!(det.heard_speech());
        assert_eq!(det.take_audio().len(), 16_000);
    }

    #[test]
    fn silence_alone_does_not_complete_early() {
        let mut det = EndpointDetector::new(&config());
        assert!(!det.push(&quiet(8_000)));
        assert!(!det.push(&quiet(8_000)));
        assert!(!det.heard_speech());
    }

    #[test]
    fn hard_cap_completes_even_mid_speech() {
        let mut det = EndpointDetector::new(&config());
        assert!(det.push(&loud(32_000))); // 2 s, the configured maximum
    }

    #[test]
    fn short_blip_is_not_speech() {
        let mut det = EndpointDetector::new(&config());
        det.push(&loud(1_000)); // 62 ms — below min_speech_secs
        det.push(&quiet(8_000));
        assert!(!det.heard_speech());
    }

    #[test]
    fn take_audio_resets_buffer() {
        let mut det = EndpointDetector::new(&config());
        det.push(&loud(8_000));
        det.push(&quiet(8_000));
        assert!(!det.take_audio().is_empty());
        assert!(det.take_audio().is_empty());
    }
}

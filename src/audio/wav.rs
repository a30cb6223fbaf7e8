//! WAV encoding for API upload.
//!
//! The hosted transcription endpoint takes a WAV payload; we ship the
//! captured utterance as 16-bit mono PCM via `hound`.

use std::io::Cursor;

use thiserror::Error;

/// Errors from WAV encoding.
#[derive(Debug, Error)]
pub enum WavError {
    #[error("failed to encode WAV: {0}")]
    Encode(String),
}

/// Encode mono `f32` samples (range `[-1.0, 1.0]`) as a 16-bit PCM WAV file.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, WavError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| WavError::Encode(e.to_string()))?;
        for &s in samples {
            let clamped = s.clamp(-1.0, 1.0);
            writer
                .write_sample((clamped * i16::MAX as f32) as i16)
                .map_err(|e| WavError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| WavError::Encode(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

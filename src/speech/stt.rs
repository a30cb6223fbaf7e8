//! Hosted speech-to-text backend.
//!
//! [`SttBackend`] is the seam the recognizer talks through; [`WhisperApi`]
//! is the production implementation, posting WAV audio to a Whisper-style
//! `/v1/audio/transcriptions` endpoint.  All connection details come from
//! [`RecognizerConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::RecognizerConfig;

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

/// Errors from the transcription backend.
#[derive(Debug, Error)]
pub enum SttError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("transcription request timed out")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("transcription API error: {0}")]
    Api(String),

    /// The response body could not be parsed.
    #[error("failed to parse transcription response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SttError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SttError::Timeout
        } else {
            SttError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SttBackend trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe transcription interface.
///
/// `wav` is a complete WAV file (16 kHz mono 16-bit PCM as produced by
/// [`crate::audio::encode_wav`]).
#[async_trait]
pub trait SttBackend: Send + Sync {
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String, SttError>;
}

// ---------------------------------------------------------------------------
// WhisperApi
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Production backend for any Whisper-compatible transcriptions endpoint.
pub struct WhisperApi {
    client: reqwest::Client,
    config: RecognizerConfig,
}

impl WhisperApi {
    /// Build a `WhisperApi` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.
    pub fn from_config(config: &RecognizerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// ISO-639-1 primary subtag of the configured language tag
    /// (`"en-US"` → `"en"`), which is what the Whisper API expects.
    fn language_code(&self) -> String {
        self.config
            .language
            .split('-')
            .next()
            .unwrap_or(&self.config.language)
            .to_lowercase()
    }
}

#[async_trait]
impl SttBackend for WhisperApi {
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String, SttError> {
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav)
                    .file_name("utterance.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| SttError::Request(e.to_string()))?,
            )
            .text("model", self.config.model.clone())
            .text("language", self.language_code());

        let url = format!("{}/v1/audio/transcriptions", self.config.base_url);

        let mut req = self.client.post(&url).multipart(form);
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SttError::Api(format!("{status}: {body}")));
        }

        let result: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| SttError::Parse(e.to_string()))?;

        log::debug!("transcription complete ({} chars)", result.text.len());
        Ok(result.text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Hosted text-to-speech backend.
//!
//! [`TtsBackend`] is the seam the synthesizer talks through; [`HttpTts`] is
//! the production implementation for an ElevenLabs-style HTTP API: a voice
//! catalog at `/v1/voices` and per-utterance synthesis at
//! `/v1/text-to-speech/{voice_id}` returning MP3 audio.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::SynthesisConfig;

// ---------------------------------------------------------------------------
// TtsError
// ---------------------------------------------------------------------------

/// Errors from the synthesis backend.
#[derive(Debug, Error)]
pub enum TtsError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("synthesis request timed out")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("synthesis API error: {0}")]
    Api(String),

    /// The response body could not be parsed.
    #[error("failed to parse synthesis response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TtsError::Timeout
        } else {
            TtsError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Voice catalog
// ---------------------------------------------------------------------------

/// One entry of the backend's voice catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceInfo {
    pub voice_id: String,
    pub name: String,
    /// Free-form descriptive labels (accent, language, gender, ...).
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<VoiceInfo>,
}

/// Pick a voice whose labels mention the configured locale.
///
/// Matches the full tag first (`"hi-IN"`), then the primary subtag
/// (`"hi"`), comparing case-insensitively against every label value.
/// Returns `None` when the catalog has no match; the caller falls back to
/// the configured default voice.
pub fn voice_for_locale(voices: &[VoiceInfo], locale: &str) -> Option<String> {
    let tag = locale.to_lowercase();
    let primary = tag.split('-').next().unwrap_or(&tag).to_string();

    let matches = |v: &VoiceInfo, needle: &str| {
        v.labels
            .values()
            .any(|label| label.to_lowercase().contains(needle))
    };

    voices
        .iter()
        .find(|v| matches(v, &tag))
        .or_else(|| voices.iter().find(|v| matches(v, &primary)))
        .map(|v| v.voice_id.clone())
}

// ---------------------------------------------------------------------------
// TtsBackend trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe synthesis interface.
///
/// `synthesize` returns encoded audio (MP3 for the production backend);
/// decoding is the audio sink's job.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Fetch the available voice catalog.
    async fn voices(&self) -> Result<Vec<VoiceInfo>, TtsError>;

    /// Synthesize `text` with the given voice.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, TtsError>;
}

// ---------------------------------------------------------------------------
// HttpTts
// ---------------------------------------------------------------------------

/// Production backend for an ElevenLabs-compatible synthesis endpoint.
pub struct HttpTts {
    client: reqwest::Client,
    config: SynthesisConfig,
}

impl HttpTts {
    /// Build an `HttpTts` from application config.
    pub fn from_config(config: &SynthesisConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.config.api_key.as_deref().unwrap_or("");
        if key.is_empty() {
            req
        } else {
            req.header("xi-api-key", key)
        }
    }
}

#[async_trait]
impl TtsBackend for HttpTts {
    async fn voices(&self) -> Result<Vec<VoiceInfo>, TtsError> {
        let url = format!("{}/v1/voices", self.config.base_url);
        let response = self.with_auth(self.client.get(&url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Api(format!("{status}: {body}")));
        }

        let result: VoicesResponse = response
            .json()
            .await
            .map_err(|e| TtsError::Parse(e.to_string()))?;

        log::debug!("voice catalog loaded ({} voices)", result.voices.len());
        Ok(result.voices)
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, TtsError> {
        let url = format!("{}/v1/text-to-speech/{voice_id}", self.config.base_url);
        let body = serde_json::json!({
            "text": text,
            "model_id": self.config.model,
        });

        let response = self
            .with_auth(self.client.post(&url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Api(format!("{status}: {body}")));
        }

        let audio = response.bytes().await?;
        log::debug!("synthesized {} bytes of audio", audio.len());
        Ok(audio.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// RecognizerConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-recognition subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Base URL of the hosted transcription API.
    pub base_url: String,
    /// API key — `None` for unauthenticated local gateways.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"whisper-1"`).
    pub model: String,
    /// Recognition language tag (BCP-47, e.g. `"en-US"`). Fixed per session.
    pub language: String,
    /// Maximum seconds to wait for a transcription response.
    pub timeout_secs: u64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "whisper-1".into(),
            language: "en-US".into(),
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// SynthesisConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-synthesis subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Base URL of the hosted synthesis API.
    pub base_url: String,
    /// API key — `None` for unauthenticated local gateways.
    pub api_key: Option<String>,
    /// Synthesis model identifier.
    pub model: String,
    /// Preferred voice locale (BCP-47, e.g. `"hi-IN"`).  The synthesizer
    /// picks the first catalog voice matching this tag; if the catalog has
    /// not loaded yet the selection is deferred, never failed.
    pub locale: String,
    /// Fallback voice id used until (or unless) a locale match is found.
    pub default_voice: String,
    /// Maximum seconds to wait for a synthesis response.
    pub timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".into(),
            api_key: None,
            model: "eleven_multilingual_v2".into(),
            locale: "hi-IN".into(),
            default_voice: "default".into(),
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// ResolverConfig
// ---------------------------------------------------------------------------

/// Settings for the intent-resolution step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Base URL of an OpenAI-compatible `/v1/chat/completions` endpoint.
    pub base_url: String,
    /// API key — `None` for local providers (Ollama / LM Studio).
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"gpt-4o-mini"`).
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).  Lower = more deterministic.
    pub temperature: f32,
    /// Maximum seconds to wait for a resolver response before timing out.
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "qwen2.5:3b".into(),
            temperature: 0.2,
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for microphone capture and utterance endpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Target sample rate in Hz sent to the transcription API (16 000).
    pub sample_rate: u32,
    /// RMS amplitude above which a frame counts as speech.
    pub energy_threshold: f32,
    /// Minimum seconds of speech before an utterance is accepted.
    pub min_speech_secs: f32,
    /// Seconds of trailing silence that end the utterance.
    pub endpoint_silence_secs: f32,
    /// Hard cap on session length; capture stops automatically.
    pub max_utterance_secs: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            energy_threshold: 0.03,
            min_speech_secs: 0.3,
            endpoint_silence_secs: 0.8,
            max_utterance_secs: 15.0,
        }
    }
}

// ---------------------------------------------------------------------------
// HotkeyConfig
// ---------------------------------------------------------------------------

/// Global hotkey bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// Push-to-talk key name (e.g. `"F9"`).  One tap starts a single-shot
    /// recognition session; the session ends itself on silence.
    pub talk_key: String,
    /// Key that logs the user out and clears the local session.
    pub logout_key: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            talk_key: "F9".into(),
            logout_key: "F10".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Account backend the client signs out against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the account/auth server.
    pub base_url: String,
    /// Maximum seconds to wait for auth calls.
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_assistant::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Speech-recognition settings.
    pub recognizer: RecognizerConfig,
    /// Speech-synthesis settings.
    pub synthesis: SynthesisConfig,
    /// Intent-resolution settings.
    pub resolver: ResolverConfig,
    /// Microphone capture / endpointing settings.
    pub audio: AudioConfig,
    /// Global hotkey bindings.
    pub hotkey: HotkeyConfig,
    /// Account backend settings.
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

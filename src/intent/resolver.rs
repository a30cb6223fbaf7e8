//! Core `IntentResolver` trait and `ApiResolver` implementation.
//!
//! `ApiResolver` calls any OpenAI-compatible `/v1/chat/completions` endpoint
//! — Ollama (OpenAI mode), OpenAI, Groq, LM Studio, vLLM, etc.
//! All connection details come from [`ResolverConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ResolverConfig;
use crate::intent::prompt::PromptBuilder;
use crate::intent::Command;

// ---------------------------------------------------------------------------
// ResolverError
// ---------------------------------------------------------------------------

/// Errors that can occur during intent resolution.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("resolver request timed out")]
    Timeout,

    /// The response could not be parsed into a [`Command`].
    #[error("failed to parse resolver response: {0}")]
    Parse(String),

    /// The model returned a response with no usable content.
    #[error("resolver returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for ResolverError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ResolverError::Timeout
        } else {
            ResolverError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// IntentResolver trait
// ---------------------------------------------------------------------------

/// Async trait for transcript-to-command resolution.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn IntentResolver>`).
#[async_trait]
pub trait IntentResolver: Send + Sync {
    async fn resolve(&self, transcript: &str) -> Result<Command, ResolverError>;
}

// ---------------------------------------------------------------------------
// ApiResolver
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// Works with: Ollama (OpenAI mode), OpenAI, Groq, Together.ai, LM Studio,
/// vLLM — any provider that speaks the OpenAI chat-completions wire format.
pub struct ApiResolver {
    client: reqwest::Client,
    config: ResolverConfig,
    prompt_builder: PromptBuilder,
}

impl ApiResolver {
    /// Build an `ApiResolver` from application config plus the names the
    /// prompt needs.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.
    pub fn from_config(config: &ResolverConfig, assistant_name: &str, user_name: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
            prompt_builder: PromptBuilder::new(assistant_name, user_name),
        }
    }
}

#[async_trait]
impl IntentResolver for ApiResolver {
    /// Send the transcript to the configured endpoint and parse the JSON
    /// command it returns.
    ///
    /// The `Authorization: Bearer …` header is attached only when
    /// `config.api_key` is a non-empty string, so local providers that need
    /// no authentication keep working.
    async fn resolve(&self, transcript: &str) -> Result<Command, ResolverError> {
        let (system_msg, user_msg) = self.prompt_builder.build_chat(transcript);

        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "system", "content": system_msg },
                { "role": "user",   "content": user_msg   }
            ],
            "stream":      false,
            "temperature": self.config.temperature,
            "max_tokens":  256
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ResolverError::Parse(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(ResolverError::EmptyResponse)?
            .trim();

        if content.is_empty() {
            return Err(ResolverError::EmptyResponse);
        }

        parse_command_json(content)
    }
}

/// Parse the model's reply into a [`Command`], tolerating markdown code
/// fences and prose around the JSON object.
fn parse_command_json(content: &str) -> Result<Command, ResolverError> {
    // Cut out the outermost {...} in case the model wrapped its answer.
    let start = content.find('{');
    let end = content.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &content[s..=e],
        _ => return Err(ResolverError::Parse("no JSON object in reply".into())),
    };

    serde_json::from_str(json).map_err(|e| ResolverError::Parse(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::CommandKind;

    fn make_config(api_key: Option<&str>) -> ResolverConfig {
        ResolverConfig {
            api_key: api_key.map(|s| s.to_string()),
            ..ResolverConfig::default()
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _resolver = ApiResolver::from_config(&make_config(None), "Nova", "Asha");
        let _resolver = ApiResolver::from_config(&make_config(Some("")), "Nova", "Asha");
        let _resolver = ApiResolver::from_config(&make_config(Some("sk-test-1234")), "Nova", "Asha");
    }

    #[test]
    fn parse_accepts_bare_json() {
        let cmd = parse_command_json(
            r#"{"type": "weather-show", "userInput": "", "response": "Here is the weather."}"#,
        )
        .unwrap();
        assert_eq!(cmd.kind, CommandKind::WeatherShow);
    }

    #[test]
    fn parse_strips_code_fences_and_prose() {
        let reply = "Sure! Here you go:\n```json\n{\"type\": \"youtube-search\", \"userInput\": \"cat videos\", \"response\": \"Searching YouTube.\"}\n```";
        let cmd = parse_command_json(reply).unwrap();
        assert_eq!(cmd.kind, CommandKind::YoutubeSearch);
        assert_eq!(cmd.user_input, "cat videos");
    }

    #[test]
    fn parse_rejects_reply_without_json() {
        assert!(matches!(
            parse_command_json("I cannot help with that."),
            Err(ResolverError::Parse(_))
        ));
    }

    /// Verify that `ApiResolver` is object-safe (usable as `dyn IntentResolver`).
    #[test]
    fn resolver_is_object_safe() {
        let resolver: Box<dyn IntentResolver> =
            Box::new(ApiResolver::from_config(&make_config(None), "Nova", "Asha"));
        drop(resolver);
    }
}

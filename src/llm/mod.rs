//! Structured-output generation and image captioning services.
//!
//! The language-model backend is a polymorphic capability chosen once, at
//! construction time, from an explicit [`LlmConfig`] — there is no ambient
//! process state and no provider branching at call sites:
//!
//! - [`ollama::OllamaClient`]: local Ollama chat API in JSON mode
//! - [`openai::OpenAiClient`]: hosted OpenAI-compatible chat-completions API
//!
//! Both implement [`Generate`] and are dispatched through [`Generator`].
//! Model replies pass through [`repair`] before parsing, so near-JSON output
//! (code fences, leading prose) is tolerated; only replies with no locatable
//! JSON object fail, with [`ScrapeError::MalformedOutput`].

pub mod ollama;
pub mod openai;
pub mod repair;
pub mod vision;

use crate::error::Result;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

pub use vision::Captioner;

/// Default endpoint of a local Ollama instance.
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// Which language-model backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    /// Local Ollama instance.
    Ollama,
    /// Hosted OpenAI-compatible inference endpoint.
    OpenAiCompatible,
}

/// Explicit model configuration, constructed from the CLI and passed into
/// the generator and captioner constructors.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Backend selection.
    pub provider: Provider,
    /// Model name (Ollama tag or hosted repo id).
    pub model: String,
    /// Base endpoint of the selected backend.
    pub endpoint: String,
    /// Bearer token for hosted backends.
    pub api_key: Option<String>,
    /// Vision model tag for captioning; `None` disables captioning.
    pub vision_model: Option<String>,
}

impl LlmConfig {
    /// Endpoint the captioning service should talk to. Captioning always
    /// runs against a local Ollama instance; when the text backend is also
    /// Ollama the two share an endpoint.
    pub fn vision_endpoint(&self) -> String {
        match self.provider {
            Provider::Ollama => self.endpoint.clone(),
            Provider::OpenAiCompatible => DEFAULT_OLLAMA_ENDPOINT.to_string(),
        }
    }
}

/// Capability of turning a prompt into raw model text.
pub trait Generate {
    /// Send `prompt` under `system` and return the model's raw reply.
    async fn generate_raw(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String>;
}

/// The configured structured generator, dispatching to one concrete backend.
#[derive(Debug)]
pub enum Generator {
    Ollama(ollama::OllamaClient),
    OpenAiCompatible(openai::OpenAiClient),
}

impl Generator {
    /// Select and build the backend named by `config`.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Ok(match config.provider {
            Provider::Ollama => {
                Self::Ollama(ollama::OllamaClient::new(&config.endpoint, &config.model)?)
            }
            Provider::OpenAiCompatible => Self::OpenAiCompatible(openai::OpenAiClient::new(
                &config.endpoint,
                &config.model,
                config.api_key.clone(),
            )?),
        })
    }

    /// Generate a JSON object from `prompt`, repairing near-JSON replies.
    ///
    /// The system message instructs the model to emit only compact JSON,
    /// `null` for unknown fields, within the token budget, and includes the
    /// schema hint when given. The repaired reply is guaranteed to be a JSON
    /// object; anything else is [`ScrapeError::MalformedOutput`].
    #[instrument(level = "info", skip_all)]
    pub async fn generate_json(
        &self,
        prompt: &str,
        schema_hint: Option<&str>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Map<String, Value>> {
        let system = system_message(schema_hint, max_tokens);

        let raw = match self {
            Self::Ollama(client) => {
                client
                    .generate_raw(&system, prompt, max_tokens, temperature)
                    .await?
            }
            Self::OpenAiCompatible(client) => {
                client
                    .generate_raw(&system, prompt, max_tokens, temperature)
                    .await?
            }
        };

        debug!(reply_bytes = raw.len(), "Model replied");
        repair::coerce_json(&raw)
    }
}

/// Build the strict system message shared by both backends.
fn system_message(schema_hint: Option<&str>, max_tokens: u32) -> String {
    let mut system = format!(
        "Produce ONLY valid compact JSON. No explanations, no markdown, no extra text. \
         If a field is unknown, output null. Respond in <= {max_tokens} tokens. "
    );
    if let Some(hint) = schema_hint {
        system.push_str(&format!("Schema: {hint}"));
    }
    system
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message_embeds_budget_and_schema() {
        let system = system_message(Some(r#"{"type":"object"}"#), 256);
        assert!(system.contains("<= 256 tokens"));
        assert!(system.contains(r#"Schema: {"type":"object"}"#));
        assert!(system.contains("ONLY valid compact JSON"));
    }

    #[test]
    fn test_system_message_without_schema() {
        let system = system_message(None, 64);
        assert!(!system.contains("Schema:"));
        assert!(system.contains("<= 64 tokens"));
    }

    #[test]
    fn test_vision_endpoint_follows_provider() {
        let mut config = LlmConfig {
            provider: Provider::Ollama,
            model: "llama3.1:8b".to_string(),
            endpoint: "http://box:11434".to_string(),
            api_key: None,
            vision_model: Some("llava:7b".to_string()),
        };
        assert_eq!(config.vision_endpoint(), "http://box:11434");

        config.provider = Provider::OpenAiCompatible;
        config.endpoint = "https://router.example".to_string();
        assert_eq!(config.vision_endpoint(), DEFAULT_OLLAMA_ENDPOINT);
    }
}

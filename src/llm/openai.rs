//! Hosted OpenAI-compatible chat-completions backend.
//!
//! Covers inference routers that speak the `/v1/chat/completions` wire shape
//! with bearer-token auth (the Hugging Face router and friends). Selected at
//! construction time via [`LlmConfig`](crate::llm::LlmConfig).

use crate::error::Result;
use crate::llm::Generate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for an OpenAI-compatible hosted endpoint.
pub struct OpenAiClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Build a client for `endpoint` (base URL, without the
    /// `/v1/chat/completions` suffix) and `model` (a hosted repo id).
    pub fn new(endpoint: &str, model: &str, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            client,
        })
    }
}

impl Generate for OpenAiClient {
    #[instrument(level = "debug", skip_all, fields(model = %self.model))]
    async fn generate_raw(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            temperature,
        };

        let mut request = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await?.error_for_status()?;
        let completion: CompletionResponse = resp.json().await?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let client =
            OpenAiClient::new("https://router.example", "org/model", Some("secret".to_string()))
                .unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#;
        let resp: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            resp.choices[0].message.content.as_deref(),
            Some("{\"a\":1}")
        );
    }

    #[test]
    fn test_empty_choices_yield_empty_reply() {
        let resp: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let content = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        assert_eq!(content, "");
    }
}

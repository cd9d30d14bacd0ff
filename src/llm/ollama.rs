//! Local Ollama chat backend.
//!
//! Talks to an Ollama instance's `/api/chat` endpoint in JSON mode with a
//! pinned seed and context window, so structured-output runs are as
//! deterministic as the model allows.

use crate::error::Result;
use crate::llm::Generate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Generous timeout: local models may need to load weights on first call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Fixed context window for extraction prompts.
const NUM_CTX: u32 = 2048;

/// Pinned sampling seed.
const SEED: u32 = 42;

/// Client for a local Ollama instance.
#[derive(Debug)]
pub struct OllamaClient {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    format: &'a str,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
    num_ctx: u32,
    seed: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaClient {
    /// Build a client for `endpoint` (e.g. `http://localhost:11434`) and
    /// `model` (an Ollama tag such as `llama3.1:8b-instruct-q4_0`).
    pub fn new(endpoint: &str, model: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }
}

impl Generate for OllamaClient {
    #[instrument(level = "debug", skip_all, fields(model = %self.model))]
    async fn generate_raw(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
            format: "json",
            options: ChatOptions {
                temperature,
                num_predict: max_tokens,
                num_ctx: NUM_CTX,
                seed: SEED,
            },
        };

        let resp = self
            .client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let chat: ChatResponse = resp.json().await?;
        Ok(chat.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_normalizes_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", "llama3.1:8b").unwrap();
        assert_eq!(client.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "deepseek-r1:8b",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            stream: false,
            format: "json",
            options: ChatOptions {
                temperature: 0.1,
                num_predict: 256,
                num_ctx: NUM_CTX,
                seed: SEED,
            },
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "deepseek-r1:8b");
        assert_eq!(json["format"], "json");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 256);
        assert_eq!(json["options"]["num_ctx"], 2048);
        assert_eq!(json["options"]["seed"], 42);
    }
}

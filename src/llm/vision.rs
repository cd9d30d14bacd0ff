//! Image captioning via a local multimodal model.
//!
//! [`Captioner::caption`] takes local image paths and returns one nullable
//! caption per path, in the same order. When no vision model is configured
//! the service degrades to an all-`None` list of matching length — a normal
//! mode, never an error. Individual caption failures (unreadable file,
//! backend error, empty reply) likewise yield `None` for that slot only.

use crate::llm::LlmConfig;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Token budget for a single caption.
const CAPTION_TOKENS: u32 = 64;

/// Sampling temperature for captions.
const CAPTION_TEMPERATURE: f32 = 0.1;

/// Pinned sampling seed.
const SEED: u32 = 42;

/// Captioning service backed by an Ollama multimodal model.
#[derive(Debug)]
pub struct Captioner {
    endpoint: String,
    model: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct VisionRequest<'a> {
    model: &'a str,
    messages: Vec<VisionMessage<'a>>,
    stream: bool,
    options: VisionOptions,
}

#[derive(Serialize)]
struct VisionMessage<'a> {
    role: &'a str,
    content: &'a str,
    images: Vec<String>,
}

#[derive(Serialize)]
struct VisionOptions {
    temperature: f32,
    num_predict: u32,
    seed: u32,
}

#[derive(Deserialize)]
struct VisionResponse {
    message: VisionResponseMessage,
}

#[derive(Deserialize)]
struct VisionResponseMessage {
    content: String,
}

impl Captioner {
    /// Build the captioner from the shared model configuration. A missing
    /// `vision_model` produces a permanently degraded (all-`None`) service.
    pub fn from_config(config: &LlmConfig) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint: config.vision_endpoint().trim_end_matches('/').to_string(),
            model: config.vision_model.clone(),
            client,
        })
    }

    /// Caption each local image, returning a same-length, same-order list.
    #[instrument(level = "info", skip_all, fields(count = paths.len()))]
    pub async fn caption(&self, paths: &[String], hint: Option<&str>) -> Vec<Option<String>> {
        let Some(model) = &self.model else {
            debug!("No vision model configured; skipping captions");
            return vec![None; paths.len()];
        };

        let mut prompt = "Caption this image in <= 15 words. Be factual and concise.".to_string();
        if let Some(hint) = hint {
            prompt.push_str(&format!(" Context: {hint}"));
        }

        let mut captions = Vec::with_capacity(paths.len());
        for path in paths {
            captions.push(self.caption_one(model, path, &prompt).await);
        }
        captions
    }

    async fn caption_one(&self, model: &str, path: &str, prompt: &str) -> Option<String> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%path, error = %e, "Could not read image for captioning");
                return None;
            }
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

        let body = VisionRequest {
            model,
            messages: vec![VisionMessage {
                role: "user",
                content: prompt,
                images: vec![encoded],
            }],
            stream: false,
            options: VisionOptions {
                temperature: CAPTION_TEMPERATURE,
                num_predict: CAPTION_TOKENS,
                seed: SEED,
            },
        };

        let resp = self
            .client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        let resp = match resp {
            Ok(resp) => resp,
            Err(e) => {
                warn!(%path, error = %e, "Caption request failed");
                return None;
            }
        };

        match resp.json::<VisionResponse>().await {
            Ok(vision) => {
                let caption = vision.message.content.trim().to_string();
                if caption.is_empty() { None } else { Some(caption) }
            }
            Err(e) => {
                warn!(%path, error = %e, "Caption response unparsable");
                None
            }
        }
    }
}

//! Command-line interface definitions.
//!
//! All model options can be provided via flags or environment variables,
//! mirroring the `.env` surface the tool is usually configured with.

use crate::llm::{DEFAULT_OLLAMA_ENDPOINT, LlmConfig, Provider};
use clap::Parser;

/// Command-line arguments for the extraction pipeline.
///
/// # Examples
///
/// ```sh
/// # Extract two pages with a local model
/// scrape_llm https://example.com https://www.bbc.com/news
///
/// # Hosted backend with captioning enabled
/// scrape_llm --provider open-ai-compatible \
///     --endpoint https://router.huggingface.co \
///     --model meta-llama/Llama-3.1-8B-Instruct \
///     --vision-model llava:7b \
///     https://example.com
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Page URLs to extract
    #[arg(default_values_t = vec!["https://example.com/".to_string()])]
    pub urls: Vec<String>,

    /// Data root; downloaded images go under `<data-dir>/images`
    #[arg(short, long, default_value = "data")]
    pub data_dir: String,

    /// Optional path for the full result set as a JSON document
    #[arg(short, long)]
    pub output: Option<String>,

    /// Language-model backend
    #[arg(long, env = "LLM_PROVIDER", value_enum, default_value_t = Provider::Ollama)]
    pub provider: Provider,

    /// Model name (Ollama tag or hosted repo id)
    #[arg(long, env = "LLM_MODEL", default_value = "deepseek-r1:8b")]
    pub model: String,

    /// Backend base endpoint
    #[arg(long, env = "LLM_ENDPOINT", default_value = DEFAULT_OLLAMA_ENDPOINT)]
    pub endpoint: String,

    /// Bearer token for hosted backends
    #[arg(long, env = "HF_TOKEN")]
    pub api_key: Option<String>,

    /// Vision model tag for image captioning (unset = captions skipped)
    #[arg(long, env = "LLM_VISION_MODEL")]
    pub vision_model: Option<String>,
}

impl Cli {
    /// Build the explicit model configuration handed to the generator and
    /// captioner constructors.
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            provider: self.provider,
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            vision_model: self.vision_model.clone(),
        }
    }
}

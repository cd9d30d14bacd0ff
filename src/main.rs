//! # scrape_llm
//!
//! A concurrent web-page extraction pipeline that fetches pages, pulls out
//! structured article data (title, author, summary, publish date) and a
//! small set of representative images, using rule-based text extraction
//! plus a language-model call that converts raw text into a validated
//! structured record.
//!
//! ## Features
//!
//! - Bounded-concurrency batch fetching (5 pages in flight)
//! - Per-page candidate-image selection, capped download, JPEG re-encode
//! - Optional image captioning via a local multimodal model
//! - Structured output with JSON repair and a deterministic fallback record
//! - Retry with exponential backoff on every fetch
//!
//! ## Usage
//!
//! ```sh
//! scrape_llm -o results.json https://example.com https://www.bbc.com/news
//! ```
//!
//! ## Architecture
//!
//! For each URL: Fetch → Extract text → Pick images → Download images →
//! Caption → Generate structured record → Validate (or fall back). The
//! batch runner fans this out across URLs; one page-fetch failure, after
//! retries, fails the batch as a whole and nothing partial is rendered.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod error;
mod extract;
mod fetch;
mod images;
mod llm;
mod models;
mod output;
mod pipeline;
mod utils;

use cli::Cli;
use pipeline::Pipeline;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.urls, ?args.data_dir, ?args.provider, "Parsed CLI arguments");

    // Early check: the data area must be writable before any work starts
    if let Err(e) = ensure_writable_dir(&args.data_dir).await {
        error!(
            path = %args.data_dir,
            error = %e,
            "Data directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let config = args.llm_config();
    info!(
        provider = ?config.provider,
        model = %config.model,
        vision = config.vision_model.is_some(),
        urls = args.urls.len(),
        "Starting extraction batch"
    );

    let pipeline = Pipeline::new(Path::new(&args.data_dir), &config).await?;

    // All-or-nothing: one fatal page fetch fails the batch, no partial output
    let articles = match pipeline.run_batch(&args.urls).await {
        Ok(articles) => articles,
        Err(e) => {
            error!(error = %e, "Batch failed");
            return Err(e.into());
        }
    };

    // One JSON line per article on stdout
    for article in &articles {
        println!("{}", serde_json::to_string(article)?);
    }

    if let Some(output) = &args.output {
        output::write_results(&articles, Path::new(output)).await?;
    }

    let elapsed = start_time.elapsed();
    info!(
        articles = articles.len(),
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

//! Error taxonomy for the extraction pipeline.
//!
//! Only [`ScrapeError::Connect`] on a *page* fetch is allowed to escape a
//! single page-processing run; every other failure category is absorbed into
//! a degraded-but-valid [`Article`](crate::models::Article). Image download
//! failures never surface here at all — they collapse to `None` inside the
//! image store.

use thiserror::Error;

/// Errors that can occur while fetching pages and generating structured output.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Transport, timeout, or HTTP-status failure after retries were exhausted.
    #[error("connect_error: {url}: {source}")]
    Connect {
        /// The URL whose fetch failed.
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The model's reply could not be coerced into a JSON object.
    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    /// HTTP plumbing failure inside an LLM backend call.
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failure outside the model-output repair path.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure while preparing or writing to the data area.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode or encode failure inside the store.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ScrapeError>;

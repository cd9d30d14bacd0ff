//! Data models for extracted articles and their images.
//!
//! This module defines the two records the pipeline produces:
//! - [`Article`]: one page's extraction result
//! - [`ImageInfo`]: one selected, downloaded image embedded in an `Article`
//!
//! An `Article` is always fully constructed, even on downstream failure:
//! fields the model could not populate are `null` in the serialized output,
//! never absent. When the model's structured output cannot be validated,
//! [`Article::fallback`] builds a minimal record from locally known state.

use serde::{Deserialize, Serialize};

/// Schema hint handed to the structured generator, naming the fields the
/// model must populate. Kept as a literal so the prompt stays stable across
/// runs.
pub const ARTICLE_SCHEMA_HINT: &str = r#"{"type":"object","properties":{"url":{"type":"string"},"title":{"type":["string","null"]},"author":{"type":["string","null"]},"summary":{"type":["string","null"]},"published":{"type":["string","null"]}},"required":["url"]}"#;

/// One page's extraction result.
///
/// `url` is the canonical request URL and is always present; every other
/// textual field is best-effort and may be `null`. `images` holds at most
/// three entries, in selection order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Article {
    /// The page's canonical request URL.
    pub url: String,
    /// Page title, from the model or the rule-based extractor.
    pub title: Option<String>,
    /// Author name, if the model could find one.
    pub author: Option<String>,
    /// Concise summary, three sentences or fewer by prompt construction.
    pub summary: Option<String>,
    /// Publication date/time as an ISO-8601 string, if present on the page.
    pub published: Option<String>,
    /// Selected images, in selection order. 0..=3 entries.
    #[serde(default)]
    pub images: Vec<ImageInfo>,
}

impl Article {
    /// Build the minimal, always-valid article used when the model's
    /// structured output fails validation.
    ///
    /// Only locally known fields are populated; every model-derived field
    /// is `None`. Deterministic given the same local state.
    pub fn fallback(url: &str, title: Option<String>, images: Vec<ImageInfo>) -> Self {
        Self {
            url: url.to_string(),
            title,
            author: None,
            summary: None,
            published: None,
            images,
        }
    }
}

/// One selected, downloaded image belonging to a single [`Article`].
///
/// Created by the picker (url/alt only), then enriched with `local_path` by
/// the store and `caption` by the vision service. Entries whose download
/// failed are dropped before they ever reach an `Article`, so within an
/// article `local_path` is always populated.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageInfo {
    /// The original remote URL, unique within an article's image list.
    pub url: String,
    /// Alt text from the source markup, if any.
    pub alt: Option<String>,
    /// Model-generated caption, or `null` when captioning is unavailable.
    pub caption: Option<String>,
    /// Path of the re-encoded local copy; present iff the download succeeded.
    pub local_path: Option<String>,
}

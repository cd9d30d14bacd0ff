//! The concurrent extraction pipeline: per-page processing and the batch
//! runner.
//!
//! For a single URL the flow is strictly sequential: fetch markup, rule-based
//! title and main-text extraction, candidate-image selection and download,
//! one captioning call, one structured-generation call, validation. Only the
//! page fetch is fatal for a URL; every later failure degrades the result
//! instead of failing it, bottoming out in [`Article::fallback`].
//!
//! The batch runner fans page processing out over many URLs behind a fixed
//! concurrency ceiling that bounds aggregate load on both the network and
//! the model backend. Results come back in input order; the first fatal
//! page-fetch error fails the batch as a whole.

use crate::error::Result;
use crate::extract::{readable_text, select_text};
use crate::fetch::Fetcher;
use crate::images::{DEFAULT_LIMIT, ImageStore, pick_candidates};
use crate::llm::{Captioner, Generator, LlmConfig};
use crate::models::{ARTICLE_SCHEMA_HINT, Article, ImageInfo};
use crate::utils::{truncate_chars, truncate_for_log};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Maximum images kept per article. Enforced independently of the picker's
/// candidate limit, so at most [`DEFAULT_LIMIT`] downloads are attempted and
/// at most this many succeed.
const MAX_IMAGES: usize = 3;

/// Concurrency ceiling for in-flight page processors.
const CONCURRENCY: usize = 5;

/// Character budget for the main text embedded in the prompt.
const MAIN_TEXT_BUDGET: usize = 6000;

/// Characters of the extracted title used as the captioning hint.
const TITLE_HINT_CHARS: usize = 80;

/// Token budget for the model's structured reply.
const REPLY_TOKENS: u32 = 256;

/// Sampling temperature for structured generation.
const GEN_TEMPERATURE: f32 = 0.1;

/// The assembled extraction pipeline.
pub struct Pipeline {
    fetcher: Fetcher,
    store: ImageStore,
    generator: Generator,
    captioner: Captioner,
}

impl Pipeline {
    /// Assemble the pipeline: shared HTTP client, image storage area under
    /// `data_dir`, and the model services named by `config`.
    pub async fn new(data_dir: &Path, config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new()?,
            store: ImageStore::new(data_dir).await?,
            generator: Generator::from_config(config)?,
            captioner: Captioner::from_config(config)?,
        })
    }

    /// Process one URL into an [`Article`].
    ///
    /// A page-fetch failure (after retries) propagates; everything after it
    /// degrades. The returned article always has at most [`MAX_IMAGES`]
    /// images, each with a populated `local_path`.
    #[instrument(level = "info", skip(self))]
    pub async fn process_page(&self, url: &str) -> Result<Article> {
        let html = self.fetcher.fetch_text(url).await?;

        // Cheap rule-based extraction first
        let title =
            select_text(&html, r#"meta[property="og:title"]"#).or_else(|| select_text(&html, "title"));
        let main_text = readable_text(&html);
        debug!(
            title = title.as_deref().unwrap_or(""),
            text_bytes = main_text.len(),
            "Extracted page text"
        );

        // Pick a few candidate images and download, keeping only successes
        let candidates = pick_candidates(&html, url, DEFAULT_LIMIT);
        let mut picked: Vec<ImageInfo> = Vec::new();
        for (img_url, alt) in candidates {
            if picked.len() >= MAX_IMAGES {
                break;
            }
            if let Some(stored) = self.store.download(&self.fetcher, &img_url).await {
                debug!(
                    url = %img_url,
                    width = stored.width,
                    height = stored.height,
                    "Kept image"
                );
                picked.push(ImageInfo {
                    url: img_url,
                    alt,
                    caption: None,
                    local_path: Some(stored.local_path),
                });
            }
        }

        // Optional captions, one call for all kept images
        if !picked.is_empty() {
            let hint = title.as_deref().map(|t| truncate_chars(t, TITLE_HINT_CHARS));
            let paths: Vec<String> = picked
                .iter()
                .filter_map(|im| im.local_path.clone())
                .collect();
            let captions = self.captioner.caption(&paths, hint).await;
            for (im, caption) in picked.iter_mut().zip(captions) {
                im.caption = caption;
            }
        }

        let blurb = image_blurb(&picked);
        let prompt = build_prompt(url, title.as_deref(), &blurb, &main_text);

        let article = match self
            .generator
            .generate_json(&prompt, Some(ARTICLE_SCHEMA_HINT), REPLY_TOKENS, GEN_TEMPERATURE)
            .await
        {
            Ok(mut data) => {
                // Attach kept images before validating the combined object
                data.insert("images".to_string(), serde_json::to_value(&picked)?);
                match serde_json::from_value::<Article>(serde_json::Value::Object(data)) {
                    Ok(article) => article,
                    Err(e) => {
                        warn!(%url, error = %e, "Model output failed validation; using fallback");
                        Article::fallback(url, title, picked)
                    }
                }
            }
            Err(e) => {
                warn!(%url, error = %e, "Structured generation failed; using fallback");
                Article::fallback(url, title, picked)
            }
        };

        info!(
            %url,
            images = article.images.len(),
            has_summary = article.summary.is_some(),
            "Processed page"
        );
        Ok(article)
    }

    /// Run the pipeline over `urls` with at most [`CONCURRENCY`] pages in
    /// flight, preserving input order in the output.
    ///
    /// The first fatal page-fetch error fails the whole batch; the caller
    /// decides whether to retry, drop the offending URL, or abort.
    #[instrument(level = "info", skip_all, fields(count = urls.len()))]
    pub async fn run_batch(&self, urls: &[String]) -> Result<Vec<Article>> {
        stream::iter(urls)
            .map(|url| self.process_page(url))
            .buffered(CONCURRENCY)
            .try_collect()
            .await
    }
}

/// Short digest of up to three caption/alt texts to feed the model,
/// preferring captions over alt text.
fn image_blurb(picked: &[ImageInfo]) -> String {
    picked
        .iter()
        .filter_map(|im| im.caption.as_deref().or(im.alt.as_deref()))
        .filter(|t| !t.is_empty())
        .take(MAX_IMAGES)
        .map(|t| format!("- {t}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assemble the strict, bounded extraction prompt.
fn build_prompt(url: &str, title: Option<&str>, blurb: &str, main_text: &str) -> String {
    let prompt = format!(
        "Extract this web page into JSON with fields: url, title, author, summary, published.\n\
         Prefer concise summary (<= 3 sentences). Use ISO 8601 for dates if present.\n\
         If images info is provided, reflect any key facts briefly in the summary.\n\
         \n\
         Input:\n\
         URL: {url}\n\
         \n\
         TITLE (maybe empty):\n\
         {title}\n\
         \n\
         IMAGE CAPTIONS (optional, up to 3):\n\
         {blurb}\n\
         \n\
         MAIN TEXT:\n\
         {text}\n",
        url = url,
        title = title.unwrap_or(""),
        blurb = blurb,
        text = truncate_chars(main_text, MAIN_TEXT_BUDGET),
    );
    debug!(prompt_preview = %truncate_for_log(&prompt, 300), "Built prompt");
    prompt
}

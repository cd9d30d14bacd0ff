//! Results document writer.
//!
//! Serializes the full result set to a single pretty-printed JSON document,
//! the same payload a UI would offer as a download.

use crate::error::Result;
use crate::models::Article;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write all articles as one pretty JSON array at `path`, creating parent
/// directories as needed.
#[instrument(level = "info", skip(articles), fields(path = %path.display(), count = articles.len()))]
pub async fn write_results(articles: &[Article], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(articles)?;
    fs::write(path, json).await?;
    info!("Wrote results document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_results_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out/results.json");
        let articles = vec![
            Article::fallback("https://a.example/", Some("A".to_string()), vec![]),
            Article::fallback("https://b.example/", None, vec![]),
        ];

        write_results(&articles, &path).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let back: Vec<Article> = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].url, "https://a.example/");
        assert_eq!(back[1].url, "https://b.example/");
    }
}

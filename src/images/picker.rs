//! Candidate-image selection from page markup.
//!
//! Yields a small, prioritized set of image URLs for a page: the
//! social-preview image (og:image / twitter:image) first, then `<img>` tags
//! in document order. Candidates are deduplicated by resolved absolute URL
//! and hard-capped at `limit`.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Default candidate cap per page.
pub const DEFAULT_LIMIT: usize = 3;

static META_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"meta[property="og:image"]"#,
        r#"meta[name="twitter:image"]"#,
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Scan `html` for up to `limit` candidate images.
///
/// Returns `(absolute_url, alt)` pairs in priority order. Social-preview
/// meta images carry no alt text. `data:` URIs, empty sources, and URLs that
/// fail to resolve against `base_url` are skipped.
pub fn pick_candidates(html: &str, base_url: &str, limit: usize) -> Vec<(String, Option<String>)> {
    let Ok(base) = Url::parse(base_url) else {
        debug!(%base_url, "Unparseable base URL; no candidates");
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen: HashSet<String> = HashSet::new();
    let mut picked: Vec<(String, Option<String>)> = Vec::new();

    // Prefer og/twitter preview image first
    for sel in META_SELECTORS.iter() {
        if picked.len() >= limit {
            break;
        }
        if let Some(node) = document.select(sel).next()
            && let Some(content) = node.value().attr("content")
            && !content.is_empty()
            && !content.starts_with("data:")
            && let Ok(resolved) = base.join(content)
        {
            let resolved = resolved.to_string();
            if seen.insert(resolved.clone()) {
                picked.push((resolved, None));
            }
        }
    }

    // Then <img> tags in document order
    for node in document.select(&IMG_SELECTOR) {
        if picked.len() >= limit {
            break;
        }
        let src = node
            .value()
            .attr("src")
            .filter(|s| !s.is_empty())
            .or_else(|| node.value().attr("data-src").filter(|s| !s.is_empty()));
        let Some(src) = src else { continue };
        if src.starts_with("data:") {
            continue;
        }
        let Ok(resolved) = base.join(src) else {
            continue;
        };
        let resolved = resolved.to_string();
        if !seen.insert(resolved.clone()) {
            continue;
        }
        let alt = node
            .value()
            .attr("alt")
            .map(str::to_string)
            .filter(|a| !a.is_empty());
        picked.push((resolved, alt));
    }

    debug!(count = picked.len(), %base_url, "Picked image candidates");
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://news.example.com/story/1";

    #[test]
    fn test_og_image_comes_first_then_img_tags_up_to_limit() {
        let html = r#"<html><head>
            <meta property="og:image" content="/preview.jpg">
        </head><body>
            <img src="/a.jpg" alt="first">
            <img src="/b.jpg" alt="second">
            <img src="/c.jpg">
            <img src="/d.jpg">
            <img src="/e.jpg">
        </body></html>"#;

        let picked = pick_candidates(html, BASE, 3);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[0].0, "https://news.example.com/preview.jpg");
        assert_eq!(picked[0].1, None);
        assert_eq!(picked[1].0, "https://news.example.com/a.jpg");
        assert_eq!(picked[1].1.as_deref(), Some("first"));
        assert_eq!(picked[2].0, "https://news.example.com/b.jpg");
    }

    #[test]
    fn test_dedup_by_resolved_url() {
        let html = r#"<html><head>
            <meta property="og:image" content="https://news.example.com/a.jpg">
        </head><body>
            <img src="/a.jpg" alt="same as preview">
            <img src="https://news.example.com/a.jpg">
            <img src="/b.jpg">
        </body></html>"#;

        let picked = pick_candidates(html, BASE, 3);
        let urls: Vec<&str> = picked.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(
            urls,
            [
                "https://news.example.com/a.jpg",
                "https://news.example.com/b.jpg"
            ]
        );
    }

    #[test]
    fn test_skips_data_uris_and_empty_sources() {
        let html = r#"<html><body>
            <img src="data:image/png;base64,AAAA">
            <img src="">
            <img src="/real.png" alt="kept">
        </body></html>"#;

        let picked = pick_candidates(html, BASE, 3);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].0, "https://news.example.com/real.png");
    }

    #[test]
    fn test_lazy_load_fallback_attribute() {
        let html = r#"<html><body>
            <img data-src="/lazy.jpg" alt="lazy">
        </body></html>"#;

        let picked = pick_candidates(html, BASE, 3);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].0, "https://news.example.com/lazy.jpg");
        assert_eq!(picked[0].1.as_deref(), Some("lazy"));
    }

    #[test]
    fn test_twitter_image_used_when_no_og_image() {
        let html = r#"<html><head>
            <meta name="twitter:image" content="/tw.jpg">
        </head><body></body></html>"#;

        let picked = pick_candidates(html, BASE, 3);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].0, "https://news.example.com/tw.jpg");
    }

    #[test]
    fn test_never_exceeds_limit() {
        let imgs: String = (0..10)
            .map(|i| format!(r#"<img src="/{i}.jpg">"#))
            .collect();
        let html = format!("<html><body>{imgs}</body></html>");

        assert_eq!(pick_candidates(&html, BASE, DEFAULT_LIMIT).len(), DEFAULT_LIMIT);
        assert_eq!(pick_candidates(&html, BASE, 1).len(), 1);
        assert!(pick_candidates(&html, BASE, 0).is_empty());
    }

    #[test]
    fn test_data_uri_preview_is_skipped() {
        let html = r#"<html><head>
            <meta property="og:image" content="data:image/gif;base64,AAAA">
        </head><body><img src="/x.jpg"></body></html>"#;

        let picked = pick_candidates(html, BASE, 3);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].0, "https://news.example.com/x.jpg");
    }
}

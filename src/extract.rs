//! Rule-based text extraction from page markup.
//!
//! Two small primitives used ahead of any model call:
//! - [`select_text`]: first-match, trimmed text for a single CSS selector
//! - [`readable_text`]: best-effort plain text of the main article body
//!
//! Both are tolerant by design: malformed markup or missing elements yield
//! `None` / an empty string, never an error.

use scraper::{Html, Selector};

/// Return the trimmed text of the first element matching `selector`.
///
/// `<meta>` tags are read through their `content` attribute; all other tags
/// through their collected text. Returns `None` when nothing matches or the
/// match is empty after trimming, and also when the selector itself does not
/// parse (callers pass literals, so that is a programming error surfaced in
/// tests rather than at runtime).
pub fn select_text(html: &str, selector: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let sel = Selector::parse(selector).ok()?;

    let element = document.select(&sel).next()?;
    let text = if element.value().name() == "meta" {
        element.value().attr("content")?.trim().to_string()
    } else {
        element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    };

    if text.is_empty() { None } else { Some(text) }
}

/// Best-effort plain text of the page's main content.
///
/// Prefers a semantic `<article>` element, then `<main>`, then falls back to
/// joining all `<p>` blocks in document order. Always returns a string,
/// possibly empty.
pub fn readable_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for container in ["article", "main"] {
        let sel = Selector::parse(container).unwrap();
        if let Some(element) = document.select(&sel).next() {
            let text = block_text(element);
            if !text.is_empty() {
                return text;
            }
        }
    }

    let para = Selector::parse("p").unwrap();
    document
        .select(&para)
        .map(|p| p.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collect an element's paragraph-level text, one line per `<p>` descendant,
/// falling back to the element's own text when it has no paragraphs.
fn block_text(element: scraper::ElementRef<'_>) -> String {
    let para = Selector::parse("p").unwrap();
    let paragraphs: Vec<String> = element
        .select(&para)
        .map(|p| p.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if paragraphs.is_empty() {
        element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    } else {
        paragraphs.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_text_meta_content() {
        let html = r#"<html><head>
            <meta property="og:title" content="  OG Headline  ">
            <title>Doc Title</title>
        </head><body></body></html>"#;

        assert_eq!(
            select_text(html, r#"meta[property="og:title"]"#).as_deref(),
            Some("OG Headline")
        );
        assert_eq!(select_text(html, "title").as_deref(), Some("Doc Title"));
    }

    #[test]
    fn test_select_text_missing_or_empty() {
        let html = r#"<html><head><meta property="og:title" content=""></head></html>"#;
        assert_eq!(select_text(html, r#"meta[property="og:title"]"#), None);
        assert_eq!(select_text(html, "h1"), None);
    }

    #[test]
    fn test_readable_text_prefers_article() {
        let html = r#"<html><body>
            <nav><p>menu item</p></nav>
            <article><p>First paragraph.</p><p>Second paragraph.</p></article>
        </body></html>"#;

        let text = readable_text(html);
        assert_eq!(text, "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn test_readable_text_falls_back_to_paragraphs() {
        let html = r#"<html><body>
            <div><p>Alpha.</p></div>
            <div><p>Beta.</p></div>
        </body></html>"#;

        assert_eq!(readable_text(html), "Alpha.\nBeta.");
    }

    #[test]
    fn test_readable_text_empty_page() {
        assert_eq!(readable_text("<html><body></body></html>"), "");
    }
}

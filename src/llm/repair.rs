//! Repair parser for near-JSON model output.
//!
//! Models asked for "only JSON" still wrap replies in code fences or leading
//! prose often enough that parsing raw output directly is unreliable. This
//! module keeps the recovery logic as a small dedicated parser, independent
//! of any network call: strip fence markers, slice to the outermost `{...}`
//! span, then attempt a structured parse.

use crate::error::{Result, ScrapeError};
use serde_json::{Map, Value};

/// Coerce raw model text into a JSON object.
///
/// Fails with [`ScrapeError::MalformedOutput`] when no JSON object can be
/// located, or when the located span parses to something other than an
/// object.
pub fn coerce_json(raw: &str) -> Result<Map<String, Value>> {
    let candidate = clean(raw);
    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| ScrapeError::MalformedOutput(format!("{e}: {}", preview(candidate))))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ScrapeError::MalformedOutput(format!(
            "expected a JSON object, got {}",
            kind(&other)
        ))),
    }
}

/// Strip code-fence markers and slice to the outermost brace span.
fn clean(raw: &str) -> &str {
    let mut txt = raw.trim();
    if txt.starts_with("```") {
        txt = txt.trim_matches('`');
        if let Some(first_nl) = txt.find('\n') {
            txt = &txt[first_nl + 1..];
        }
    }
    match (txt.find('{'), txt.rfind('}')) {
        (Some(l), Some(r)) if r > l => &txt[l..=r],
        _ => txt,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn preview(s: &str) -> String {
    if s.chars().count() <= 120 {
        s.to_string()
    } else {
        format!("{}…", s.chars().take(120).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object_passes_through() {
        let map = coerce_json(r#"{"url":"https://x","title":"T"}"#).unwrap();
        assert_eq!(map["url"], "https://x");
        assert_eq!(map["title"], "T");
    }

    #[test]
    fn test_fenced_json_is_repaired() {
        let raw = "```json\n{\"url\":\"https://x\",\"title\":\"T\"}\n```";
        let map = coerce_json(raw).unwrap();
        assert_eq!(map["url"], "https://x");
        assert_eq!(map["title"], "T");
    }

    #[test]
    fn test_fence_without_language_tag() {
        let raw = "```\n{\"a\":1}\n```";
        let map = coerce_json(raw).unwrap();
        assert_eq!(map["a"], 1);
    }

    #[test]
    fn test_leading_and_trailing_prose_is_sliced_away() {
        let raw = "Here is the extraction you asked for:\n{\"a\": 1, \"b\": {\"c\": 2}}\nHope this helps!";
        let map = coerce_json(raw).unwrap();
        assert_eq!(map["a"], 1);
        assert_eq!(map["b"]["c"], 2);
    }

    #[test]
    fn test_no_object_is_malformed() {
        let err = coerce_json("I could not extract anything.").unwrap_err();
        assert!(matches!(err, ScrapeError::MalformedOutput(_)));
    }

    #[test]
    fn test_non_object_json_is_malformed() {
        let err = coerce_json(r#"[1, 2, 3]"#).unwrap_err();
        assert!(matches!(err, ScrapeError::MalformedOutput(_)));
    }

    #[test]
    fn test_truncated_object_is_malformed() {
        let err = coerce_json(r#"{"url": "https://x", "title""#).unwrap_err();
        assert!(matches!(err, ScrapeError::MalformedOutput(_)));
    }
}

//! Structured-output extraction from free-form model replies.
//!
//! The model is asked for JSON but is not trusted to emit only JSON, so the
//! reply is scanned for an object span first. The span is the first `{` up to
//! the last `}`; nested text with unbalanced braces is not handled.

use std::sync::LazyLock;

use articlesmith_shared::{ArticleSmithError, Result};
use regex::Regex;
use serde_json::{Map, Value};

/// Message used when no `{...}` span exists in the reply.
pub const NO_JSON_MESSAGE: &str = "Failed to parse JSON from model response";

/// Maximum slug length in characters.
const MAX_SLUG_CHARS: usize = 100;

/// Runs of anything outside ASCII lowercase/digits, kana, and CJK ideographs.
static SLUG_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9\x{3040}-\x{309F}\x{30A0}-\x{30FF}\x{4E00}-\x{9FFF}]+")
        .expect("slug separator regex")
});

/// Return the first-`{`-to-last-`}` span of `text`, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Extract and parse the JSON object embedded in a model reply.
pub fn parse_object(raw: &str) -> Result<Map<String, Value>> {
    let span = extract_json_object(raw).ok_or_else(|| ArticleSmithError::parse(NO_JSON_MESSAGE))?;

    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ArticleSmithError::parse(format!(
            "model response is not a JSON object: {}",
            excerpt(&other.to_string())
        ))),
        Err(e) => Err(ArticleSmithError::parse(format!(
            "invalid JSON in model response: {e} (got: {})",
            excerpt(span)
        ))),
    }
}

/// A string field that must be present and non-blank.
pub fn required_str(object: &Map<String, Value>, key: &str) -> Result<String> {
    optional_str(object, key).ok_or_else(|| {
        ArticleSmithError::validation(format!(
            "model response is missing required field '{key}'"
        ))
    })
}

/// A string field, treating blank values as absent. Non-blank values are kept verbatim.
pub fn optional_str(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Derive a URL slug from a title.
///
/// Lower-cases, collapses runs of disallowed characters into one `-`, trims
/// leading/trailing hyphens, and truncates to 100 characters. Kana and CJK
/// ideographs are kept as-is.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let replaced = SLUG_SEPARATOR_RE.replace_all(&lowered, "-");
    replaced
        .trim_matches('-')
        .chars()
        .take(MAX_SLUG_CHARS)
        .collect()
}

/// First 200 characters of `text`, for error messages.
pub(crate) fn excerpt(text: &str) -> String {
    text.chars().take(200).collect()
}

//! Small string helpers shared by the model client and the quiz assembler.
//!
//! - Truncation for logging and for prompt context
//! - JSON error classification for model output
//! - Unwrapping of Markdown code fences around model JSON

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a whole reply wrapped in a fenced code block, with or without a
/// language tag.
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n(.*?)\n?\s*```\s*$").expect("valid fence regex")
});

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters (not bytes, so Hangul is never
/// split) with an ellipsis and a byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Keep at most the first `max` characters of `s`.
///
/// Used to bound the article context sent along with a word explanation.
pub fn clip_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        None => s,
        Some((cut, _)) => &s[..cut],
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// A model reply cut off by a token limit fails with an EOF error; logging
/// that distinctly makes it obvious the model, not the prompt, is at fault.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Remove a surrounding Markdown code fence from a model reply, if present.
pub fn strip_code_fences(s: &str) -> &str {
    match CODE_FENCE.captures(s).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => s.trim(),
    }
}

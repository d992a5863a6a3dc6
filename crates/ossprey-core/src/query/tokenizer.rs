//! Query tokenization and token estimation helpers.

use std::sync::LazyLock;

#[cfg(feature = "python")]
use pyo3::prelude::*;
use regex::Regex;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+").unwrap());

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "of", "to", "in", "on", "at", "for", "and", "or", "is", "are", "was",
    "were", "be", "me", "my", "it", "its", "this", "that", "do", "does", "did", "please",
];

/// Lowercased alphanumeric tokens, in query order.
pub fn tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Tokens that carry meaning: at least two characters and not a stop word.
pub fn meaningful_tokens(text: &str) -> Vec<String> {
    tokens(text)
        .into_iter()
        .filter(|t| t.len() >= 2 && !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Rough token count for budgeting evidence handed to the synthesis model.
#[cfg_attr(feature = "python", pyfunction)]
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    (text.len() as f64 / 3.5).max(1.0) as usize
}

//! Shared guardrails for query payload bounds and result limits.

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub const MAX_QUERY_LENGTH: usize = 512;
pub const MAX_RESULT_LIMIT: usize = 100;
pub const MAX_RETRIEVAL_K: usize = 50;
pub const MAX_SHORTLIST_SIZE: usize = 1000;
pub const DEFAULT_SHORTLIST_SIZE: usize = 50;
pub const MAX_CACHE_ENTRIES: usize = 10_000;
pub const MIN_CACHE_TTL_SECONDS: f64 = 0.1;
pub const MAX_CACHE_TTL_SECONDS: f64 = 86_400.0;

#[cfg_attr(feature = "python", pyfunction)]
pub fn clamp_int(value: usize, minimum: usize, maximum: usize) -> usize {
    value.max(minimum).min(maximum)
}

#[cfg_attr(feature = "python", pyfunction)]
pub fn clamp_limit(value: usize, maximum: usize) -> usize {
    clamp_int(value, 1, maximum)
}

/// Trim and cut the query to [`MAX_QUERY_LENGTH`] bytes on a char boundary.
#[cfg_attr(feature = "python", pyfunction)]
pub fn truncate_query(query: &str) -> String {
    let stripped = query.trim();
    if stripped.len() <= MAX_QUERY_LENGTH {
        return stripped.to_string();
    }
    let mut end = MAX_QUERY_LENGTH;
    while !stripped.is_char_boundary(end) {
        end -= 1;
    }
    stripped[..end].to_string()
}

/// Truncate, lowercase, and collapse internal whitespace.
#[cfg_attr(feature = "python", pyfunction)]
pub fn normalize_query(query: &str) -> String {
    truncate_query(query)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

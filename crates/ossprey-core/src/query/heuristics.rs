//! Heuristic score adjustment for retrieved governance evidence.
//!
//! Corrects the failure mode where a chunk that merely *describes* the kind of
//! information asked for (a format spec, a template) outranks a chunk that
//! *contains* it: meta-marker words are penalized, email- and URL-shaped
//! substrings are rewarded.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_META_PENALTY: f64 = 0.05;
pub const DEFAULT_EMAIL_BONUS: f64 = 0.15;
pub const DEFAULT_URL_BONUS: f64 = 0.10;

static META_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:formats?|formatting|templates?|examples?|descriptions?|placeholders?|samples?|syntax|schemas?)\b",
    )
    .unwrap()
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap()
});

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>()"']+"#).unwrap());

/// Bonus and penalty weights applied per matched occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentWeights {
    pub meta_penalty: f64,
    pub email_bonus: f64,
    pub url_bonus: f64,
}

impl Default for AdjustmentWeights {
    fn default() -> Self {
        Self {
            meta_penalty: DEFAULT_META_PENALTY,
            email_bonus: DEFAULT_EMAIL_BONUS,
            url_bonus: DEFAULT_URL_BONUS,
        }
    }
}

/// Breakdown of how a candidate's similarity was adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreAdjustment {
    pub meta_markers: usize,
    pub emails: usize,
    pub urls: usize,
    pub bonus: f64,
    pub penalty: f64,
}

impl ScoreAdjustment {
    pub fn net(&self) -> f64 {
        self.bonus - self.penalty
    }
}

/// Marker words inside an email or URL (`a@example.org`) are not counted.
pub fn meta_marker_count(text: &str) -> usize {
    let shaped: Vec<(usize, usize)> = EMAIL_RE
        .find_iter(text)
        .chain(URL_RE.find_iter(text))
        .map(|m| (m.start(), m.end()))
        .collect();
    META_MARKER_RE
        .find_iter(text)
        .filter(|m| {
            !shaped
                .iter()
                .any(|&(start, end)| m.start() < end && start < m.end())
        })
        .count()
}

pub fn email_count(text: &str) -> usize {
    EMAIL_RE.find_iter(text).count()
}

pub fn url_count(text: &str) -> usize {
    URL_RE.find_iter(text).count()
}

pub fn score_adjustment(text: &str, weights: &AdjustmentWeights) -> ScoreAdjustment {
    let meta_markers = meta_marker_count(text);
    let emails = email_count(text);
    let urls = url_count(text);
    ScoreAdjustment {
        meta_markers,
        emails,
        urls,
        bonus: emails as f64 * weights.email_bonus + urls as f64 * weights.url_bonus,
        penalty: meta_markers as f64 * weights.meta_penalty,
    }
}

/// Adjusted score = similarity + bonuses - penalties. Unbounded above 1.0:
/// it is a ranking key, not a probability.
pub fn adjusted_score(similarity: f64, adjustment: &ScoreAdjustment) -> f64 {
    similarity + adjustment.net()
}

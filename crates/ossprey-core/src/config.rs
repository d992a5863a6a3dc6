//! Engine configuration with environment overrides.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{OsspreyError, OsspreyResult};
use crate::query::guards::{
    clamp_int, clamp_limit, DEFAULT_SHORTLIST_SIZE, MAX_CACHE_ENTRIES, MAX_RETRIEVAL_K,
    MAX_CACHE_TTL_SECONDS, MAX_SHORTLIST_SIZE, MIN_CACHE_TTL_SECONDS,
};
use crate::query::heuristics::AdjustmentWeights;
use crate::query::planner::{DEFAULT_CACHE_ENTRIES, DEFAULT_CACHE_TTL_SECONDS};
use crate::query::rerank::RerankParams;

pub const DEFAULT_K: usize = 5;

pub const ENV_SHORTLIST_SIZE: &str = "OSSPREY_SHORTLIST_SIZE";
pub const ENV_META_PENALTY: &str = "OSSPREY_META_PENALTY";
pub const ENV_EMAIL_BONUS: &str = "OSSPREY_EMAIL_BONUS";
pub const ENV_URL_BONUS: &str = "OSSPREY_URL_BONUS";
pub const ENV_DEFAULT_K: &str = "OSSPREY_DEFAULT_K";
pub const ENV_CACHE_MAX_ENTRIES: &str = "OSSPREY_CACHE_MAX_ENTRIES";
pub const ENV_CACHE_TTL_SECONDS: &str = "OSSPREY_CACHE_TTL_SECONDS";
pub const ENV_QUERY_CACHE: &str = "OSSPREY_QUERY_CACHE";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub shortlist_size: usize,
    pub weights: AdjustmentWeights,
    /// Evidence items returned when the caller does not pass `k`.
    pub default_k: usize,
    pub cache_max_entries: usize,
    pub cache_ttl_seconds: f64,
    pub query_cache: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shortlist_size: DEFAULT_SHORTLIST_SIZE,
            weights: AdjustmentWeights::default(),
            default_k: DEFAULT_K,
            cache_max_entries: DEFAULT_CACHE_ENTRIES,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            query_cache: true,
        }
    }
}

fn parse_number<T: FromStr>(name: &str, raw: &str) -> OsspreyResult<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| OsspreyError::Config(format!("{name}: cannot parse '{raw}'")))
}

fn parse_weight(name: &str, raw: &str) -> OsspreyResult<f64> {
    let value: f64 = parse_number(name, raw)?;
    if !value.is_finite() || value < 0.0 {
        return Err(OsspreyError::Config(format!(
            "{name}: expected a non-negative number, got '{raw}'"
        )));
    }
    Ok(value)
}

fn parse_flag(name: &str, raw: &str) -> OsspreyResult<bool> {
    let v = raw.trim().to_lowercase();
    match v.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(OsspreyError::Config(format!(
            "{name}: expected on/off, got '{raw}'"
        ))),
    }
}

impl EngineConfig {
    /// Defaults overridden by `OSSPREY_*` environment variables.
    pub fn from_env() -> OsspreyResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    /// name. Out-of-range values are clamped; unparsable values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> OsspreyResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_SHORTLIST_SIZE) {
            config.shortlist_size = parse_number(ENV_SHORTLIST_SIZE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_META_PENALTY) {
            config.weights.meta_penalty = parse_weight(ENV_META_PENALTY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_EMAIL_BONUS) {
            config.weights.email_bonus = parse_weight(ENV_EMAIL_BONUS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_URL_BONUS) {
            config.weights.url_bonus = parse_weight(ENV_URL_BONUS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DEFAULT_K) {
            config.default_k = parse_number(ENV_DEFAULT_K, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CACHE_MAX_ENTRIES) {
            config.cache_max_entries = parse_number(ENV_CACHE_MAX_ENTRIES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CACHE_TTL_SECONDS) {
            config.cache_ttl_seconds = parse_weight(ENV_CACHE_TTL_SECONDS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_QUERY_CACHE) {
            config.query_cache = parse_flag(ENV_QUERY_CACHE, &raw)?;
        }

        Ok(config.clamped())
    }

    /// Pull every bound into its guard range.
    pub fn clamped(mut self) -> Self {
        self.shortlist_size = clamp_limit(self.shortlist_size, MAX_SHORTLIST_SIZE);
        self.default_k = clamp_limit(self.default_k, MAX_RETRIEVAL_K);
        self.cache_max_entries = clamp_int(self.cache_max_entries, 1, MAX_CACHE_ENTRIES);
        self.cache_ttl_seconds = self
            .cache_ttl_seconds
            .clamp(MIN_CACHE_TTL_SECONDS, MAX_CACHE_TTL_SECONDS);
        self
    }

    pub fn rerank_params(&self) -> RerankParams {
        RerankParams {
            shortlist_size: self.shortlist_size,
            weights: self.weights,
        }
    }
}

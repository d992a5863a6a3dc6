//! Query planner with lightweight in-memory response caching.
//!
//! Entries are keyed by project, normalized query and the snapshot version
//! they were computed against, so reloading a project makes its old entries
//! unreachable; they age out by TTL or capacity.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::query::guards::{
    clamp_int, MAX_CACHE_ENTRIES, MAX_CACHE_TTL_SECONDS, MIN_CACHE_TTL_SECONDS,
};

pub const DEFAULT_CACHE_ENTRIES: usize = 512;
pub const DEFAULT_CACHE_TTL_SECONDS: f64 = 15.0;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    CacheHit,
    CacheMiss,
    /// Caching disabled; computed directly.
    Bypass,
}

impl CacheMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMode::CacheHit => "cache_hit",
            CacheMode::CacheMiss => "cache_miss",
            CacheMode::Bypass => "bypass",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannerTrace {
    pub mode: CacheMode,
    pub lookup_ms: f64,
    pub compute_ms: f64,
    pub total_ms: f64,
    pub version_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlannerStats {
    pub entries: usize,
    pub max_entries: usize,
    pub ttl_seconds: f64,
}

fn round_ms(ms: f64) -> f64 {
    (ms * 1000.0).round() / 1000.0
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Stable key for `(project, normalized query)` at `version_token`.
pub fn cache_key(project_id: &str, normalized_query: &str, version_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(project_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(normalized_query.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("{project_id}:{version_token}:{hex}")
}

pub struct QueryPlanner<V> {
    max_entries: usize,
    ttl: Duration,
    cache: Mutex<IndexMap<String, CacheEntry<V>>>,
}

impl<V: Clone> Default for QueryPlanner<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_ENTRIES, DEFAULT_CACHE_TTL_SECONDS)
    }
}

impl<V: Clone> QueryPlanner<V> {
    pub fn new(max_entries: usize, ttl_seconds: f64) -> Self {
        let ttl_seconds = if ttl_seconds.is_finite() {
            ttl_seconds.clamp(MIN_CACHE_TTL_SECONDS, MAX_CACHE_TTL_SECONDS)
        } else {
            DEFAULT_CACHE_TTL_SECONDS
        };
        Self {
            max_entries: clamp_int(max_entries, 1, MAX_CACHE_ENTRIES),
            ttl: Duration::from_secs_f64(ttl_seconds),
            cache: Mutex::new(IndexMap::new()),
        }
    }

    fn evict_expired(cache: &mut IndexMap<String, CacheEntry<V>>, now: Instant) {
        cache.retain(|_, entry| entry.expires_at > now);
    }

    fn evict_over_capacity(&self, cache: &mut IndexMap<String, CacheEntry<V>>) {
        while cache.len() > self.max_entries {
            cache.shift_remove_index(0);
        }
    }

    /// Return the cached value for `key` or compute, store and return it.
    /// Errors from `compute` are propagated and never cached.
    pub fn get_or_compute<E>(
        &self,
        key: &str,
        version_token: &str,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<(V, PlannerTrace), E> {
        let lookup_started = Instant::now();

        {
            let mut cache = self.cache.lock();
            Self::evict_expired(&mut cache, Instant::now());
            // Move to end for LRU
            if let Some(entry) = cache.shift_remove(key) {
                let value = entry.value.clone();
                cache.insert(key.to_string(), entry);
                let lookup_ms = round_ms(elapsed_ms(lookup_started));
                debug!("Planner cache hit for {}", key);
                return Ok((
                    value,
                    PlannerTrace {
                        mode: CacheMode::CacheHit,
                        lookup_ms,
                        compute_ms: 0.0,
                        total_ms: lookup_ms,
                        version_token: version_token.to_string(),
                    },
                ));
            }
        }

        let compute_started = Instant::now();
        let value = compute()?;
        let compute_ms = elapsed_ms(compute_started);

        {
            let mut cache = self.cache.lock();
            cache.insert(
                key.to_string(),
                CacheEntry {
                    value: value.clone(),
                    expires_at: Instant::now() + self.ttl,
                },
            );
            self.evict_over_capacity(&mut cache);
        }

        let total_ms = elapsed_ms(lookup_started);
        debug!("Planner cache miss for {}", key);
        Ok((
            value,
            PlannerTrace {
                mode: CacheMode::CacheMiss,
                lookup_ms: round_ms((total_ms - compute_ms).max(0.0)),
                compute_ms: round_ms(compute_ms),
                total_ms: round_ms(total_ms),
                version_token: version_token.to_string(),
            },
        ))
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> PlannerStats {
        PlannerStats {
            entries: self.cache.lock().len(),
            max_entries: self.max_entries,
            ttl_seconds: self.ttl.as_secs_f64(),
        }
    }
}

/// Trace for a computation that skipped the cache entirely.
pub fn bypass_trace<T>(version_token: &str, compute: impl FnOnce() -> T) -> (T, PlannerTrace) {
    let started = Instant::now();
    let value = compute();
    let ms = round_ms(elapsed_ms(started));
    (
        value,
        PlannerTrace {
            mode: CacheMode::Bypass,
            lookup_ms: 0.0,
            compute_ms: ms,
            total_ms: ms,
            version_token: version_token.to_string(),
        },
    )
}

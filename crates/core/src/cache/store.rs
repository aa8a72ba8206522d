//! Bounded query cache with TTL expiry.
//!
//! Entries expire lazily: an expired entry is removed the next time it is
//! looked up, or when the periodic `cleanup` sweep runs. Eviction at
//! capacity removes the oldest-inserted entry, which approximates LRU
//! without tracking access recency.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use super::key::cache_key;

/// Default maximum number of cache entries.
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Default entry TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A single cached result.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    created_at: Instant,
    ttl: Duration,
    hit_count: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) > self.ttl
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order, oldest first. Drives eviction.
    order: VecDeque<String>,
}

impl CacheInner {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }
}

/// Aggregate cache statistics.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheStats {
    /// Live entries, including expired-but-unswept ones.
    pub size: usize,
    /// Configured capacity.
    pub max_size: usize,
    /// Total hits across all live entries.
    pub total_hits: u64,
    /// Mean hits per live entry.
    pub avg_hits_per_entry: f64,
    /// size / max_size as a percentage.
    pub utilization_percent: f64,
}

/// In-memory query result cache shared by all in-flight requests.
#[derive(Debug)]
pub struct QueryCache {
    inner: Mutex<CacheInner>,
    max_size: usize,
    default_ttl: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE, DEFAULT_TTL)
    }
}

impl QueryCache {
    /// Create a cache with the given capacity and default TTL.
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self { inner: Mutex::new(CacheInner::default()), max_size: max_size.max(1), default_ttl }
    }

    /// Look up a cached result for a query and its params.
    ///
    /// Returns `None` on a miss. An entry past its TTL is deleted on the
    /// spot and reported as a miss, so stale data is never returned even
    /// before the sweep touches it. A hit increments the entry's hit count.
    pub async fn get(&self, query: &str, params: &Value) -> Option<Value> {
        let key = cache_key(query, params);
        let mut inner = self.inner.lock().await;

        let now = Instant::now();
        let expired = match inner.entries.get(&key) {
            Some(entry) => entry.is_expired(now),
            None => return None,
        };

        if expired {
            inner.remove(&key);
            return None;
        }

        let entry = inner.entries.get_mut(&key)?;
        entry.hit_count += 1;
        Some(entry.data.clone())
    }

    /// Store a result, evicting the oldest-inserted entry at capacity.
    ///
    /// Re-setting an existing key refreshes its value and its insertion
    /// position. `ttl` of `None` uses the cache default.
    pub async fn set(&self, query: &str, data: Value, params: &Value, ttl: Option<Duration>) {
        let key = cache_key(query, params);
        let mut inner = self.inner.lock().await;

        inner.remove(&key);
        while inner.entries.len() >= self.max_size {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }

        inner.entries.insert(
            key.clone(),
            CacheEntry {
                data,
                created_at: Instant::now(),
                ttl: ttl.unwrap_or(self.default_ttl),
                hit_count: 0,
            },
        );
        inner.order.push_back(key);
    }

    /// Remove entries whose key matches `pattern` (case-insensitive regex),
    /// or everything when no pattern is given. Returns the number removed.
    ///
    /// An unparseable pattern removes nothing.
    pub async fn invalidate(&self, pattern: Option<&str>) -> usize {
        let mut inner = self.inner.lock().await;

        let Some(pattern) = pattern else {
            let count = inner.entries.len();
            inner.entries.clear();
            inner.order.clear();
            return count;
        };

        let re = match regex::RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!("invalid cache invalidation pattern {:?}: {}", pattern, e);
                return 0;
            }
        };

        let matched: Vec<String> = inner.entries.keys().filter(|k| re.is_match(k)).cloned().collect();
        for key in &matched {
            inner.remove(key);
        }
        matched.len()
    }

    /// Aggregate statistics over live entries.
    ///
    /// Pure read: expired-but-unswept entries still count toward `size`.
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;

        let size = inner.entries.len();
        let total_hits: u64 = inner.entries.values().map(|e| e.hit_count).sum();
        let avg_hits_per_entry = if size == 0 { 0.0 } else { total_hits as f64 / size as f64 };
        let utilization_percent = size as f64 / self.max_size as f64 * 100.0;

        CacheStats { size, max_size: self.max_size, total_hits, avg_hits_per_entry, utilization_percent }
    }

    /// Delete every entry whose age exceeds its TTL.
    ///
    /// Returns the number removed. Intended for a periodic background tick
    /// owned by the process entry point, not per-request use.
    pub async fn cleanup(&self) -> usize {
        let mut inner = self.inner.lock().await;

        let now = Instant::now();
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            inner.remove(key);
        }
        expired.len()
    }
}

//! Read-through query cache.
//!
//! Memoizes frequent reads (link lookups by path, rule lists) with per-entry
//! TTL and tag-based invalidation. Process-local by design: a multi-instance
//! deployment trades cache-hit consistency for simplicity.

use dashmap::DashMap;
use metrics::counter;
use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    created_at: Instant,
    ttl: Duration,
    tags: Vec<String>,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) <= self.ttl
    }
}

/// TTL + tag cache over cloneable values.
///
/// Values are stored per key; a write to the underlying store invalidates by
/// exact key or by tag, so every key that could have observed the changed row
/// is dropped together.
pub struct QueryCache<T: Clone + Send + Sync + 'static> {
    entries: DashMap<String, CacheEntry<T>>,
}

impl<T: Clone + Send + Sync + 'static> QueryCache<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns the cached value if fresh, otherwise runs `loader`, stores a
    /// `Some` result under `ttl`/`tags`, and returns it.
    ///
    /// `None` results are not negatively cached: absent rows stay loader
    /// hits so a created row becomes visible immediately.
    pub async fn get_or_load<E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        tags: &[&str],
        loader: F,
    ) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        if let Some(value) = self.get(key) {
            counter!("query_cache_hits_total").increment(1);
            return Ok(Some(value));
        }
        counter!("query_cache_misses_total").increment(1);

        let loaded = loader().await?;
        if let Some(ref value) = loaded {
            self.insert(key, value.clone(), ttl, tags);
        }
        Ok(loaded)
    }

    /// Fresh-only lookup.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|e| e.is_fresh(now))
            .map(|e| e.value.clone())
    }

    pub fn insert(&self, key: &str, value: T, ttl: Duration, tags: &[&str]) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                created_at: Instant::now(),
                ttl,
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
        );
    }

    /// Drops one key. The next `get_or_load` for it always invokes the
    /// loader.
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drops every key starting with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.entries.retain(|k, _| !k.starts_with(prefix));
    }

    /// Drops every entry carrying `tag`.
    pub fn invalidate_tag(&self, tag: &str) {
        self.entries.retain(|_, e| !e.tags.iter().any(|t| t == tag));
    }

    /// Removes expired entries; returns how many were dropped. Called by the
    /// periodic sweep.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_fresh(now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

//! HTTP-response-shaped cache with ETag and stale-while-revalidate.
//!
//! Entries are keyed by method, path, and the values of a declared `vary`
//! header set. Eviction is size-bounded, oldest-first. Like every cache in
//! this crate it is process-local and loses nothing critical when dropped:
//! callers always fall through to the origin.

use metrics::counter;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Cache key: method, path, and the request's values for the vary headers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseKey {
    pub method: String,
    pub path: String,
    pub vary: Vec<String>,
}

impl ResponseKey {
    pub fn new(method: impl Into<String>, path: impl Into<String>, vary: Vec<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            vary,
        }
    }

    pub fn get(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(method, path, Vec::new())
    }
}

/// A stored response payload.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub etag: String,
}

/// Entry freshness at lookup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// Within the stale window. `revalidate` is true for exactly one caller,
    /// which owns the background refresh.
    Stale { revalidate: bool },
}

struct StoredEntry {
    response: CachedResponse,
    created_at: Instant,
    ttl: Duration,
    stale_window: Duration,
    tags: Vec<String>,
    revalidating: bool,
}

impl StoredEntry {
    fn freshness(&self, now: Instant) -> Option<Freshness> {
        let age = now.duration_since(self.created_at);
        if age <= self.ttl {
            Some(Freshness::Fresh)
        } else if age <= self.ttl + self.stale_window {
            Some(Freshness::Stale { revalidate: false })
        } else {
            None
        }
    }
}

struct Inner {
    entries: HashMap<ResponseKey, StoredEntry>,
    // Insertion order; front is oldest and evicted first.
    order: VecDeque<ResponseKey>,
}

/// Bounded response cache.
pub struct ResponseCache {
    inner: Mutex<Inner>,
    max_entries: usize,
}

impl ResponseCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_entries,
        }
    }

    /// Looks up an entry. Fresh entries come back as-is; entries within the
    /// stale window come back marked, with `revalidate = true` for the first
    /// caller only; entries past the stale window are dropped.
    pub fn get(&self, key: &ResponseKey) -> Option<(CachedResponse, Freshness)> {
        let now = Instant::now();
        let mut inner = self.inner.lock().expect("response cache poisoned");

        let freshness = match inner.entries.get(key) {
            Some(entry) => entry.freshness(now),
            None => {
                counter!("response_cache_misses_total").increment(1);
                return None;
            }
        };

        match freshness {
            Some(Freshness::Fresh) => {
                counter!("response_cache_hits_total").increment(1);
                let entry = inner.entries.get(key).expect("checked above");
                Some((entry.response.clone(), Freshness::Fresh))
            }
            Some(Freshness::Stale { .. }) => {
                counter!("response_cache_stale_hits_total").increment(1);
                let entry = inner.entries.get_mut(key).expect("checked above");
                let revalidate = !entry.revalidating;
                entry.revalidating = true;
                Some((entry.response.clone(), Freshness::Stale { revalidate }))
            }
            None => {
                inner.entries.remove(key);
                inner.order.retain(|k| k != key);
                counter!("response_cache_misses_total").increment(1);
                None
            }
        }
    }

    /// Stores a response, computing its content ETag. Evicts oldest entries
    /// beyond the size bound.
    #[allow(clippy::too_many_arguments)]
    pub fn put(
        &self,
        key: ResponseKey,
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        ttl: Duration,
        stale_window: Duration,
        tags: &[&str],
    ) -> CachedResponse {
        let response = CachedResponse {
            status,
            headers,
            etag: content_etag(&body),
            body,
        };

        let mut inner = self.inner.lock().expect("response cache poisoned");
        if inner.entries.insert(
            key.clone(),
            StoredEntry {
                response: response.clone(),
                created_at: Instant::now(),
                ttl,
                stale_window,
                tags: tags.iter().map(|t| t.to_string()).collect(),
                revalidating: false,
            },
        ).is_none()
        {
            inner.order.push_back(key);
        }

        while inner.entries.len() > self.max_entries {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                    counter!("response_cache_evictions_total").increment(1);
                }
                None => break,
            }
        }

        response
    }

    /// Drops one entry.
    pub fn invalidate(&self, key: &ResponseKey) {
        let mut inner = self.inner.lock().expect("response cache poisoned");
        if inner.entries.remove(key).is_some() {
            inner.order.retain(|k| k != key);
        }
    }

    /// Drops every entry carrying `tag`.
    pub fn invalidate_tag(&self, tag: &str) {
        let mut inner = self.inner.lock().expect("response cache poisoned");
        inner
            .entries
            .retain(|_, e| !e.tags.iter().any(|t| t == tag));
        let entries = &inner.entries;
        let retained: Vec<ResponseKey> = inner
            .order
            .iter()
            .filter(|k| entries.contains_key(*k))
            .cloned()
            .collect();
        inner.order = retained.into();
    }

    /// Removes entries past their stale window. Called by the periodic
    /// sweep.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock().expect("response cache poisoned");
        let before = inner.entries.len();
        inner.entries.retain(|_, e| e.freshness(now).is_some());
        let entries = &inner.entries;
        let retained: Vec<ResponseKey> = inner
            .order
            .iter()
            .filter(|k| entries.contains_key(*k))
            .cloned()
            .collect();
        inner.order = retained.into();
        before - inner.entries.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("response cache poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Strong ETag from the body content.
fn content_etag(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!("\"{}\"", hex::encode(&digest[..16]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);
    const STALE: Duration = Duration::from_secs(30);

    fn put_simple(cache: &ResponseCache, path: &str, body: &str) -> CachedResponse {
        cache.put(
            ResponseKey::get("GET", path),
            200,
            vec![("content-type".to_string(), "application/json".to_string())],
            body.as_bytes().to_vec(),
            TTL,
            STALE,
            &["links"],
        )
    }

    #[test]
    fn test_fresh_hit_roundtrip() {
        let cache = ResponseCache::new(16);
        let stored = put_simple(&cache, "/visit/a", r#"{"id":1}"#);

        let (response, freshness) = cache.get(&ResponseKey::get("GET", "/visit/a")).unwrap();
        assert_eq!(freshness, Freshness::Fresh);
        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"id":1}"#);
        assert_eq!(response.etag, stored.etag);
    }

    #[test]
    fn test_etag_tracks_content() {
        let cache = ResponseCache::new(16);
        let a = put_simple(&cache, "/visit/a", "payload-a");
        let b = put_simple(&cache, "/visit/b", "payload-b");
        let a2 = put_simple(&cache, "/visit/c", "payload-a");

        assert_ne!(a.etag, b.etag);
        assert_eq!(a.etag, a2.etag);
        assert!(a.etag.starts_with('"') && a.etag.ends_with('"'));
    }

    #[test]
    fn test_vary_values_separate_entries() {
        let cache = ResponseCache::new(16);
        cache.put(
            ResponseKey::new("GET", "/to", vec!["en".to_string()]),
            200,
            vec![],
            b"english".to_vec(),
            TTL,
            STALE,
            &[],
        );

        let miss = cache.get(&ResponseKey::new("GET", "/to", vec!["de".to_string()]));
        assert!(miss.is_none());

        let hit = cache.get(&ResponseKey::new("GET", "/to", vec!["en".to_string()]));
        assert!(hit.is_some());
    }

    #[test]
    fn test_stale_entry_marks_one_revalidator() {
        let cache = ResponseCache::new(16);
        cache.put(
            ResponseKey::get("GET", "/visit/a"),
            200,
            vec![],
            b"x".to_vec(),
            Duration::ZERO,
            STALE,
            &[],
        );
        std::thread::sleep(Duration::from_millis(5));

        let key = ResponseKey::get("GET", "/visit/a");
        let (_, first) = cache.get(&key).unwrap();
        let (_, second) = cache.get(&key).unwrap();

        assert_eq!(first, Freshness::Stale { revalidate: true });
        assert_eq!(second, Freshness::Stale { revalidate: false });
    }

    #[test]
    fn test_beyond_stale_window_is_gone() {
        let cache = ResponseCache::new(16);
        cache.put(
            ResponseKey::get("GET", "/visit/a"),
            200,
            vec![],
            b"x".to_vec(),
            Duration::ZERO,
            Duration::ZERO,
            &[],
        );
        std::thread::sleep(Duration::from_millis(5));

        assert!(cache.get(&ResponseKey::get("GET", "/visit/a")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_bounded_eviction_drops_oldest() {
        let cache = ResponseCache::new(2);
        put_simple(&cache, "/a", "1");
        put_simple(&cache, "/b", "2");
        put_simple(&cache, "/c", "3");

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&ResponseKey::get("GET", "/a")).is_none());
        assert!(cache.get(&ResponseKey::get("GET", "/b")).is_some());
        assert!(cache.get(&ResponseKey::get("GET", "/c")).is_some());
    }

    #[test]
    fn test_invalidate_tag() {
        let cache = ResponseCache::new(16);
        put_simple(&cache, "/a", "1");
        cache.put(
            ResponseKey::get("GET", "/other"),
            200,
            vec![],
            b"2".to_vec(),
            TTL,
            STALE,
            &["rules"],
        );

        cache.invalidate_tag("links");

        assert!(cache.get(&ResponseKey::get("GET", "/a")).is_none());
        assert!(cache.get(&ResponseKey::get("GET", "/other")).is_some());
    }

    #[test]
    fn test_replacing_key_keeps_single_order_slot() {
        let cache = ResponseCache::new(2);
        put_simple(&cache, "/a", "1");
        put_simple(&cache, "/a", "1-updated");
        put_simple(&cache, "/b", "2");

        // /a was replaced in place, so both keys still fit the bound.
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&ResponseKey::get("GET", "/a")).is_some());
        assert!(cache.get(&ResponseKey::get("GET", "/b")).is_some());
    }
}

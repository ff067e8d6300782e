//! Request de-duplication.
//!
//! Collapses concurrent identical fetches onto one in-flight future and
//! retains the resolved value for a short TTL, absorbing rapid repeated
//! calls. Failed fetches are not retained: the next caller retries.

use dashmap::DashMap;
use metrics::counter;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

struct Slot<T> {
    created_at: Instant,
    cell: Arc<OnceCell<T>>,
}

/// Short-TTL future memoization keyed by string.
pub struct RequestDeduper<T: Clone + Send + Sync + 'static> {
    slots: DashMap<String, Slot<T>>,
    ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> RequestDeduper<T> {
    /// `ttl` bounds how long a resolved value keeps absorbing calls;
    /// single-digit seconds in practice.
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
        }
    }

    /// Joins an identical in-flight request if one exists, otherwise runs
    /// `fetcher` once and shares its result.
    pub async fn get<E, F, Fut>(&self, key: &str, fetcher: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cell = {
            let now = Instant::now();
            let mut slot = self
                .slots
                .entry(key.to_string())
                .or_insert_with(|| Slot {
                    created_at: now,
                    cell: Arc::new(OnceCell::new()),
                });

            // A completed slot past its TTL is replaced; an in-flight slot is
            // always joined, however old.
            if slot.cell.initialized() && now.duration_since(slot.created_at) > self.ttl {
                *slot = Slot {
                    created_at: now,
                    cell: Arc::new(OnceCell::new()),
                };
            }

            slot.cell.clone()
        };

        if cell.initialized() {
            counter!("dedup_joins_total").increment(1);
        }

        let result = cell.get_or_try_init(|| fetcher()).await.cloned();

        if result.is_err() {
            // Drop the failed slot so the next caller retries, unless a
            // concurrent caller already replaced or completed it.
            self.slots
                .remove_if(key, |_, slot| Arc::ptr_eq(&slot.cell, &cell) && !cell.initialized());
        }

        result
    }

    /// Removes completed slots past their TTL. Called by the periodic sweep.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.slots.len();
        self.slots.retain(|_, slot| {
            !(slot.cell.initialized() && now.duration_since(slot.created_at) > self.ttl)
        });
        before - self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    #[tokio::test]
    async fn test_concurrent_calls_fetch_once() {
        let deduper: Arc<RequestDeduper<String>> =
            Arc::new(RequestDeduper::new(Duration::from_secs(5)));
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let deduper = deduper.clone();
            let calls = calls.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                deduper
                    .get("title:https://example.com", || {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok::<_, String>("Example".to_string())
                        }
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "Example");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolved_value_reused_within_ttl() {
        let deduper: RequestDeduper<u32> = RequestDeduper::new(Duration::from_secs(5));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = deduper
                .get("k", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, String>(42) }
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_value_refetched() {
        let deduper: RequestDeduper<u32> = RequestDeduper::new(Duration::ZERO);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            deduper
                .get("k", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, String>(1) }
                })
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_retained() {
        let deduper: RequestDeduper<u32> = RequestDeduper::new(Duration::from_secs(5));
        let calls = AtomicUsize::new(0);

        let first = deduper
            .get("k", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>("boom") }
            })
            .await;
        assert!(first.is_err());

        let second = deduper
            .get("k", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, &str>(9) }
            })
            .await;
        assert_eq!(second, Ok(9));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_evict_expired_sweep() {
        let deduper: RequestDeduper<u32> = RequestDeduper::new(Duration::ZERO);
        deduper
            .get("k", || async { Ok::<_, String>(1) })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(deduper.evict_expired(), 1);
        assert!(deduper.is_empty());
    }
}

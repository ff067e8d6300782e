//! Link resolution and visit recording.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::domain::entities::{ShortLink, VisitMeta};
use crate::domain::repositories::{LinkRepository, VisitRepository};
use crate::error::AppError;
use crate::infrastructure::cache::{QueryCache, RequestDeduper};
use crate::utils::audit::AuditLog;

/// Cache tag shared by every key that can observe a link row.
pub const LINKS_TAG: &str = "links";

/// Resolves paths to link records through the cache and records visits.
///
/// Resolution reads through the query cache with a short TTL (views and
/// expiry drift over time) and collapses concurrent misses for the same path
/// onto one database load. Expiry is deliberately *not* checked here: callers
/// compare against their own clock so a cached record can never hide an
/// expired link.
pub struct LinkResolver {
    links: Arc<dyn LinkRepository>,
    visits: Arc<dyn VisitRepository>,
    cache: Arc<QueryCache<ShortLink>>,
    deduper: RequestDeduper<Option<ShortLink>>,
    cache_ttl: Duration,
    audit: AuditLog,
}

impl LinkResolver {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        visits: Arc<dyn VisitRepository>,
        cache: Arc<QueryCache<ShortLink>>,
        cache_ttl: Duration,
        dedup_ttl: Duration,
        audit: AuditLog,
    ) -> Self {
        Self {
            links,
            visits,
            cache,
            deduper: RequestDeduper::new(dedup_ttl),
            cache_ttl,
            audit,
        }
    }

    /// Resolves a path to its link record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for unknown paths and
    /// [`AppError::Internal`] when the load fails after retries.
    pub async fn resolve(&self, path: &str) -> Result<ShortLink, AppError> {
        let key = format!("link:{path}");

        let link = self
            .cache
            .get_or_load(&key, self.cache_ttl, &[LINKS_TAG], || {
                self.deduper
                    .get(&key, || self.links.find_by_path(path))
            })
            .await?;

        link.ok_or_else(|| AppError::not_found("Short link not found", json!({ "path": path })))
    }

    /// Drops the cached record for a path. Called after writes that change
    /// what a resolution could observe.
    pub fn invalidate(&self, path: &str) {
        self.cache.invalidate(&format!("link:{path}"));
    }

    /// Records a stored-link visit: one transaction, one view increment, one
    /// log row. Best-effort by contract: failures are logged and swallowed,
    /// never surfaced to the visitor.
    pub async fn record_visit(
        &self,
        link: &ShortLink,
        visited_at: DateTime<Utc>,
        meta: &VisitMeta,
    ) {
        match self
            .visits
            .record_link_visit(link.id, visited_at, meta)
            .await
        {
            Ok(()) => {
                metrics::counter!("visits_recorded_total").increment(1);
                // The cached record's view count is now behind.
                self.invalidate(&link.path);
            }
            Err(e) => {
                warn!(path = %link.path, "failed to record visit: {e:?}");
                self.audit
                    .error("record_visit", &format!("link {} failed", link.path));
            }
        }
    }

    /// Records an ad-hoc `/to` visit. Same best-effort contract.
    pub async fn record_ad_hoc_visit(
        &self,
        target_url: &str,
        visited_at: DateTime<Utc>,
        meta: &VisitMeta,
    ) {
        if let Err(e) = self
            .visits
            .record_ad_hoc_visit(target_url, visited_at, meta)
            .await
        {
            warn!(target_url, "failed to record ad-hoc visit: {e:?}");
            self.audit.error("record_to_visit", target_url);
        } else {
            metrics::counter!("visits_recorded_total").increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NewLink;
    use crate::infrastructure::persistence::{InMemoryLinkRepository, InMemoryVisitRepository};

    fn resolver_over(
        links: Arc<InMemoryLinkRepository>,
        visits: Arc<InMemoryVisitRepository>,
    ) -> LinkResolver {
        LinkResolver::new(
            links,
            visits,
            Arc::new(QueryCache::new()),
            Duration::from_secs(30),
            Duration::from_secs(2),
            AuditLog::new(),
        )
    }

    #[tokio::test]
    async fn test_resolve_unknown_path_is_not_found() {
        let links = Arc::new(InMemoryLinkRepository::new());
        let visits = Arc::new(InMemoryVisitRepository::new(links.clone()));
        let resolver = resolver_over(links, visits);

        let err = resolver.resolve("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_caches_record() {
        let links = Arc::new(InMemoryLinkRepository::new());
        let visits = Arc::new(InMemoryVisitRepository::new(links.clone()));
        links
            .create(NewLink::plain("promo", "https://example.com"))
            .await
            .unwrap();
        let resolver = resolver_over(links.clone(), visits);

        let first = resolver.resolve("promo").await.unwrap();
        let second = resolver.resolve("promo").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_record_visit_invalidates_cached_views() {
        let links = Arc::new(InMemoryLinkRepository::new());
        let visits = Arc::new(InMemoryVisitRepository::new(links.clone()));
        links
            .create(NewLink::plain("promo", "https://example.com"))
            .await
            .unwrap();
        let resolver = resolver_over(links.clone(), visits.clone());

        let link = resolver.resolve("promo").await.unwrap();
        assert_eq!(link.views, 0);

        resolver
            .record_visit(&link, Utc::now(), &VisitMeta::default())
            .await;

        // Invalidation forces a reload that sees the incremented counter.
        let reloaded = resolver.resolve("promo").await.unwrap();
        assert_eq!(reloaded.views, 1);
        assert_eq!(visits.count_visits(link.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_record_visit_swallows_failures() {
        let links = Arc::new(InMemoryLinkRepository::new());
        let visits = Arc::new(InMemoryVisitRepository::new(links.clone()));
        let resolver = resolver_over(links.clone(), visits);

        let ghost = ShortLink {
            id: 999,
            path: "ghost".to_string(),
            original_url: "https://example.com".to_string(),
            title: None,
            password_digest: None,
            require_confirm: false,
            enable_intermediate: false,
            expires_at: None,
            views: 0,
            created_at: Utc::now(),
        };

        // No panic, no error: recording against a missing link only logs.
        resolver
            .record_visit(&ghost, Utc::now(), &VisitMeta::default())
            .await;
    }
}

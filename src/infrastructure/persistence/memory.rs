//! In-memory repository implementations.
//!
//! Backed by DashMap so concurrent visits exercise the same interleavings as
//! production. Used by integration tests and database-free local runs; the
//! atomicity contract of `record_link_visit` is upheld with a per-link mutex
//! standing in for the transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::Mutex;

use crate::domain::entities::{
    DomainRule, NewDomainRule, NewLink, SecurityMode, ShortLink, VisitMeta, VisitRecord,
};
use crate::domain::repositories::{DomainRuleRepository, LinkRepository, VisitRepository};
use crate::error::AppError;

/// In-memory link store.
#[derive(Default)]
pub struct InMemoryLinkRepository {
    links: DashMap<String, ShortLink>,
    next_id: AtomicI64,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self {
            links: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<ShortLink, AppError> {
        if self.links.contains_key(&new_link.path) {
            return Err(AppError::conflict(
                "Path already exists",
                json!({ "path": new_link.path }),
            ));
        }

        let link = ShortLink {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            path: new_link.path.clone(),
            original_url: new_link.original_url,
            title: new_link.title,
            password_digest: new_link.password_digest,
            require_confirm: new_link.require_confirm,
            enable_intermediate: new_link.enable_intermediate,
            expires_at: new_link.expires_at,
            views: 0,
            created_at: Utc::now(),
        };

        self.links.insert(new_link.path, link.clone());
        Ok(link)
    }

    async fn find_by_path(&self, path: &str) -> Result<Option<ShortLink>, AppError> {
        Ok(self.links.get(path).map(|l| l.clone()))
    }
}

/// In-memory rule store.
#[derive(Default)]
pub struct InMemoryDomainRuleRepository {
    rules: DashMap<i64, DomainRule>,
    next_id: AtomicI64,
}

impl InMemoryDomainRuleRepository {
    pub fn new() -> Self {
        Self {
            rules: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl DomainRuleRepository for InMemoryDomainRuleRepository {
    async fn create(&self, rule: NewDomainRule) -> Result<DomainRule, AppError> {
        let duplicate = self.rules.iter().any(|r| {
            r.domain == rule.domain && r.rule_type == rule.rule_type.as_str()
        });
        if duplicate {
            return Err(AppError::conflict(
                "Rule already exists",
                json!({ "domain": rule.domain }),
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = DomainRule {
            id,
            domain: rule.domain,
            rule_type: rule.rule_type.as_str().to_string(),
            active: true,
            created_at: Utc::now(),
        };

        self.rules.insert(id, created.clone());
        Ok(created)
    }

    async fn list_active(&self, mode: SecurityMode) -> Result<Vec<DomainRule>, AppError> {
        let mut rules: Vec<DomainRule> = self
            .rules
            .iter()
            .filter(|r| r.active && r.rule_type == mode.as_str())
            .map(|r| r.clone())
            .collect();
        rules.sort_by_key(|r| r.id);
        Ok(rules)
    }
}

/// In-memory visit log, coupled to a link repository for view counting.
pub struct InMemoryVisitRepository {
    links: Arc<InMemoryLinkRepository>,
    visits: Mutex<Vec<VisitRecord>>,
    next_id: AtomicI64,
}

impl InMemoryVisitRepository {
    pub fn new(links: Arc<InMemoryLinkRepository>) -> Self {
        Self {
            links,
            visits: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Recorded rows, newest last. Test hook.
    pub async fn all_visits(&self) -> Vec<VisitRecord> {
        self.visits.lock().await.clone()
    }
}

#[async_trait]
impl VisitRepository for InMemoryVisitRepository {
    async fn record_link_visit(
        &self,
        link_id: i64,
        visited_at: DateTime<Utc>,
        meta: &VisitMeta,
    ) -> Result<(), AppError> {
        // The visits lock spans row append and counter bump, mirroring the
        // SQL transaction: N concurrent calls yield N rows and N increments.
        let mut visits = self.visits.lock().await;

        let mut found = false;
        for mut link in self.links.links.iter_mut() {
            if link.id == link_id {
                link.views += 1;
                found = true;
                break;
            }
        }
        if !found {
            return Err(AppError::not_found(
                "Link not found",
                json!({ "link_id": link_id }),
            ));
        }

        visits.push(VisitRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            link_id: Some(link_id),
            target_url: None,
            visited_at,
            referer: meta.referer.clone(),
            user_agent: meta.user_agent.clone(),
            ip: meta.ip.clone(),
        });

        Ok(())
    }

    async fn record_ad_hoc_visit(
        &self,
        target_url: &str,
        visited_at: DateTime<Utc>,
        meta: &VisitMeta,
    ) -> Result<(), AppError> {
        let mut visits = self.visits.lock().await;
        visits.push(VisitRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            link_id: None,
            target_url: Some(target_url.to_string()),
            visited_at,
            referer: meta.referer.clone(),
            user_agent: meta.user_agent.clone(),
            ip: meta.ip.clone(),
        });
        Ok(())
    }

    async fn count_visits(&self, link_id: i64) -> Result<i64, AppError> {
        let visits = self.visits.lock().await;
        Ok(visits.iter().filter(|v| v.link_id == Some(link_id)).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemoryLinkRepository::new();
        repo.create(NewLink::plain("promo", "https://example.com"))
            .await
            .unwrap();

        let link = repo.find_by_path("promo").await.unwrap().unwrap();
        assert_eq!(link.original_url, "https://example.com");
        assert!(repo.find_by_path("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let repo = InMemoryLinkRepository::new();
        repo.create(NewLink::plain("promo", "https://example.com"))
            .await
            .unwrap();

        let err = repo
            .create(NewLink::plain("promo", "https://other.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_rules_filtered_by_mode() {
        let repo = InMemoryDomainRuleRepository::new();
        repo.create(NewDomainRule::new("a.com", SecurityMode::Blacklist))
            .await
            .unwrap();
        repo.create(NewDomainRule::new("b.com", SecurityMode::Whitelist))
            .await
            .unwrap();

        let active = repo.list_active(SecurityMode::Blacklist).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].domain, "a.com");
    }

    #[tokio::test]
    async fn test_concurrent_visits_count_exactly() {
        let links = Arc::new(InMemoryLinkRepository::new());
        let link = links
            .create(NewLink::plain("promo", "https://example.com"))
            .await
            .unwrap();
        let visits = Arc::new(InMemoryVisitRepository::new(links.clone()));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let visits = visits.clone();
            let id = link.id;
            handles.push(tokio::spawn(async move {
                visits
                    .record_link_visit(id, Utc::now(), &VisitMeta::default())
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(visits.count_visits(link.id).await.unwrap(), 20);
        let stored = links.find_by_path("promo").await.unwrap().unwrap();
        assert_eq!(stored.views, 20);
    }

    #[tokio::test]
    async fn test_ad_hoc_visit_has_no_link() {
        let links = Arc::new(InMemoryLinkRepository::new());
        let visits = InMemoryVisitRepository::new(links);

        visits
            .record_ad_hoc_visit("https://example.com", Utc::now(), &VisitMeta::default())
            .await
            .unwrap();

        let all = visits.all_visits().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].link_id, None);
        assert_eq!(all[0].target_url.as_deref(), Some("https://example.com"));
    }
}

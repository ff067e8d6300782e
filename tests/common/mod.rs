#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use linkgate::application::services::{
    CaptchaVerifier, LinkResolver, MetadataService, NullCaptchaVerifier, PolicyService,
};
use linkgate::domain::entities::{NewDomainRule, NewLink, SecurityMode};
use linkgate::domain::repositories::{DomainRuleRepository, LinkRepository};
use linkgate::domain::visit_event::VisitEvent;
use linkgate::infrastructure::cache::{QueryCache, ResponseCache};
use linkgate::infrastructure::persistence::{
    InMemoryDomainRuleRepository, InMemoryLinkRepository, InMemoryVisitRepository,
};
use linkgate::state::{AppState, RedirectSettings};
use linkgate::utils::audit::AuditLog;
use linkgate::utils::password;
use linkgate::utils::translate::default_translator;

pub const TEST_SECRET: &str = "test-signing-secret";

/// Handles the tests keep on the state's backing stores.
pub struct TestHandles {
    pub links: Arc<InMemoryLinkRepository>,
    pub rules: Arc<InMemoryDomainRuleRepository>,
    pub visits: Arc<InMemoryVisitRepository>,
    pub visit_rx: mpsc::Receiver<VisitEvent>,
}

pub fn create_test_state(mode: SecurityMode) -> (AppState, TestHandles) {
    create_test_state_with_captcha(mode, Arc::new(NullCaptchaVerifier::new()))
}

pub fn create_test_state_with_captcha(
    mode: SecurityMode,
    captcha: Arc<dyn CaptchaVerifier>,
) -> (AppState, TestHandles) {
    let links = Arc::new(InMemoryLinkRepository::new());
    let rules = Arc::new(InMemoryDomainRuleRepository::new());
    let visits = Arc::new(InMemoryVisitRepository::new(links.clone()));

    let audit = AuditLog::new();
    let (visit_tx, visit_rx) = mpsc::channel(100);

    let resolver = Arc::new(LinkResolver::new(
        links.clone(),
        visits.clone(),
        Arc::new(QueryCache::new()),
        Duration::from_secs(30),
        Duration::from_secs(2),
        audit.clone(),
    ));

    let policy = Arc::new(PolicyService::new(
        rules.clone(),
        Arc::new(QueryCache::new()),
        mode,
        true,
        Duration::from_secs(30),
        audit.clone(),
    ));

    let metadata = Arc::new(
        MetadataService::new(Duration::from_millis(200), Duration::from_secs(2))
            .expect("metadata client"),
    );

    let state = AppState {
        resolver,
        policy,
        captcha,
        metadata,
        response_cache: Arc::new(ResponseCache::new(64)),
        visit_sender: visit_tx,
        db: None,
        settings: Arc::new(RedirectSettings {
            wait_seconds: 5,
            block_close_seconds: 3,
            password_signing_secret: TEST_SECRET.to_string(),
            response_cache_ttl: Duration::from_secs(15),
            response_cache_stale: Duration::from_secs(30),
        }),
        translator: default_translator(),
        audit,
    };

    (
        state,
        TestHandles {
            links,
            rules,
            visits,
            visit_rx,
        },
    )
}

pub async fn create_test_link(links: &InMemoryLinkRepository, path: &str, url: &str) -> i64 {
    links.create(NewLink::plain(path, url)).await.unwrap().id
}

pub async fn create_password_link(
    links: &InMemoryLinkRepository,
    path: &str,
    url: &str,
    plain_password: &str,
) -> i64 {
    let mut link = NewLink::plain(path, url);
    link.password_digest = Some(password::digest(TEST_SECRET, plain_password));
    links.create(link).await.unwrap().id
}

pub async fn create_confirm_link(links: &InMemoryLinkRepository, path: &str, url: &str) -> i64 {
    let mut link = NewLink::plain(path, url);
    link.require_confirm = true;
    links.create(link).await.unwrap().id
}

pub async fn create_intermediate_link(
    links: &InMemoryLinkRepository,
    path: &str,
    url: &str,
) -> i64 {
    let mut link = NewLink::plain(path, url);
    link.enable_intermediate = true;
    links.create(link).await.unwrap().id
}

pub async fn create_expiring_link(
    links: &InMemoryLinkRepository,
    path: &str,
    url: &str,
    expires_at: DateTime<Utc>,
) -> i64 {
    let mut link = NewLink::plain(path, url);
    link.expires_at = Some(expires_at);
    links.create(link).await.unwrap().id
}

pub async fn create_rule(rules: &InMemoryDomainRuleRepository, domain: &str, mode: SecurityMode) {
    rules
        .create(NewDomainRule::new(domain, mode))
        .await
        .unwrap();
}

/// Verifier that accepts exactly one token value.
pub struct StaticCaptchaVerifier {
    accepted: String,
}

impl StaticCaptchaVerifier {
    pub fn accepting(token: &str) -> Self {
        Self {
            accepted: token.to_string(),
        }
    }
}

#[async_trait]
impl CaptchaVerifier for StaticCaptchaVerifier {
    fn enabled(&self) -> bool {
        true
    }

    async fn verify(&self, token: &str) -> bool {
        token == self.accepted
    }
}

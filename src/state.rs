//! Shared application state.
//!
//! All services are constructed once at startup and injected by reference;
//! there are no module-level singletons, so tests build isolated instances.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{CaptchaVerifier, LinkResolver, MetadataService, PolicyService};
use crate::domain::visit_event::VisitEvent;
use crate::infrastructure::cache::ResponseCache;
use crate::infrastructure::db::Db;
use crate::utils::audit::AuditLog;
use crate::utils::translate::Translator;

/// Per-visit behavior knobs shared by the handlers and the engine.
#[derive(Debug, Clone)]
pub struct RedirectSettings {
    pub wait_seconds: u32,
    pub block_close_seconds: u32,
    pub password_signing_secret: String,
    pub response_cache_ttl: std::time::Duration,
    pub response_cache_stale: std::time::Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<LinkResolver>,
    pub policy: Arc<PolicyService>,
    pub captcha: Arc<dyn CaptchaVerifier>,
    pub metadata: Arc<MetadataService>,
    pub response_cache: Arc<ResponseCache>,
    pub visit_sender: mpsc::Sender<VisitEvent>,
    /// Absent when running over in-memory repositories (tests, local runs).
    pub db: Option<Arc<Db>>,
    pub settings: Arc<RedirectSettings>,
    pub translator: Translator,
    pub audit: AuditLog,
}

//! Audit logging collaborator.
//!
//! Thin wrapper over tracing with a dedicated `audit` target so security and
//! admin events can be filtered and shipped separately from application logs.

use tracing::{error, info, warn};

/// Audit event sink. Cloneable and injected wherever decisions need a trail.
#[derive(Debug, Clone, Default)]
pub struct AuditLog;

impl AuditLog {
    pub fn new() -> Self {
        Self
    }

    /// Security-relevant decision (blocked visit, policy fail-open, failed
    /// password attempt).
    pub fn security(&self, action: &str, detail: &str) {
        warn!(target: "audit", kind = "security", action, detail);
    }

    /// Operational failure worth an audit row (visit recording gave up,
    /// CAPTCHA backend unreachable).
    pub fn error(&self, action: &str, detail: &str) {
        error!(target: "audit", kind = "error", action, detail);
    }

    /// Administrative change (rule created, mode switched).
    pub fn admin(&self, action: &str, detail: &str) {
        info!(target: "audit", kind = "admin", action, detail);
    }
}

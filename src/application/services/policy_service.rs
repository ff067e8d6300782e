//! Domain policy evaluation service.

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::domain::entities::{DomainRule, SecurityMode};
use crate::domain::policy::{self, PolicyDecision};
use crate::domain::repositories::DomainRuleRepository;
use crate::infrastructure::cache::QueryCache;
use crate::utils::audit::AuditLog;

/// Cache tag for rule list keys.
pub const RULES_TAG: &str = "domain-rules";

/// Wraps the pure matcher with rule loading, caching, and audit logging.
///
/// When the rule load itself fails, the decision follows the configured
/// failure policy. The default is fail-open, matching the original behavior
/// of this service family; the choice is explicit, logged as a security
/// event, and flippable via `POLICY_FAIL_OPEN`.
pub struct PolicyService {
    rules: Arc<dyn DomainRuleRepository>,
    cache: Arc<QueryCache<Vec<DomainRule>>>,
    mode: SecurityMode,
    fail_open: bool,
    cache_ttl: Duration,
    audit: AuditLog,
}

impl PolicyService {
    pub fn new(
        rules: Arc<dyn DomainRuleRepository>,
        cache: Arc<QueryCache<Vec<DomainRule>>>,
        mode: SecurityMode,
        fail_open: bool,
        cache_ttl: Duration,
        audit: AuditLog,
    ) -> Self {
        Self {
            rules,
            cache,
            mode,
            fail_open,
            cache_ttl,
            audit,
        }
    }

    pub fn mode(&self) -> SecurityMode {
        self.mode
    }

    /// Evaluates a target URL against the active rules for the current mode.
    pub async fn evaluate(&self, target_url: &str) -> PolicyDecision {
        let key = format!("rules:{}", self.mode);
        let loaded = self
            .cache
            .get_or_load(&key, self.cache_ttl, &[RULES_TAG], || async {
                self.rules.list_active(self.mode).await.map(Some)
            })
            .await;

        let rules = match loaded {
            Ok(rules) => rules.unwrap_or_default(),
            Err(e) => {
                warn!("domain rule load failed: {e:?}");
                self.audit.security(
                    "policy_check_failed",
                    &format!("fail_{} applied for {target_url}", if self.fail_open { "open" } else { "closed" }),
                );
                return PolicyDecision {
                    allowed: self.fail_open,
                    reason: "policy check failed".to_string(),
                    domain: String::new(),
                };
            }
        };

        let decision = policy::evaluate(target_url, self.mode, &rules);
        if !decision.allowed {
            metrics::counter!("visits_blocked_total").increment(1);
            self.audit.security(
                "visit_blocked",
                &format!("{} ({})", decision.domain, decision.reason),
            );
        }
        decision
    }

    /// Drops cached rule lists. Called when rules change.
    pub fn invalidate_rules(&self) {
        self.cache.invalidate_tag(RULES_TAG);
    }
}

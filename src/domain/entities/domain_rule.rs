//! Domain policy rule entity and the security mode it belongs to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which policy the service currently enforces.
///
/// Rules of the inactive mode stay in storage but are never evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    Whitelist,
    Blacklist,
}

impl SecurityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist",
            Self::Blacklist => "blacklist",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "whitelist" => Some(Self::Whitelist),
            "blacklist" => Some(Self::Blacklist),
            _ => None,
        }
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single allow/deny rule.
///
/// `domain` is stored normalized to lowercase in one of three forms:
/// `exact.com`, `sub.exact.com`, or `*.exact.com`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DomainRule {
    pub id: i64,
    pub domain: String,
    pub rule_type: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl DomainRule {
    pub fn mode(&self) -> Option<SecurityMode> {
        SecurityMode::parse(&self.rule_type)
    }
}

/// Input data for creating a rule. The domain is normalized on construction.
#[derive(Debug, Clone)]
pub struct NewDomainRule {
    pub domain: String,
    pub rule_type: SecurityMode,
}

impl NewDomainRule {
    pub fn new(domain: impl Into<String>, rule_type: SecurityMode) -> Self {
        Self {
            domain: domain.into().trim().to_ascii_lowercase(),
            rule_type,
        }
    }
}

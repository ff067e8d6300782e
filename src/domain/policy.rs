//! Domain policy matcher.
//!
//! Pure evaluation of a target URL against the active rule set for the
//! current security mode. Callers own logging and persistence; this module
//! has no side effects.

use crate::domain::entities::{DomainRule, SecurityMode};
use url::Url;

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub reason: String,
    pub domain: String,
}

impl PolicyDecision {
    fn denied(reason: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            domain: domain.into(),
        }
    }

    fn allowed(reason: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            domain: domain.into(),
        }
    }
}

/// How a rule matched, in precedence order. First match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchKind {
    Exact,
    Subdomain,
    Wildcard,
}

/// Evaluates `target_url` against the active rules for `mode`.
///
/// Match precedence per rule: exact, subdomain, wildcard.
///
/// - A bare rule `example.com` matches `example.com` and any host under it
///   (`api.example.com`). The relation is asymmetric: a rule for
///   `api.example.com` never matches `example.com`.
/// - A wildcard rule `*.example.com` matches one or more label levels under
///   the base (`a.example.com`, `a.b.example.com`) but not the bare base.
///
/// Whitelist mode allows iff some rule matched; blacklist mode allows iff
/// none did. An unparseable URL is always denied.
pub fn evaluate(target_url: &str, mode: SecurityMode, rules: &[DomainRule]) -> PolicyDecision {
    let hostname = match extract_hostname(target_url) {
        Some(h) => h,
        None => return PolicyDecision::denied("invalid URL", ""),
    };

    let active: Vec<&DomainRule> = rules
        .iter()
        .filter(|r| r.active && r.mode() == Some(mode))
        .collect();

    // Exact matches outrank subdomain matches, which outrank wildcards,
    // regardless of rule ordering in storage.
    let matched = [MatchKind::Exact, MatchKind::Subdomain, MatchKind::Wildcard]
        .into_iter()
        .find_map(|kind| {
            active
                .iter()
                .find(|r| match_rule(&r.domain, &hostname) == Some(kind))
                .map(|r| (*r, kind))
        });

    match (mode, matched) {
        (SecurityMode::Whitelist, Some((rule, kind))) => PolicyDecision::allowed(
            format!("allowed by {} rule {}", describe(kind), rule.domain),
            hostname,
        ),
        (SecurityMode::Whitelist, None) => {
            PolicyDecision::denied("no whitelist rule matched", hostname)
        }
        (SecurityMode::Blacklist, Some((rule, kind))) => PolicyDecision::denied(
            format!("blocked by {} rule {}", describe(kind), rule.domain),
            hostname,
        ),
        (SecurityMode::Blacklist, None) => {
            PolicyDecision::allowed("no blacklist rule matched", hostname)
        }
    }
}

/// Parses the URL and returns its lowercased hostname.
fn extract_hostname(target_url: &str) -> Option<String> {
    let url = Url::parse(target_url).ok()?;
    url.host_str().map(|h| h.to_ascii_lowercase())
}

fn match_rule(rule_domain: &str, hostname: &str) -> Option<MatchKind> {
    if rule_domain == hostname {
        return Some(MatchKind::Exact);
    }

    if let Some(base) = rule_domain.strip_prefix("*.") {
        // Wildcard never matches the bare base domain.
        if hostname.len() > base.len() && hostname.ends_with(base) {
            let prefix = &hostname[..hostname.len() - base.len()];
            if prefix.ends_with('.') && prefix.len() > 1 {
                return Some(MatchKind::Wildcard);
            }
        }
        return None;
    }

    if hostname.len() > rule_domain.len() + 1
        && hostname.ends_with(rule_domain)
        && hostname.as_bytes()[hostname.len() - rule_domain.len() - 1] == b'.'
    {
        return Some(MatchKind::Subdomain);
    }

    None
}

fn describe(kind: MatchKind) -> &'static str {
    match kind {
        MatchKind::Exact => "exact",
        MatchKind::Subdomain => "subdomain",
        MatchKind::Wildcard => "wildcard",
    }
}

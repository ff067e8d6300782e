//! Short link entity: a slug mapped to a target URL with its gating flags.

use chrono::{DateTime, Utc};

/// A stored short link.
///
/// `password_digest` holds a keyed HMAC of the visit password; the plaintext
/// is never stored. Gating flags (`require_confirm`, `enable_intermediate`)
/// plus `expires_at` drive the redirect decision for every visit.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShortLink {
    pub id: i64,
    pub path: String,
    pub original_url: String,
    pub title: Option<String>,
    pub password_digest: Option<String>,
    pub require_confirm: bool,
    pub enable_intermediate: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    pub fn has_password(&self) -> bool {
        self.password_digest.is_some()
    }

    /// Expiry is always evaluated against the caller's clock, never cached.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Input data for creating a link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub path: String,
    pub original_url: String,
    pub title: Option<String>,
    pub password_digest: Option<String>,
    pub require_confirm: bool,
    pub enable_intermediate: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewLink {
    /// A plain link with no gating, for tests and seeding.
    pub fn plain(path: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            original_url: original_url.into(),
            title: None,
            password_digest: None,
            require_confirm: false,
            enable_intermediate: false,
            expires_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn link_with_expiry(expires_at: Option<DateTime<Utc>>) -> ShortLink {
        ShortLink {
            id: 1,
            path: "promo".to_string(),
            original_url: "https://example.com".to_string(),
            title: None,
            password_digest: None,
            require_confirm: false,
            enable_intermediate: false,
            expires_at,
            views: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_expiry_never_expires() {
        assert!(!link_with_expiry(None).is_expired());
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let link = link_with_expiry(Some(Utc::now() - Duration::seconds(1)));
        assert!(link.is_expired());
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let link = link_with_expiry(Some(now));
        assert!(link.is_expired_at(now));
    }

    #[test]
    fn test_future_expiry_is_active() {
        let link = link_with_expiry(Some(Utc::now() + Duration::hours(1)));
        assert!(!link.is_expired());
    }

    #[test]
    fn test_has_password() {
        let mut link = link_with_expiry(None);
        assert!(!link.has_password());
        link.password_digest = Some("ab12".to_string());
        assert!(link.has_password());
    }
}

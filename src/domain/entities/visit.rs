//! Visit log entities.

use chrono::{DateTime, Utc};

/// A recorded visit row.
///
/// Stored-link visits carry `link_id`; ad-hoc `/to` visits carry
/// `target_url` instead.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VisitRecord {
    pub id: i64,
    pub link_id: Option<i64>,
    pub target_url: Option<String>,
    pub visited_at: DateTime<Utc>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

/// Request metadata attached to a visit.
#[derive(Debug, Clone, Default)]
pub struct VisitMeta {
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

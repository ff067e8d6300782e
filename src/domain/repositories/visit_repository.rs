//! Repository trait for the visit log.

use crate::domain::entities::VisitMeta;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for recording visits.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Records a stored-link visit: inserts the log row and increments the
    /// link's view counter in one atomic transaction. N concurrent calls for
    /// the same link produce exactly N increments and N rows.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors; callers treat the
    /// whole operation as best-effort.
    async fn record_link_visit(
        &self,
        link_id: i64,
        visited_at: DateTime<Utc>,
        meta: &VisitMeta,
    ) -> Result<(), AppError>;

    /// Records an ad-hoc `/to` visit; no view counter is involved.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn record_ad_hoc_visit(
        &self,
        target_url: &str,
        visited_at: DateTime<Utc>,
        meta: &VisitMeta,
    ) -> Result<(), AppError>;

    /// Total views recorded for a link. Used by tests and the stats surface.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_visits(&self, link_id: i64) -> Result<i64, AppError>;
}

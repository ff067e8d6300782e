//! Visit events queued for asynchronous recording.

use crate::domain::entities::VisitMeta;
use chrono::{DateTime, Utc};

/// One visit, queued on the bounded channel for the background worker.
///
/// Recording must never block or fail a redirect: handlers `try_send` and
/// drop the event when the queue is full.
#[derive(Debug, Clone)]
pub enum VisitEvent {
    /// A stored short-link visit, counted against the link's views.
    Link {
        path: String,
        meta: VisitMeta,
        visited_at: DateTime<Utc>,
    },
    /// An ad-hoc `/to` visit; there is no link row to count against.
    AdHoc {
        target_url: String,
        meta: VisitMeta,
        visited_at: DateTime<Utc>,
    },
}

impl VisitEvent {
    pub fn link(path: impl Into<String>, meta: VisitMeta) -> Self {
        Self::Link {
            path: path.into(),
            meta,
            visited_at: Utc::now(),
        }
    }

    pub fn ad_hoc(target_url: impl Into<String>, meta: VisitMeta) -> Self {
        Self::AdHoc {
            target_url: target_url.into(),
            meta,
            visited_at: Utc::now(),
        }
    }
}

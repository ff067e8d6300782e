//! DTOs for the stored-link visit endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `GET /visit/{path}` response: everything the interstitial needs to drive
/// the decision flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitInfoResponse {
    pub id: i64,
    pub original_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub has_password: bool,
    pub require_confirm: bool,
    pub enable_intermediate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub captcha_enabled: bool,
    pub wait_seconds: u32,
}

/// `POST /visit/{path}` request: password unlock or confirm-proceed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisitUnlockRequest {
    #[serde(default)]
    pub password: Option<String>,
    /// True when a pre-filled password is submitted automatically.
    #[serde(default)]
    pub is_auto_fill: bool,
}

/// `POST /visit/{path}` success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitUnlockResponse {
    pub original_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

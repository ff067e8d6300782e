//! DTOs for the ad-hoc `/to` redirect endpoint.

use serde::{Deserialize, Serialize};

/// `GET /to` query parameters. `token` wins entirely when both are present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToQuery {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// Redirect kind fallback for the raw `url` form; a token carries its
    /// own.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// `GET /to` decision payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToResponse {
    pub original_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub enable_intermediate: bool,
    pub msg: String,
    pub captcha_enabled: bool,
}

/// `POST /track-to-visit` request.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackToVisitRequest {
    pub url: String,
}

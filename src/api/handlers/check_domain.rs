//! Handler for explicit domain policy checks.

use axum::{Json, extract::State};
use serde_json::json;
use url::Url;
use validator::Validate;

use crate::api::dto::check_domain::{CheckDomainRequest, CheckDomainResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Evaluates a URL against the active domain policy.
///
/// # Endpoint
///
/// `POST /check-domain` with `{url}`
///
/// # Response Codes
///
/// - **200 OK**: `{allowed, reason, domain, security_mode}`
/// - **400 Bad Request**: missing or unparseable URL
pub async fn check_domain_handler(
    State(state): State<AppState>,
    Json(body): Json<CheckDomainRequest>,
) -> Result<Json<CheckDomainResponse>, AppError> {
    body.validate()
        .map_err(|e| AppError::bad_request("Invalid request", json!({ "errors": e.to_string() })))?;

    if Url::parse(&body.url).is_err() {
        return Err(AppError::bad_request(
            "Invalid URL",
            json!({ "url": body.url }),
        ));
    }

    let decision = state.policy.evaluate(&body.url).await;

    Ok(Json(CheckDomainResponse {
        allowed: decision.allowed,
        reason: decision.reason,
        domain: decision.domain,
        security_mode: state.policy.mode().to_string(),
    }))
}

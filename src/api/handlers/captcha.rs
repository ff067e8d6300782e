//! Handler for server-side CAPTCHA verification.

use axum::{Json, extract::State};
use serde_json::json;
use validator::Validate;

use crate::api::dto::captcha::{VerifyCaptchaRequest, VerifyCaptchaResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Verifies a CAPTCHA challenge token against the provider.
///
/// Clients must call this before the engine treats the CAPTCHA as verified;
/// a client-asserted flag alone is never trusted. Verification timeouts and
/// provider errors fail the check, re-surfacing the challenge.
///
/// # Endpoint
///
/// `POST /verify-captcha` with `{token}`
///
/// # Response Codes
///
/// - **200 OK**: `{verified: true}`
/// - **401 Unauthorized**: challenge rejected, expired, or unverifiable
pub async fn verify_captcha_handler(
    State(state): State<AppState>,
    Json(body): Json<VerifyCaptchaRequest>,
) -> Result<Json<VerifyCaptchaResponse>, AppError> {
    body.validate()
        .map_err(|e| AppError::bad_request("Invalid request", json!({ "errors": e.to_string() })))?;

    if state.captcha.verify(&body.token).await {
        Ok(Json(VerifyCaptchaResponse { verified: true }))
    } else {
        state.audit.security("captcha_failed", "challenge rejected");
        Err(AppError::unauthorized(
            "CAPTCHA verification failed",
            json!({ "field": "token" }),
        ))
    }
}

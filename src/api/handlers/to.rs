//! Handler for ad-hoc token-encoded redirects.

use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::json;
use url::Url;

use crate::api::dto::to::{ToQuery, ToResponse};
use crate::domain::token::{self, RedirectKind, RedirectToken};
use crate::error::AppError;
use crate::state::AppState;

/// Resolves an ad-hoc redirect into a decision payload.
///
/// # Endpoint
///
/// `GET /to?url=&token=&type=`
///
/// A Base64 token takes precedence entirely over the raw `url` fallback; the
/// `type` query parameter only applies to the raw form. `href` kinds skip the
/// title lookup; `auto`/`confirm` behave like a stored link's
/// `enable_intermediate`/`require_confirm` flags.
///
/// # Response Codes
///
/// - **200 OK**: decision payload
/// - **400 Bad Request**: neither parameter given, malformed token, or
///   invalid raw URL
/// - **403 Forbidden**: target blocked by domain policy (URL hidden)
pub async fn to_handler(
    Query(query): Query<ToQuery>,
    State(state): State<AppState>,
) -> Result<Json<ToResponse>, AppError> {
    let token = decode_request(&query)?;

    let policy = state.policy.evaluate(&token.url).await;
    if !policy.allowed {
        return Err(AppError::forbidden(
            "Target blocked by domain policy",
            json!({
                "reason": policy.reason,
                "close_seconds": state.settings.block_close_seconds,
            }),
        ));
    }

    // href redirects immediately: no metadata fetch, no interstitial.
    let title = match token.kind {
        RedirectKind::Href => token.title.clone(),
        _ => match token.title.clone() {
            Some(title) => Some(title),
            None => state.metadata.title(&token.url).await,
        },
    };

    let msg = if token.msg == token::DEFAULT_MSG {
        (state.translator)(token::DEFAULT_MSG, &[])
    } else {
        token.msg.clone()
    };

    Ok(Json(ToResponse {
        original_url: token.url,
        title,
        kind: token.kind.as_str().to_string(),
        enable_intermediate: token.kind == RedirectKind::Auto,
        msg,
        // Per-token CAPTCHA flag, independent of the global setting.
        captcha_enabled: token.turnstile,
    }))
}

/// Applies the token-over-url precedence and validates the chosen source.
fn decode_request(query: &ToQuery) -> Result<RedirectToken, AppError> {
    if let Some(raw_token) = query.token.as_deref().filter(|t| !t.is_empty()) {
        return token::decode(raw_token).map_err(|e| {
            AppError::bad_request("Malformed redirect token", json!({ "reason": e.to_string() }))
        });
    }

    let url = query
        .url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            AppError::bad_request(
                "Either 'token' or 'url' must be provided",
                json!({ "fields": ["token", "url"] }),
            )
        })?;

    if Url::parse(url).is_err() {
        return Err(AppError::bad_request(
            "Invalid redirect URL",
            json!({ "url": url }),
        ));
    }

    let mut token = RedirectToken::new(url);
    if let Some(kind) = query.kind.as_deref() {
        token.kind = RedirectKind::parse(kind).ok_or_else(|| {
            AppError::bad_request(
                "Invalid redirect type",
                json!({ "type": kind, "expected": ["href", "auto", "confirm"] }),
            )
        })?;
    }

    Ok(token)
}

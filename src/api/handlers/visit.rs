//! Handlers for stored-link visits: decision info and password/confirm
//! unlock.

use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use serde_json::json;
use tracing::{debug, error};

use crate::api::dto::visit::{VisitInfoResponse, VisitUnlockRequest, VisitUnlockResponse};
use crate::api::handlers::{apply_effects, engine_for_link, visit_meta};
use crate::domain::redirect::{EngineEvent, EngineState};
use crate::domain::visit_event::VisitEvent;
use crate::error::AppError;
use crate::infrastructure::cache::{CachedResponse, Freshness, ResponseKey};
use crate::state::AppState;
use crate::utils::password;

/// Internal header carrying the link expiry so a cached payload can be
/// re-checked against the clock before it is served.
const EXPIRES_HEADER: &str = "x-link-expires-at";

/// Returns the decision payload for a stored link's interstitial.
///
/// # Endpoint
///
/// `GET /visit/{path}`
///
/// # Response Codes
///
/// - **200 OK**: decision payload (with ETag; supports If-None-Match → 304)
/// - **404 Not Found**: unknown path
/// - **410 Gone**: the link is past its expiry
/// - **403 Forbidden**: target blocked by domain policy (URL and title
///   hidden; body carries the reason and the auto-close countdown)
///
/// # Caching
///
/// Responses are served through the response cache with a short TTL and a
/// stale-while-revalidate window. Expiry is never cached past its value: a
/// cached payload whose link has since expired is dropped and rebuilt.
pub async fn visit_info_handler(
    Path(path): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let key = ResponseKey::get("GET", format!("/visit/{path}"));

    if let Some((cached, freshness)) = state.response_cache.get(&key) {
        if cached_still_valid(&cached) {
            if let Freshness::Stale { revalidate: true } = freshness {
                debug!(path, "serving stale visit payload, refreshing");
                let state = state.clone();
                let path = path.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    if let Err(e) = refresh_visit_info(&state, &path, key).await {
                        debug!(path, "background revalidation failed: {e:?}");
                    }
                });
            }
            return Ok(serve_cached(&cached, &headers));
        }
        state.response_cache.invalidate(&key);
    }

    let info = build_visit_info(&state, &path).await?;
    let cached = store_visit_info(&state, key, &info);
    Ok(serve_cached(&cached, &headers))
}

/// Unlocks a gated link: password verification or confirm-proceed.
///
/// # Endpoint
///
/// `POST /visit/{path}` with `{password?, is_auto_fill?}`
///
/// # Response Codes
///
/// - **200 OK**: `{original_url, title?}`; the visit is recorded
/// - **401 Unauthorized**: wrong or missing password
/// - **404 Not Found** / **410 Gone** / **403 Forbidden**: as for GET
pub async fn visit_unlock_handler(
    Path(path): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<VisitUnlockRequest>,
) -> Result<Json<VisitUnlockResponse>, AppError> {
    let link = state.resolver.resolve(&path).await?;
    let meta = visit_meta(&headers);

    // The CAPTCHA gate has its own server-side endpoint; password and
    // confirmation are decided here.
    let mut engine = engine_for_link(&state, &link, false).await;
    let effects = engine.start();
    apply_effects(&state, effects, || VisitEvent::link(path.as_str(), meta.clone()));

    loop {
        match engine.state().clone() {
            EngineState::Expired => {
                return Err(AppError::gone(
                    "Short link has expired",
                    json!({ "path": path }),
                ));
            }
            EngineState::Blocked { reason } => {
                return Err(AppError::forbidden(
                    "Target blocked by domain policy",
                    json!({
                        "reason": reason,
                        "close_seconds": state.settings.block_close_seconds,
                    }),
                ));
            }
            EngineState::AwaitingPassword => {
                let candidate = body.password.as_deref().ok_or_else(|| {
                    AppError::unauthorized("Password required", json!({ "field": "password" }))
                })?;
                let digest = link.password_digest.as_deref().unwrap_or_default();

                if password::verify(&state.settings.password_signing_secret, candidate, digest) {
                    let effects = engine.handle(EngineEvent::PasswordAccepted);
                    apply_effects(&state, effects, || {
                        VisitEvent::link(path.as_str(), meta.clone())
                    });
                } else {
                    let effects = engine.handle(EngineEvent::PasswordRejected);
                    apply_effects(&state, effects, || {
                        VisitEvent::link(path.as_str(), meta.clone())
                    });
                    state.audit.security(
                        "password_failed",
                        &format!("path {path} (auto_fill: {})", body.is_auto_fill),
                    );
                    return Err(AppError::unauthorized(
                        "Invalid password",
                        json!({
                            "field": "password",
                            "is_auto_fill": body.is_auto_fill,
                            "attempts": engine.password_errors(),
                        }),
                    ));
                }
            }
            EngineState::AwaitingConfirm => {
                let effects = engine.handle(EngineEvent::Confirm);
                apply_effects(&state, effects, || {
                    VisitEvent::link(path.as_str(), meta.clone())
                });
            }
            EngineState::Redirected | EngineState::CountingDown { .. } => {
                return Ok(Json(VisitUnlockResponse {
                    original_url: link.original_url.clone(),
                    title: link.title.clone(),
                }));
            }
            other => {
                error!(path, ?other, "unlock reached unexpected engine state");
                return Err(AppError::internal("Unexpected visit state", json!({})));
            }
        }
    }
}

/// Builds the 200 payload, or the 404/410/403 error, for a path.
async fn build_visit_info(state: &AppState, path: &str) -> Result<VisitInfoResponse, AppError> {
    let link = state.resolver.resolve(path).await?;

    let mut engine = engine_for_link(state, &link, state.captcha.enabled()).await;
    let effects = engine.start();
    // Informational endpoint: warm the target but never record a visit here.
    apply_effects(state, effects_without_record(effects), || {
        VisitEvent::link(path, Default::default())
    });

    match engine.state() {
        EngineState::Expired => Err(AppError::gone(
            "Short link has expired",
            json!({ "path": path }),
        )),
        EngineState::Blocked { reason } => Err(AppError::forbidden(
            "Target blocked by domain policy",
            json!({
                "reason": reason,
                "close_seconds": state.settings.block_close_seconds,
            }),
        )),
        _ => Ok(VisitInfoResponse {
            id: link.id,
            original_url: link.original_url.clone(),
            title: link.title.clone(),
            has_password: link.has_password(),
            require_confirm: link.require_confirm,
            enable_intermediate: link.enable_intermediate,
            expires_at: link.expires_at,
            captcha_enabled: state.captcha.enabled(),
            wait_seconds: state.settings.wait_seconds,
        }),
    }
}

fn effects_without_record(
    effects: Vec<crate::domain::redirect::Effect>,
) -> Vec<crate::domain::redirect::Effect> {
    use crate::domain::redirect::Effect;
    effects
        .into_iter()
        .filter(|e| !matches!(e, Effect::RecordVisit))
        .collect()
}

fn store_visit_info(
    state: &AppState,
    key: ResponseKey,
    info: &VisitInfoResponse,
) -> CachedResponse {
    // VisitInfoResponse always serializes.
    let body = serde_json::to_vec(info).expect("visit payload serialization");

    let mut headers = vec![(
        header::CONTENT_TYPE.to_string(),
        "application/json".to_string(),
    )];
    if let Some(expires_at) = info.expires_at {
        headers.push((EXPIRES_HEADER.to_string(), expires_at.to_rfc3339()));
    }

    state.response_cache.put(
        key,
        StatusCode::OK.as_u16(),
        headers,
        body,
        state.settings.response_cache_ttl,
        state.settings.response_cache_stale,
        &[crate::application::services::LINKS_TAG],
    )
}

async fn refresh_visit_info(
    state: &AppState,
    path: &str,
    key: ResponseKey,
) -> Result<(), AppError> {
    match build_visit_info(state, path).await {
        Ok(info) => {
            store_visit_info(state, key, &info);
            Ok(())
        }
        Err(e) => {
            // The entry no longer represents a servable response.
            state.response_cache.invalidate(&key);
            Err(e)
        }
    }
}

/// A cached payload whose link expired after it was stored must not be
/// served.
fn cached_still_valid(cached: &CachedResponse) -> bool {
    let Some((_, raw)) = cached
        .headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(EXPIRES_HEADER))
    else {
        return true;
    };

    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(expires_at) => chrono::Utc::now() < expires_at.with_timezone(&chrono::Utc),
        Err(_) => false,
    }
}

fn serve_cached(cached: &CachedResponse, request_headers: &HeaderMap) -> Response {
    let if_none_match = request_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());

    if if_none_match == Some(cached.etag.as_str()) {
        return Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(header::ETAG, cached.etag.as_str())
            .body(Body::empty())
            .expect("static response");
    }

    let mut builder = Response::builder()
        .status(cached.status)
        .header(header::ETAG, cached.etag.as_str());
    for (name, value) in &cached.headers {
        if !name.eq_ignore_ascii_case(EXPIRES_HEADER) {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }

    builder
        .body(Body::from(cached.body.clone()))
        .expect("cached response")
}

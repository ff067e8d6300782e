//! API route configuration.

use crate::api::handlers::{
    check_domain_handler, to_handler, track_to_visit_handler, track_visit_handler,
    verify_captcha_handler, visit_info_handler, visit_unlock_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Public visit-flow routes.
///
/// # Endpoints
///
/// - `GET  /visit/{path}`     - Decision payload for a stored link
/// - `POST /visit/{path}`     - Password unlock / confirm-proceed
/// - `POST /check-domain`     - Evaluate a URL against the domain policy
/// - `GET  /to`               - Ad-hoc token or raw-URL redirect decision
/// - `POST /verify-captcha`   - Server-side challenge verification
/// - `POST /track-visit/{path}` - Fire-and-forget visit recording
/// - `POST /track-to-visit`   - Fire-and-forget ad-hoc visit recording
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/visit/{path}",
            get(visit_info_handler).post(visit_unlock_handler),
        )
        .route("/check-domain", post(check_domain_handler))
        .route("/to", get(to_handler))
        .route("/verify-captcha", post(verify_captcha_handler))
        .route("/track-visit/{path}", post(track_visit_handler))
        .route("/track-to-visit", post(track_to_visit_handler))
}

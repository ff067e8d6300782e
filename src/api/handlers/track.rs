//! Fire-and-forget visit tracking handlers.
//!
//! Callers never wait on persistence: events are queued for the background
//! worker and a full queue silently drops them. The 202 acknowledgement only
//! means "accepted for processing".

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::json;
use url::Url;

use crate::api::dto::to::TrackToVisitRequest;
use crate::api::dto::track::TrackAccepted;
use crate::api::handlers::visit_meta;
use crate::domain::visit_event::VisitEvent;
use crate::error::AppError;
use crate::state::AppState;

/// Queues a stored-link visit for recording.
///
/// # Endpoint
///
/// `POST /track-visit/{path}` → 202
pub async fn track_visit_handler(
    Path(path): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<TrackAccepted>) {
    let event = VisitEvent::link(path, visit_meta(&headers));
    let accepted = state.visit_sender.try_send(event).is_ok();
    if !accepted {
        metrics::counter!("visits_dropped_total").increment(1);
    }

    (StatusCode::ACCEPTED, Json(TrackAccepted { accepted }))
}

/// Queues an ad-hoc `/to` visit for recording.
///
/// # Endpoint
///
/// `POST /track-to-visit` with `{url}` → 202
pub async fn track_to_visit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TrackToVisitRequest>,
) -> Result<(StatusCode, Json<TrackAccepted>), AppError> {
    if Url::parse(&body.url).is_err() {
        return Err(AppError::bad_request(
            "Invalid URL",
            json!({ "url": body.url }),
        ));
    }

    let event = VisitEvent::ad_hoc(body.url, visit_meta(&headers));
    let accepted = state.visit_sender.try_send(event).is_ok();
    if !accepted {
        metrics::counter!("visits_dropped_total").increment(1);
    }

    Ok((StatusCode::ACCEPTED, Json(TrackAccepted { accepted })))
}

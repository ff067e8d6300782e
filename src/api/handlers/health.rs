//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: retry-wrapped round-trip query
/// 2. **Visit Queue**: channel open, remaining capacity
/// 3. **Response Cache**: entry count (informational)
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;
    let queue_check = check_visit_queue(&state);
    let cache_check = check_response_cache(&state);

    let all_healthy =
        db_check.status == "ok" && queue_check.status == "ok" && cache_check.status == "ok";

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            visit_queue: queue_check,
            response_cache: cache_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Checks database connectivity with a trivial round-trip.
async fn check_database(state: &AppState) -> CheckStatus {
    match &state.db {
        Some(db) => {
            if db.health_check().await {
                CheckStatus {
                    status: "ok".to_string(),
                    message: Some("Connected".to_string()),
                }
            } else {
                CheckStatus {
                    status: "error".to_string(),
                    message: Some("Database unreachable".to_string()),
                }
            }
        }
        None => CheckStatus {
            status: "ok".to_string(),
            message: Some("In-memory storage".to_string()),
        },
    }
}

/// Checks if the visit tracking queue is operational.
fn check_visit_queue(state: &AppState) -> CheckStatus {
    if state.visit_sender.is_closed() {
        CheckStatus {
            status: "error".to_string(),
            message: Some("Visit queue is closed".to_string()),
        }
    } else {
        CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("Capacity: {}", state.visit_sender.capacity())),
        }
    }
}

fn check_response_cache(state: &AppState) -> CheckStatus {
    CheckStatus {
        status: "ok".to_string(),
        message: Some(format!("Entries: {}", state.response_cache.len())),
    }
}

//! Rate limiting middleware using token bucket algorithm.

use axum::Router;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::SmartIpKeyExtractor,
};

use crate::state::AppState;

/// Applies per-IP rate limiting to the given routes.
///
/// # Limits
///
/// - **Rate**: 2 requests per second
/// - **Burst**: 100 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Key Extraction
///
/// With `behind_proxy` the client IP is read from `X-Forwarded-For` /
/// `X-Real-IP` (only correct behind a trusted reverse proxy); otherwise the
/// socket peer address is used.
pub fn apply(router: Router<AppState>, behind_proxy: bool) -> Router<AppState> {
    if behind_proxy {
        let config = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(2)
                .burst_size(100)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .expect("valid governor config"),
        );
        router.layer(GovernorLayer::new(config))
    } else {
        let config = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(2)
                .burst_size(100)
                .finish()
                .expect("valid governor config"),
        );
        router.layer(GovernorLayer::new(config))
    }
}

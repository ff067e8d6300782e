//! HTTP request handlers.

mod captcha;
mod check_domain;
mod health;
mod to;
mod track;
mod visit;

pub use captcha::verify_captcha_handler;
pub use check_domain::check_domain_handler;
pub use health::health_handler;
pub use to::to_handler;
pub use track::{track_to_visit_handler, track_visit_handler};
pub use visit::{visit_info_handler, visit_unlock_handler};

use axum::http::{HeaderMap, header};

use crate::domain::entities::{ShortLink, VisitMeta};
use crate::domain::redirect::{Effect, RedirectEngine, VisitContext};
use crate::domain::visit_event::VisitEvent;
use crate::state::AppState;

/// Builds visit metadata from request headers.
pub(crate) fn visit_meta(headers: &HeaderMap) -> VisitMeta {
    VisitMeta {
        referer: headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        ip: headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string()),
    }
}

/// Builds the decision engine for a stored link.
///
/// `captcha_enabled` is passed explicitly: the info endpoint advertises the
/// real CAPTCHA gate, while the unlock endpoint treats it as satisfied
/// because challenge tokens are verified by their own endpoint.
pub(crate) async fn engine_for_link(
    state: &AppState,
    link: &ShortLink,
    captcha_enabled: bool,
) -> RedirectEngine {
    let policy = state.policy.evaluate(&link.original_url).await;

    RedirectEngine::new(VisitContext {
        original_url: link.original_url.clone(),
        title: link.title.clone(),
        has_password: link.has_password(),
        require_confirm: link.require_confirm,
        enable_intermediate: link.enable_intermediate,
        expires_at: link.expires_at,
        captcha_enabled,
        wait_seconds: state.settings.wait_seconds,
        block_close_seconds: state.settings.block_close_seconds,
        policy,
        supplied_password: None,
    })
}

/// Executes engine effects on the server side.
///
/// Prefetches are fire-and-forget; `RecordVisit` enqueues the event built by
/// `record_as` and never blocks (a full queue drops the event). Redirect
/// effects are consumed by the caller's response.
pub(crate) fn apply_effects<F>(state: &AppState, effects: Vec<Effect>, record_as: F)
where
    F: Fn() -> VisitEvent,
{
    for effect in effects {
        match effect {
            Effect::Prefetch(url) => state.metadata.prefetch(&url),
            Effect::RecordVisit => {
                let _ = state.visit_sender.try_send(record_as());
            }
            Effect::Redirect(_) | Effect::AutoSubmitPassword(_) | Effect::CloseTab => {}
        }
    }
}

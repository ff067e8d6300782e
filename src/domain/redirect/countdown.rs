//! Timer driver for the decision engine.
//!
//! Exactly one driver owns ticking for a visit. Both countdowns (the main
//! redirect countdown and the blocked-page auto-close) are driven by the same
//! once-per-second loop; cancelling the visit is dropping the future.

use super::engine::{Effect, EngineState, RedirectEngine};
use crate::domain::redirect::engine::EngineEvent;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

/// Drives the engine's timers until no timer remains active, collecting the
/// effects each tick produces.
///
/// Returns immediately when the current state has no timer. The caller
/// executes the returned effects; dropping the future mid-countdown stops
/// the timers without side effects, which is how cancellation-by-navigation
/// is modelled.
pub async fn drive_timers(engine: &mut RedirectEngine) -> Vec<Effect> {
    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first interval tick completes immediately; the countdown starts
    // one full second after entry.
    ticker.tick().await;

    let mut effects = Vec::new();
    while timer_active(engine) {
        ticker.tick().await;
        effects.extend(engine.handle(EngineEvent::Tick));
    }

    effects
}

fn timer_active(engine: &RedirectEngine) -> bool {
    match engine.state() {
        EngineState::CountingDown { .. } => true,
        EngineState::Blocked { .. } => engine.block_close_remaining().is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::policy::PolicyDecision;
    use crate::domain::redirect::engine::VisitContext;

    fn countdown_ctx(wait_seconds: u32) -> VisitContext {
        VisitContext {
            original_url: "https://example.com/target".to_string(),
            title: None,
            has_password: false,
            require_confirm: false,
            enable_intermediate: true,
            expires_at: None,
            captcha_enabled: false,
            wait_seconds,
            block_close_seconds: 3,
            policy: PolicyDecision {
                allowed: true,
                reason: "no blacklist rule matched".to_string(),
                domain: "example.com".to_string(),
            },
            supplied_password: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_fires_after_wait() {
        let mut engine = RedirectEngine::new(countdown_ctx(5));
        engine.start();
        assert_eq!(engine.countdown_remaining(), Some(5));

        let effects = drive_timers(&mut engine).await;

        assert_eq!(*engine.state(), EngineState::Redirected);
        assert_eq!(
            effects
                .iter()
                .filter(|e| matches!(e, Effect::Redirect(_)))
                .count(),
            1
        );
        assert!(effects.contains(&Effect::RecordVisit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_driver_cancels_cleanly() {
        let mut engine = RedirectEngine::new(countdown_ctx(60));
        engine.start();

        let driver = drive_timers(&mut engine);
        // Nothing has been polled to completion: dropping the future stops
        // the countdown without a redirect.
        drop(driver);

        assert!(matches!(engine.state(), EngineState::CountingDown { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_close_countdown() {
        let mut ctx = countdown_ctx(5);
        ctx.policy = PolicyDecision {
            allowed: false,
            reason: "blocked by exact rule example.com".to_string(),
            domain: "example.com".to_string(),
        };

        let mut engine = RedirectEngine::new(ctx);
        engine.start();

        let effects = drive_timers(&mut engine).await;
        assert_eq!(effects, vec![Effect::CloseTab]);
        assert!(matches!(engine.state(), EngineState::Blocked { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_timer_returns_immediately() {
        let mut engine = RedirectEngine::new(countdown_ctx(0));
        // wait_seconds == 0 redirects on start; nothing left to drive.
        engine.start();
        let effects = drive_timers(&mut engine).await;
        assert!(effects.is_empty());
    }
}

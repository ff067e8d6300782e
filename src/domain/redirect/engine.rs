//! Redirect decision engine.
//!
//! One engine instance drives one visit, whether it entered through a stored
//! short link or an ad-hoc `/to` token. The machine is pure and synchronous:
//! callers feed it events (CAPTCHA outcomes, password verdicts, confirmation,
//! timer ticks) and execute the effects it returns (prefetch, redirect,
//! visit recording). A single fired-guard makes a duplicate redirect
//! structurally impossible, no matter how many timers or auto-submit paths
//! race toward it.

use crate::domain::policy::PolicyDecision;
use chrono::{DateTime, Utc};

/// Immutable inputs for one visit decision.
#[derive(Debug, Clone)]
pub struct VisitContext {
    pub original_url: String,
    pub title: Option<String>,
    pub has_password: bool,
    pub require_confirm: bool,
    pub enable_intermediate: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub captcha_enabled: bool,
    /// Countdown length in seconds for eligible visits.
    pub wait_seconds: u32,
    /// Auto-close countdown length shown on the blocked page.
    pub block_close_seconds: u32,
    pub policy: PolicyDecision,
    /// Pre-filled password from a signed source; submitted automatically at
    /// most once.
    pub supplied_password: Option<String>,
}

impl VisitContext {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e <= now)
    }
}

/// Engine states. `Checking*` states are transient: [`RedirectEngine::start`]
/// and event handling always settle on a stable or terminal state before
/// returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Init,
    CheckingExpiry,
    Expired,
    CheckingDomain,
    Blocked { reason: String },
    CheckingCaptcha,
    AwaitingCaptcha,
    CheckingPassword,
    AwaitingPassword,
    CheckingConfirm,
    AwaitingConfirm,
    CountingDown { remaining: u32 },
    Redirected,
    Cancelled,
}

impl EngineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Expired | Self::Blocked { .. } | Self::Redirected | Self::Cancelled
        )
    }

    fn is_awaiting(&self) -> bool {
        matches!(
            self,
            Self::AwaitingCaptcha | Self::AwaitingPassword | Self::AwaitingConfirm
        )
    }
}

/// Inputs fed into the machine after [`RedirectEngine::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    CaptchaVerified,
    CaptchaFailed,
    PasswordAccepted,
    PasswordRejected,
    Confirm,
    Cancel,
    Tick,
}

/// Side effects for the caller to execute. The engine never performs I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fire-and-forget warm-up fetch of the target; failures are ignored.
    Prefetch(String),
    /// Submit the pre-filled password for server-side verification exactly
    /// once; the verdict comes back as `PasswordAccepted`/`PasswordRejected`.
    AutoSubmitPassword(String),
    /// Perform the redirect. Emitted at most once per visit.
    Redirect(String),
    /// Best-effort visit recording; must never delay the redirect.
    RecordVisit,
    /// The blocked-page auto-close countdown reached zero.
    CloseTab,
}

/// The per-visit state machine.
#[derive(Debug)]
pub struct RedirectEngine {
    ctx: VisitContext,
    state: EngineState,
    captcha_verified: bool,
    password_verified: bool,
    password_errors: u32,
    autofill_attempted: bool,
    prefetch_issued: bool,
    redirect_fired: bool,
    block_remaining: Option<u32>,
}

impl RedirectEngine {
    pub fn new(ctx: VisitContext) -> Self {
        Self {
            ctx,
            state: EngineState::Init,
            captcha_verified: false,
            password_verified: false,
            password_errors: 0,
            autofill_attempted: false,
            prefetch_issued: false,
            redirect_fired: false,
            block_remaining: None,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn context(&self) -> &VisitContext {
        &self.ctx
    }

    pub fn password_errors(&self) -> u32 {
        self.password_errors
    }

    pub fn captcha_verified(&self) -> bool {
        self.captcha_verified
    }

    /// Whether the interstitial shows password/confirm controls.
    /// Independent of CAPTCHA.
    pub fn show_interactive_controls(&self) -> bool {
        self.ctx.has_password || self.ctx.require_confirm
    }

    /// Whether this visit auto-redirects after a countdown.
    pub fn countdown_eligible(&self) -> bool {
        self.ctx.enable_intermediate
            && !self.show_interactive_controls()
            && (!self.ctx.captcha_enabled || self.captcha_verified)
            && !self.ctx.is_expired_at(Utc::now())
    }

    /// Runs the checking chain from `Init` to the first stable state.
    pub fn start(&mut self) -> Vec<Effect> {
        self.start_at(Utc::now())
    }

    /// Clock-injected variant of [`Self::start`] for deterministic tests.
    pub fn start_at(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        debug_assert_eq!(self.state, EngineState::Init);
        let mut effects = Vec::new();

        self.state = EngineState::CheckingExpiry;
        if self.ctx.is_expired_at(now) {
            // Absolute: no other flag is consulted once expired.
            self.state = EngineState::Expired;
            return effects;
        }

        self.state = EngineState::CheckingDomain;
        if !self.ctx.policy.allowed {
            self.state = EngineState::Blocked {
                reason: self.ctx.policy.reason.clone(),
            };
            self.block_remaining = Some(self.ctx.block_close_seconds);
            return effects;
        }

        self.advance(&mut effects);
        effects
    }

    /// Applies an event and settles on the next stable state.
    pub fn handle(&mut self, event: EngineEvent) -> Vec<Effect> {
        let mut effects = Vec::new();

        match event {
            EngineEvent::CaptchaVerified => {
                self.captcha_verified = true;
                if self.state == EngineState::AwaitingCaptcha {
                    self.advance(&mut effects);
                }
            }
            EngineEvent::CaptchaFailed => {
                // Re-surface the challenge without changing the outer state.
                self.captcha_verified = false;
            }
            EngineEvent::PasswordAccepted => {
                if self.state == EngineState::AwaitingPassword {
                    self.password_verified = true;
                    self.advance(&mut effects);
                }
            }
            EngineEvent::PasswordRejected => {
                if self.state == EngineState::AwaitingPassword {
                    self.password_errors += 1;
                }
            }
            EngineEvent::Confirm => {
                if self.state == EngineState::AwaitingConfirm {
                    self.fire_redirect(&mut effects);
                }
            }
            EngineEvent::Cancel => {
                if self.state.is_awaiting() {
                    self.block_remaining = None;
                    self.state = EngineState::Cancelled;
                }
            }
            EngineEvent::Tick => self.tick(&mut effects),
        }

        effects
    }

    /// Steps through the CAPTCHA → password → confirm → countdown chain from
    /// the current position, emitting entry effects along the way.
    fn advance(&mut self, effects: &mut Vec<Effect>) {
        self.state = EngineState::CheckingCaptcha;
        if self.ctx.captcha_enabled && !self.captcha_verified {
            self.state = EngineState::AwaitingCaptcha;
            return;
        }

        self.state = EngineState::CheckingPassword;
        if self.ctx.has_password && !self.password_verified {
            self.state = EngineState::AwaitingPassword;
            self.issue_prefetch(effects);
            if let Some(password) = self.ctx.supplied_password.clone() {
                // Exactly one automatic submission per visit, even when the
                // CAPTCHA verifies after the password was supplied.
                if !self.autofill_attempted {
                    self.autofill_attempted = true;
                    effects.push(Effect::AutoSubmitPassword(password));
                }
            }
            return;
        }

        self.state = EngineState::CheckingConfirm;
        if self.ctx.require_confirm {
            self.state = EngineState::AwaitingConfirm;
            self.issue_prefetch(effects);
            return;
        }

        if self.ctx.enable_intermediate && self.ctx.wait_seconds > 0 {
            self.state = EngineState::CountingDown {
                remaining: self.ctx.wait_seconds,
            };
            self.issue_prefetch(effects);
            return;
        }

        self.fire_redirect(effects);
    }

    fn tick(&mut self, effects: &mut Vec<Effect>) {
        match &self.state {
            EngineState::CountingDown { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.fire_redirect(effects);
                } else {
                    self.state = EngineState::CountingDown { remaining };
                }
            }
            EngineState::Blocked { .. } => {
                if let Some(remaining) = self.block_remaining {
                    let remaining = remaining.saturating_sub(1);
                    if remaining == 0 {
                        self.block_remaining = None;
                        effects.push(Effect::CloseTab);
                    } else {
                        self.block_remaining = Some(remaining);
                    }
                }
            }
            _ => {}
        }
    }

    /// One-shot redirect. All paths funnel through here; the guard holds even
    /// if a timer tick and an interactive submit race.
    fn fire_redirect(&mut self, effects: &mut Vec<Effect>) {
        if self.redirect_fired {
            return;
        }
        self.redirect_fired = true;
        self.state = EngineState::Redirected;
        effects.push(Effect::Redirect(self.ctx.original_url.clone()));
        effects.push(Effect::RecordVisit);
    }

    fn issue_prefetch(&mut self, effects: &mut Vec<Effect>) {
        if !self.prefetch_issued {
            self.prefetch_issued = true;
            effects.push(Effect::Prefetch(self.ctx.original_url.clone()));
        }
    }

    /// Seconds left on the blocked-page auto-close countdown.
    pub fn block_close_remaining(&self) -> Option<u32> {
        self.block_remaining
    }

    /// Seconds left on the main countdown.
    pub fn countdown_remaining(&self) -> Option<u32> {
        match &self.state {
            EngineState::CountingDown { remaining } => Some(*remaining),
            _ => None,
        }
    }
}

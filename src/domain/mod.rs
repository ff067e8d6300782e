//! Domain layer: entities, pure policy matching, the redirect decision
//! engine, the ad-hoc token codec, and repository traits.
//!
//! # Visit flow
//!
//! 1. A visit arrives via a stored path or a `/to` token
//! 2. [`redirect::RedirectEngine`] composes expiry, [`policy`], CAPTCHA,
//!    password, and confirmation into one decision
//! 3. Redirected visits enqueue a [`visit_event::VisitEvent`];
//!    [`visit_worker::run_visit_worker`] records them off the hot path

pub mod entities;
pub mod policy;
pub mod redirect;
pub mod repositories;
pub mod token;
pub mod visit_event;
pub mod visit_worker;

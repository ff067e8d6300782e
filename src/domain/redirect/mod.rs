//! Per-visit redirect decision machinery.
//!
//! [`engine::RedirectEngine`] owns the decision state machine;
//! [`countdown::drive_timers`] is the single timer driver for its countdowns.

pub mod countdown;
pub mod engine;

pub use countdown::drive_timers;
pub use engine::{Effect, EngineEvent, EngineState, RedirectEngine, VisitContext};

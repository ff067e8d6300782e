//! Application services orchestrating domain logic over infrastructure.

mod captcha;
mod link_resolver;
mod metadata;
mod policy_service;

pub use captcha::{CaptchaVerifier, NullCaptchaVerifier, TURNSTILE_VERIFY_URL, TurnstileVerifier};
pub use link_resolver::{LINKS_TAG, LinkResolver};
pub use metadata::MetadataService;
pub use policy_service::{PolicyService, RULES_TAG};

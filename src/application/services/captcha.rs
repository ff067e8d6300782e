//! Server-side CAPTCHA verification.
//!
//! A client-asserted "verified" flag is never trusted: the challenge token
//! must be verified against the provider before a gated flow proceeds.
//! Verification timeouts and transport errors count as failures (the visitor
//! is re-challenged), never as success.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Verifies CAPTCHA challenge tokens.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Whether visits should be challenged at all.
    fn enabled(&self) -> bool;

    /// True iff the provider accepted the challenge token.
    async fn verify(&self, token: &str) -> bool;
}

/// Cloudflare Turnstile verification endpoint.
pub const TURNSTILE_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
}

/// Turnstile-backed verifier.
pub struct TurnstileVerifier {
    http: reqwest::Client,
    secret: String,
    verify_url: String,
}

impl TurnstileVerifier {
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be constructed.
    pub fn new(secret: String, verify_url: String, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            secret,
            verify_url,
        })
    }
}

#[async_trait]
impl CaptchaVerifier for TurnstileVerifier {
    fn enabled(&self) -> bool {
        true
    }

    async fn verify(&self, token: &str) -> bool {
        let response = self
            .http
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await;

        match response {
            Ok(response) => match response.json::<SiteverifyResponse>().await {
                Ok(body) => body.success,
                Err(e) => {
                    warn!("captcha verify response unreadable: {e}");
                    false
                }
            },
            Err(e) => {
                // Includes timeouts: failure, never success.
                warn!("captcha verify request failed: {e}");
                false
            }
        }
    }
}

/// Verifier used when CAPTCHA is not configured: nothing is challenged and
/// verification is vacuously true.
#[derive(Debug, Clone, Default)]
pub struct NullCaptchaVerifier;

impl NullCaptchaVerifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CaptchaVerifier for NullCaptchaVerifier {
    fn enabled(&self) -> bool {
        false
    }

    async fn verify(&self, _token: &str) -> bool {
        true
    }
}

//! DTOs for CAPTCHA verification.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// `POST /verify-captcha` request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyCaptchaRequest {
    #[validate(length(min = 1, max = 4096))]
    pub token: String,
}

/// `POST /verify-captcha` success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCaptchaResponse {
    pub verified: bool,
}

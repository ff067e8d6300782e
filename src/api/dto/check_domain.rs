//! DTOs for the domain policy check endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// `POST /check-domain` request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckDomainRequest {
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
}

/// `POST /check-domain` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDomainResponse {
    pub allowed: bool,
    pub reason: String,
    pub domain: String,
    pub security_mode: String,
}

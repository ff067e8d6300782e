//! Keyed password digests for gated links.
//!
//! Passwords are stored as HMAC-SHA256 digests keyed by the server signing
//! secret. An attacker with read-only database access cannot verify or forge
//! passwords without the secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Returns the 64-character lowercase hex digest for `password`.
pub fn digest(signing_secret: &str, password: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(password.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison of a candidate password against a stored digest.
pub fn verify(signing_secret: &str, candidate: &str, stored_digest: &str) -> bool {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(candidate.as_bytes());

    match hex::decode(stored_digest) {
        Ok(expected) => mac.verify_slice(&expected).is_ok(),
        Err(_) => false,
    }
}

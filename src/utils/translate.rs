//! Translation collaborator.
//!
//! String tables live outside this crate. Handlers resolve user-facing
//! message keys through an injected pure function; the default resolver
//! returns the key itself so payloads stay meaningful without a catalog.

use std::sync::Arc;

/// `t(key, params) -> string`. Pure; implementations must not block.
pub type Translator = Arc<dyn Fn(&str, &[(&str, &str)]) -> String + Send + Sync>;

/// Identity resolver used when no catalog is injected.
pub fn default_translator() -> Translator {
    Arc::new(|key: &str, _params: &[(&str, &str)]| key.to_string())
}

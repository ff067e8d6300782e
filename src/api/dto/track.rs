//! DTO for fire-and-forget tracking acknowledgements.

use serde::{Deserialize, Serialize};

/// 202 body for `POST /track-visit/{path}` and `POST /track-to-visit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackAccepted {
    pub accepted: bool,
}

//! Position Store Port - last known exploration position
//!
//! Mirrors the key/value storage providers: failures are logged by the
//! adapter and never bubble into the reconciler.

use argonvale_shared::ZoneId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPosition {
    pub zone_id: ZoneId,
    pub x: i32,
    pub y: i32,
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PositionStorePort: Send + Sync {
    fn save_position(&self, position: &StoredPosition);

    fn load_position(&self) -> Option<StoredPosition>;
}

//! Zone Map Port - static per-zone map resource

use argonvale_shared::{ZoneId, ZoneMapData};
use async_trait::async_trait;

use super::ApiError;

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ZoneMapPort: Send + Sync {
    async fn fetch_zone_map(&self, zone_id: &ZoneId) -> Result<ZoneMapData, ApiError>;
}

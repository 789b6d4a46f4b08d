//! Message Count Port - authoritative unread count for the inbox badge

use async_trait::async_trait;

use super::ApiError;

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageCountPort: Send + Sync {
    /// Fetch the number of unread private messages for the signed-in player.
    async fn unread_count(&self) -> Result<u32, ApiError>;
}

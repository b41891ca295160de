//! Checkpoint store trait definition.

use async_trait::async_trait;
use tracing::warn;

use crate::errors::CheckpointError;
use news_indexer_shared::Watermark;

/// Durable single-value slot holding the sync watermark.
///
/// Only one sync cycle touches the store at a time, so implementations need
/// no internal coordination beyond what their medium provides.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Read the persisted watermark.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - Nothing has been persisted yet
    /// * `Ok(Some(watermark))` - The last saved watermark
    /// * `Err(CheckpointError)` - The slot could not be read or parsed
    async fn try_load(&self) -> Result<Option<Watermark>, CheckpointError>;

    /// Persist a watermark. Must be durable before it returns.
    async fn save(&self, watermark: Watermark) -> Result<(), CheckpointError>;

    /// Read the persisted watermark, falling back to `None` (full resync)
    /// when it cannot be read or parsed.
    async fn load(&self) -> Option<Watermark> {
        match self.try_load().await {
            Ok(watermark) => watermark,
            Err(e) => {
                warn!(error = %e, "Checkpoint unreadable, falling back to a full resync");
                None
            }
        }
    }
}

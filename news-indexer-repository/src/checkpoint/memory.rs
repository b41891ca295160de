//! In-memory checkpoint store.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::errors::CheckpointError;
use crate::interfaces::CheckpointStore;
use news_indexer_shared::Watermark;

/// Non-durable checkpoint store for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    watermark: Mutex<Option<Watermark>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_watermark(watermark: Watermark) -> Self {
        Self {
            watermark: Mutex::new(Some(watermark)),
        }
    }

    pub async fn current(&self) -> Option<Watermark> {
        *self.watermark.lock().await
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn try_load(&self) -> Result<Option<Watermark>, CheckpointError> {
        Ok(self.current().await)
    }

    async fn save(&self, watermark: Watermark) -> Result<(), CheckpointError> {
        *self.watermark.lock().await = Some(watermark);
        Ok(())
    }
}

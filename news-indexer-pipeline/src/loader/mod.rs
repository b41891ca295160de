//! Loader module for the news indexer pipeline.
//!
//! Upserts mapped batches into the search index.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::errors::PipelineError;
use news_indexer_repository::{BulkResult, SearchIndexError, SearchIndexProvider};
use news_indexer_shared::Batch;

/// Largest batch accepted by a single bulk request.
pub const MAX_BATCH_SIZE: usize = 10_000;

/// Configuration for the bulk loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Batches larger than this are refused without contacting the index.
    pub max_batch_size: usize,
    /// Bound on a single bulk request.
    pub timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_batch_size: MAX_BATCH_SIZE,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Loader that upserts batches into the search index.
///
/// A failure of the whole request is returned as an error and is not retried
/// here; the orchestrator abandons the cycle and the next one re-reads the
/// same records. Per-document failures are logged and returned in the
/// [`BulkResult`].
pub struct BulkLoader {
    client: Arc<dyn SearchIndexProvider>,
    config: LoaderConfig,
}

impl BulkLoader {
    /// Create a new bulk loader with the default configuration.
    pub fn new(client: Arc<dyn SearchIndexProvider>) -> Self {
        Self::with_config(client, LoaderConfig::default())
    }

    /// Create a new bulk loader with custom configuration.
    pub fn with_config(client: Arc<dyn SearchIndexProvider>, config: LoaderConfig) -> Self {
        Self { client, config }
    }

    /// Upsert a batch keyed by document id.
    #[instrument(skip(self, batch), fields(count = batch.len()))]
    pub async fn upsert(&self, batch: &Batch) -> Result<BulkResult, PipelineError> {
        if batch.is_empty() {
            return Ok(BulkResult::empty());
        }

        if batch.len() > self.config.max_batch_size {
            return Err(SearchIndexError::batch_size_exceeded(
                batch.len(),
                self.config.max_batch_size,
            )
            .into());
        }

        let result = match tokio::time::timeout(
            self.config.timeout,
            self.client.bulk_upsert(batch.documents()),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(PipelineError::timeout("Bulk upsert")),
        };

        for failure in result.failures() {
            warn!(
                id = %failure.id,
                error = %failure
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                "Document failed to upsert"
            );
        }

        if result.has_failures() {
            warn!(
                succeeded = result.succeeded,
                failed = result.failed,
                "Batch partially upserted"
            );
        } else {
            debug!(count = result.succeeded, "Batch upserted");
        }

        Ok(result)
    }

    /// Ensure the destination index exists.
    pub async fn ensure_index(&self) -> Result<(), PipelineError> {
        match tokio::time::timeout(self.config.timeout, self.client.ensure_index()).await {
            Ok(result) => {
                result?;
                info!("Search index ready");
                Ok(())
            }
            Err(_) => Err(PipelineError::timeout("Index bootstrap")),
        }
    }

    /// Check if the search engine is healthy.
    pub async fn health_check(&self) -> Result<bool, PipelineError> {
        match tokio::time::timeout(self.config.timeout, self.client.health_check()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(PipelineError::timeout("Health check")),
        }
    }
}

//! Dependency initialization and wiring for the news indexer.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::settings::{IndexerSettings, RetryBackoff};
use crate::IndexingError;
use news_indexer_pipeline::{
    BulkLoader, ChangeReader, ExponentialBackoff, FixedBackoff, LoaderConfig, Orchestrator,
    OrchestratorConfig, ReaderConfig, RetryPolicy, MAX_BATCH_SIZE,
};
use news_indexer_repository::{
    CheckpointStore, FileCheckpointStore, OpenSearchClient, PostgresChangeSource, PostgresOptions,
    SearchIndexProvider, SourceTable,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    /// Postgres pool behind the orchestrator, closed on shutdown.
    pub source: Arc<PostgresChangeSource>,
}

impl Dependencies {
    /// Build every component from `settings`.
    ///
    /// Nothing here requires the stores to be reachable: the Postgres pool
    /// connects lazily and the search index is bootstrapped by the first
    /// cycle. OpenSearch health is probed and logged only.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If a component rejects its configuration
    pub async fn new(settings: &IndexerSettings) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %settings.opensearch.url,
            index = %settings.opensearch.index_name,
            batch_size = settings.batch_size,
            poll_interval = ?settings.poll_interval,
            checkpoint_file = %settings.checkpoint_file.display(),
            paging = %settings.paging,
            partial_failures = %settings.partial_failures,
            retry_backoff = %settings.retry_backoff,
            "Initializing dependencies"
        );

        // Initialize OpenSearch client
        let search_client = OpenSearchClient::new(&settings.opensearch)?;

        match search_client.health_check().await {
            Ok(true) => info!("OpenSearch connection verified"),
            Ok(false) => warn!("OpenSearch cluster status is red"),
            Err(e) => warn!(error = %e, "OpenSearch health check failed, will retry in the sync loop"),
        }

        // Initialize the change source
        let source = Arc::new(
            PostgresChangeSource::connect_lazy(
                &settings.postgres_dsn,
                SourceTable::articles(),
                PostgresOptions {
                    timeout: settings.timeout,
                    ..PostgresOptions::default()
                },
            )
            .map_err(|e| IndexingError::config(format!("Failed to create Postgres source: {}", e)))?,
        );

        debug!(
            ddl = %source.table().cursor_index_ddl(),
            "Page queries are served by this index"
        );

        let checkpoints = Arc::new(FileCheckpointStore::new(&settings.checkpoint_file));
        match checkpoints.try_load().await {
            Ok(Some(watermark)) => info!(watermark = %watermark, "Resuming from checkpoint"),
            Ok(None) => info!("No checkpoint found, starting a full sync"),
            Err(e) => warn!(error = %e, "Checkpoint unreadable, starting a full sync"),
        }

        let reader = ChangeReader::new(
            source.clone(),
            ReaderConfig {
                page_size: settings.batch_size,
                paging: settings.paging,
                timeout: settings.timeout,
            },
        )?;

        let loader = BulkLoader::with_config(
            Arc::new(search_client),
            LoaderConfig {
                max_batch_size: MAX_BATCH_SIZE,
                timeout: settings.timeout,
            },
        );

        let retry: Box<dyn RetryPolicy> = match settings.retry_backoff {
            RetryBackoff::Fixed => Box::new(FixedBackoff::new(settings.retry_delay)),
            RetryBackoff::Exponential => Box::new(ExponentialBackoff::new(
                settings.retry_delay,
                settings.retry_max_delay,
            )),
        };

        let orchestrator = Orchestrator::with_config(
            checkpoints,
            reader,
            loader,
            OrchestratorConfig {
                poll_interval: settings.poll_interval,
                partial_failures: settings.partial_failures,
                checkpoint_timeout: settings.timeout,
            },
            retry,
        );

        Ok(Self { orchestrator, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> IndexerSettings {
        IndexerSettings::from_lookup(|key| match key {
            "POSTGRES_DSN" => Some("postgres://postgres@localhost:5432/news".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_invalid_search_url_is_a_search_error() {
        let mut settings = settings();
        settings.opensearch.url = "ftp://localhost:9200".to_string();

        let result = Dependencies::new(&settings).await;

        assert!(matches!(result, Err(IndexingError::SearchError(_))));
    }
}

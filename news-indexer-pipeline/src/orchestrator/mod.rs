//! Orchestrator module for the news indexer pipeline.
//!
//! Runs sync cycles: read every change since the checkpoint, map and upsert
//! each page as it arrives, then advance the checkpoint.

mod cycle;
mod shutdown;

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::loader::BulkLoader;
use crate::processor::DocumentMapper;
use crate::reader::ChangeReader;
use crate::retry::{FixedBackoff, RetryPolicy};
use news_indexer_repository::CheckpointStore;
use news_indexer_shared::Watermark;

pub use cycle::{CycleOutcome, CycleReport, CycleState, PartialFailurePolicy};
pub use shutdown::ShutdownHandle;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Wait between the end of a successful cycle and the next one.
    pub poll_interval: Duration,
    pub partial_failures: PartialFailurePolicy,
    /// Bound on checkpoint loads and saves.
    pub checkpoint_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            partial_failures: PartialFailurePolicy::default(),
            checkpoint_timeout: Duration::from_secs(30),
        }
    }
}

/// Orchestrator that coordinates the pipeline components.
///
/// Cycles never overlap: both entry points take `&mut self`, and
/// [`run_forever`](Self::run_forever) only starts the next cycle after the
/// previous one has finished and the wait has elapsed.
pub struct Orchestrator {
    checkpoints: Arc<dyn CheckpointStore>,
    reader: ChangeReader,
    mapper: DocumentMapper,
    loader: BulkLoader,
    retry: Box<dyn RetryPolicy>,
    config: OrchestratorConfig,
    shutdown: ShutdownHandle,
    state: CycleState,
    index_ready: bool,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(checkpoints: Arc<dyn CheckpointStore>, reader: ChangeReader, loader: BulkLoader) -> Self {
        Self::with_config(
            checkpoints,
            reader,
            loader,
            OrchestratorConfig::default(),
            Box::new(FixedBackoff::default()),
        )
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        checkpoints: Arc<dyn CheckpointStore>,
        reader: ChangeReader,
        loader: BulkLoader,
        config: OrchestratorConfig,
        retry: Box<dyn RetryPolicy>,
    ) -> Self {
        Self {
            checkpoints,
            reader,
            mapper: DocumentMapper::new(),
            loader,
            retry,
            config,
            shutdown: ShutdownHandle::new(),
            state: CycleState::Idle,
            index_ready: false,
        }
    }

    /// Use an externally owned shutdown handle.
    pub fn with_shutdown(mut self, shutdown: ShutdownHandle) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// A handle that stops this orchestrator when triggered.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Check if the search engine is healthy.
    pub async fn health_check(&self) -> Result<bool, PipelineError> {
        self.loader.health_check().await
    }

    /// Run a single sync cycle.
    ///
    /// On error the cycle is abandoned in the `Failed` state without
    /// touching the checkpoint, so the next cycle re-reads everything that
    /// was not yet checkpointed.
    pub async fn run_once(&mut self) -> Result<CycleReport, PipelineError> {
        let cycle_id = Uuid::new_v4();
        let result = self.execute_cycle(cycle_id).await;

        if let Err(e) = &result {
            self.state.transition(CycleState::Failed);
            error!(
                cycle_id = %cycle_id,
                error = %e,
                transient = e.is_transient(),
                "Sync cycle failed"
            );
        }

        result
    }

    /// Run cycles until shutdown is requested.
    ///
    /// Errors never escape: a failed cycle is followed by a cool-down chosen
    /// by the retry policy, a successful one by the poll interval.
    #[instrument(skip(self))]
    pub async fn run_forever(&mut self) {
        info!(
            poll_interval = ?self.config.poll_interval,
            page_size = self.reader.page_size(),
            paging = %self.reader.paging(),
            partial_failures = %self.config.partial_failures,
            "Starting sync loop"
        );

        while !self.shutdown.is_triggered() {
            let delay = match self.run_once().await {
                Ok(report) => {
                    self.retry.reset();
                    if report.outcome == CycleOutcome::Interrupted {
                        break;
                    }
                    self.config.poll_interval
                }
                Err(_) => {
                    let delay = self.retry.next_delay();
                    warn!(delay = ?delay, "Cooling down before the next cycle");
                    delay
                }
            };

            if self.sleep_or_shutdown(delay).await {
                break;
            }
            self.state.transition(CycleState::Idle);
        }

        info!("Sync loop stopped");
    }

    #[instrument(name = "sync_cycle", skip(self))]
    async fn execute_cycle(&mut self, cycle_id: Uuid) -> Result<CycleReport, PipelineError> {
        if !self.index_ready {
            self.loader.ensure_index().await?;
            self.index_ready = true;
        }

        self.state.transition(CycleState::Reading);
        let previous = self.load_watermark().await?;
        let mut report = CycleReport::new(cycle_id, previous);
        debug!(watermark = ?previous, "Starting cycle");

        let mut scan = self.reader.scan(previous);
        loop {
            if self.shutdown.is_triggered() {
                info!(
                    pages = report.pages,
                    records = report.records_read,
                    "Shutdown requested, leaving cycle without checkpoint"
                );
                report.outcome = CycleOutcome::Interrupted;
                self.state.transition(CycleState::Idle);
                return Ok(report);
            }

            self.state.transition(CycleState::Reading);
            let Some(records) = scan.next_page().await? else {
                break;
            };

            self.state.transition(CycleState::Loading);
            let batch = self.mapper.map_page(&records);
            let result = self.loader.upsert(&batch).await?;
            report.record_page(records.len(), &result);

            if result.has_failures() {
                let partial = PipelineError::PartialBatch {
                    failed: result.failed,
                    total: result.total,
                };
                warn!(page = report.pages, error = %partial, "Continuing after partial batch");
            }
        }
        let observed = scan.max_changed_at();

        self.state.transition(CycleState::Checkpointing);
        if report.documents_failed > 0 && self.config.partial_failures == PartialFailurePolicy::Withhold {
            warn!(
                failed = report.documents_failed,
                watermark = ?previous,
                "Withholding watermark after document failures"
            );
        } else if let Some(next) = Watermark::advance(previous, observed) {
            self.save_watermark(next).await?;
            report.new_watermark = Some(next);
        }

        report.outcome = if report.records_read == 0 {
            CycleOutcome::NoChanges
        } else {
            CycleOutcome::Completed
        };
        self.state.transition(CycleState::Idle);

        info!(
            pages = report.pages,
            records = report.records_read,
            upserted = report.documents_upserted,
            failed = report.documents_failed,
            watermark = ?report.new_watermark.map(|w| w.to_string()),
            "Sync cycle completed"
        );
        Ok(report)
    }

    /// Read the checkpoint, treating an unreadable one as "no watermark".
    async fn load_watermark(&self) -> Result<Option<Watermark>, PipelineError> {
        match tokio::time::timeout(self.config.checkpoint_timeout, self.checkpoints.try_load()).await {
            Ok(Ok(watermark)) => Ok(watermark),
            Ok(Err(e)) => {
                let error = PipelineError::from(e);
                warn!(error = %error, "Checkpoint unreadable, resyncing from the beginning");
                Ok(None)
            }
            Err(_) => Err(PipelineError::timeout("Checkpoint load")),
        }
    }

    async fn save_watermark(&self, watermark: Watermark) -> Result<(), PipelineError> {
        match tokio::time::timeout(self.config.checkpoint_timeout, self.checkpoints.save(watermark)).await {
            Ok(result) => {
                result?;
                debug!(watermark = %watermark, "Checkpoint advanced");
                Ok(())
            }
            Err(_) => Err(PipelineError::timeout("Checkpoint save")),
        }
    }

    /// Sleep for `delay`; returns `true` if shutdown interrupted the sleep.
    async fn sleep_or_shutdown(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            _ = self.shutdown.triggered() => true,
        }
    }
}

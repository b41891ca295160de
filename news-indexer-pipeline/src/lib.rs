//! # News Indexer Pipeline
//!
//! This crate provides the pipeline components that keep the search index in
//! step with the articles table.
//!
//! ## Architecture
//!
//! The pipeline follows the Reader-Processor-Loader pattern:
//!
//! 1. **Reader**: Pages through rows changed since the watermark
//! 2. **Processor**: Maps rows into search documents
//! 3. **Loader**: Upserts documents into OpenSearch
//! 4. **Orchestrator**: Runs cycles and advances the checkpoint

pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod reader;
pub mod retry;

#[cfg(test)]
mod test_support;

pub use errors::PipelineError;
pub use loader::{BulkLoader, LoaderConfig, MAX_BATCH_SIZE};
pub use orchestrator::{
    CycleOutcome, CycleReport, CycleState, Orchestrator, OrchestratorConfig, PartialFailurePolicy,
    ShutdownHandle,
};
pub use processor::DocumentMapper;
pub use reader::{ChangeReader, PageScan, PagingStrategy, ReaderConfig};
pub use retry::{ExponentialBackoff, FixedBackoff, RetryPolicy};

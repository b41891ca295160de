//! Error types for the news indexer pipeline.

use news_indexer_repository::{CheckpointError, SearchIndexError, SourceError};
use thiserror::Error;

/// Errors that can occur while running a sync cycle.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Network failure or timeout against either store. The cycle is
    /// abandoned and retried on the next scheduled run.
    #[error("Transient I/O error: {0}")]
    TransientIo(String),

    /// Some documents of a batch were rejected by the index.
    #[error("Partial batch failure: {failed} of {total} documents failed")]
    PartialBatch { failed: usize, total: usize },

    /// The persisted watermark could not be parsed.
    #[error("Corrupt checkpoint: {0}")]
    CorruptCheckpoint(String),

    /// Missing or invalid endpoint, credentials or settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-transient failure reported by the change source.
    #[error("Source error: {0}")]
    Source(SourceError),

    /// Non-transient failure reported by the search index.
    #[error("Search error: {0}")]
    Search(SearchIndexError),

    /// Non-transient failure reported by the checkpoint store.
    #[error("Checkpoint error: {0}")]
    Checkpoint(CheckpointError),
}

impl PipelineError {
    /// Create a transient I/O error.
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::TransientIo(msg.into())
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a timeout error for the named operation.
    pub fn timeout(operation: &str) -> Self {
        Self::TransientIo(format!("{} timed out", operation))
    }

    /// Whether the next scheduled cycle may succeed without intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientIo(_))
    }
}

impl From<SourceError> for PipelineError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::ConfigurationError(msg) => Self::Configuration(msg),
            err if err.is_transient() => Self::TransientIo(err.to_string()),
            err => Self::Source(err),
        }
    }
}

impl From<SearchIndexError> for PipelineError {
    fn from(err: SearchIndexError) -> Self {
        match err {
            SearchIndexError::ValidationError(msg) => Self::Configuration(msg),
            err if err.is_transient() => Self::TransientIo(err.to_string()),
            err => Self::Search(err),
        }
    }
}

impl From<CheckpointError> for PipelineError {
    fn from(err: CheckpointError) -> Self {
        match err {
            CheckpointError::Corrupt(msg) => Self::CorruptCheckpoint(msg),
            CheckpointError::IoError(msg) => Self::TransientIo(msg),
        }
    }
}

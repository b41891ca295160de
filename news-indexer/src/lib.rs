//! # News Indexer
//!
//! Main library for the news search indexer.
//!
//! This crate provides the configuration and wiring used by the
//! `news-indexer` binary to run the sync pipeline.

pub mod config;

pub use config::{Dependencies, IndexerSettings, LogFormat, RetryBackoff};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] news_indexer_pipeline::PipelineError),

    /// The search client rejected its configuration.
    #[error("Search error: {0}")]
    SearchError(#[from] news_indexer_repository::SearchIndexError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

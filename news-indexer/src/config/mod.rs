//! Configuration and dependency wiring for the news indexer.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{IndexerSettings, LogFormat, RetryBackoff};

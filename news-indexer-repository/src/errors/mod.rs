//! Error types for the news indexer repository.

mod checkpoint_error;
mod search_index_error;
mod source_error;

pub use checkpoint_error::CheckpointError;
pub use search_index_error::SearchIndexError;
pub use source_error::SourceError;

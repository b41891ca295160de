//! # News Indexer Repository
//!
//! This crate provides the traits the sync pipeline uses to talk to the
//! outside world, and their concrete implementations:
//!
//! - [`ChangeSource`]: paginated change extraction, backed by Postgres
//! - [`SearchIndexProvider`]: idempotent bulk upserts, backed by OpenSearch
//! - [`CheckpointStore`]: durable watermark slot, backed by a local file

pub mod checkpoint;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod postgres;
pub mod types;

pub use checkpoint::{FileCheckpointStore, InMemoryCheckpointStore};
pub use config::{BasicCredentials, OpenSearchConfig};
pub use errors::{CheckpointError, SearchIndexError, SourceError};
pub use interfaces::{ChangeSource, CheckpointStore, SearchIndexProvider};
pub use opensearch::OpenSearchClient;
pub use postgres::{PostgresChangeSource, PostgresOptions, SourceTable};
pub use types::{BulkResult, DocumentResult, PageCursor, PageRequest};

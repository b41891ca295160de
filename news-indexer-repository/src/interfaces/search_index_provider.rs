//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use crate::types::BulkResult;
use news_indexer_shared::IndexDocument;

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// Implementations are injected into the bulk loader to enable dependency
/// injection and easy testing with mock implementations.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the destination index exists with the expected mappings.
    ///
    /// Idempotent: an index that already exists is left untouched.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index exists or was created
    /// * `Err(SearchIndexError)` - If the index could not be checked or created
    async fn ensure_index(&self) -> Result<(), SearchIndexError>;

    /// Insert-or-replace documents keyed by their identifier.
    ///
    /// Submitting the same documents again overwrites them rather than adding
    /// copies, so a batch can be safely re-sent after a partial failure.
    ///
    /// # Arguments
    ///
    /// * `documents` - Documents to upsert
    ///
    /// # Returns
    ///
    /// * `Ok(BulkResult)` - Per-document outcome; may contain failed items
    /// * `Err(SearchIndexError)` - If the bulk request failed as a whole
    async fn bulk_upsert(&self, documents: &[IndexDocument]) -> Result<BulkResult, SearchIndexError>;

    /// Check if the search engine is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the cluster is usable
    /// * `Ok(false)` - If the cluster reports a red status
    /// * `Err(SearchIndexError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchIndexError>;
}

//! Request and response types for store operations.

use news_indexer_shared::{RecordKey, Watermark};

use crate::errors::SearchIndexError;

/// Where the next page starts within the range of changed rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// Skip this many rows of the ordered range.
    Offset(u64),
    /// Start strictly after this `(changed_at, id)` key. `None` starts at
    /// the beginning of the range.
    After(Option<RecordKey>),
}

/// Request for one page of changed rows.
///
/// Rows are returned ordered ascending by `(changed_at, id)` and restricted
/// to `changed_at > after` when a watermark is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Only rows changed strictly after this watermark. `None` means from the
    /// beginning of time.
    pub after: Option<Watermark>,
    /// Position within the range.
    pub cursor: PageCursor,
    /// Maximum number of rows to return.
    pub limit: usize,
}

impl PageRequest {
    /// Offset/limit paging request.
    pub fn offset(after: Option<Watermark>, offset: u64, limit: usize) -> Self {
        Self {
            after,
            cursor: PageCursor::Offset(offset),
            limit,
        }
    }

    /// Keyset paging request resuming after `last_key`.
    pub fn after_key(after: Option<Watermark>, last_key: Option<RecordKey>, limit: usize) -> Self {
        Self {
            after,
            cursor: PageCursor::After(last_key),
            limit,
        }
    }
}

/// Result of a bulk operation for a single document.
#[derive(Debug, Clone)]
pub struct DocumentResult {
    /// The document identifier.
    pub id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

impl DocumentResult {
    pub fn succeeded(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, error: SearchIndexError) -> Self {
        Self {
            id: id.into(),
            success: false,
            error: Some(error),
        }
    }
}

/// Summary of a bulk upsert containing aggregate statistics and individual results.
///
/// A bulk request that was accepted as a whole can still contain failed
/// items; callers decide what a partial failure means for them.
#[derive(Debug, Clone, Default)]
pub struct BulkResult {
    /// Total number of documents in the batch.
    pub total: usize,
    /// Number of successful upserts.
    pub succeeded: usize,
    /// Number of failed upserts.
    pub failed: usize,
    /// Individual results for each document, in batch order.
    pub results: Vec<DocumentResult>,
}

impl BulkResult {
    /// Result of upserting an empty batch.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a summary from per-document results.
    pub fn from_results(results: Vec<DocumentResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Whether any document in the batch failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// The failed documents.
    pub fn failures(&self) -> impl Iterator<Item = &DocumentResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

//! Change source trait definition.

use async_trait::async_trait;

use crate::errors::SourceError;
use crate::types::PageRequest;
use news_indexer_shared::SourceRecord;

/// Paginated, ordered range query over the system of record.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Fetch one page of rows changed strictly after `request.after`.
    ///
    /// # Arguments
    ///
    /// * `request` - Watermark, cursor and page size
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<SourceRecord>)` - At most `request.limit` rows, ascending by
    ///   `(changed_at, id)`. Fewer than `limit` rows means the range is drained.
    /// * `Err(SourceError)` - If the query fails
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<SourceRecord>, SourceError>;
}

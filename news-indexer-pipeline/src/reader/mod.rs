//! Reader module for the news indexer pipeline.
//!
//! Pages through the rows changed since a watermark, in ascending
//! `(changed_at, id)` order.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::errors::PipelineError;
use news_indexer_repository::{ChangeSource, PageCursor, PageRequest};
use news_indexer_shared::{SourceRecord, Watermark};

/// How successive pages are positioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PagingStrategy {
    /// Resume strictly after the last `(changed_at, id)` key seen. Exact even
    /// when many rows share a timestamp.
    #[default]
    Keyset,
    /// Skip `offset` rows, advancing by the page size. Rows inserted behind
    /// the cursor during a scan shift later pages, so boundary rows may be
    /// read twice.
    Offset,
}

impl FromStr for PagingStrategy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyset" => Ok(Self::Keyset),
            "offset" => Ok(Self::Offset),
            other => Err(PipelineError::configuration(format!(
                "Unknown paging strategy {:?}, expected keyset or offset",
                other
            ))),
        }
    }
}

impl fmt::Display for PagingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyset => f.write_str("keyset"),
            Self::Offset => f.write_str("offset"),
        }
    }
}

/// Configuration for the change reader.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Maximum number of records per page, which also bounds each batch.
    pub page_size: usize,
    pub paging: PagingStrategy,
    /// Bound on a single page query.
    pub timeout: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            page_size: 1000,
            paging: PagingStrategy::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Reads pages of changed records from a [`ChangeSource`].
pub struct ChangeReader {
    source: Arc<dyn ChangeSource>,
    config: ReaderConfig,
}

impl ChangeReader {
    /// Create a change reader. Fails if the page size is zero.
    pub fn new(source: Arc<dyn ChangeSource>, config: ReaderConfig) -> Result<Self, PipelineError> {
        if config.page_size == 0 {
            return Err(PipelineError::configuration("Page size must be at least 1"));
        }
        Ok(Self { source, config })
    }

    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    pub fn paging(&self) -> PagingStrategy {
        self.config.paging
    }

    /// Fetch one offset/limit page of records changed strictly after
    /// `after`.
    pub async fn next_page(
        &self,
        after: Option<Watermark>,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<SourceRecord>, PipelineError> {
        self.fetch(&PageRequest::offset(after, offset, limit)).await
    }

    /// Start a scan over everything changed strictly after `after`.
    pub fn scan(&self, after: Option<Watermark>) -> PageScan<'_> {
        let cursor = match self.config.paging {
            PagingStrategy::Keyset => PageCursor::After(None),
            PagingStrategy::Offset => PageCursor::Offset(0),
        };

        PageScan {
            reader: self,
            after,
            cursor,
            pages: 0,
            records: 0,
            max_changed_at: None,
            exhausted: false,
        }
    }

    async fn fetch(&self, request: &PageRequest) -> Result<Vec<SourceRecord>, PipelineError> {
        match tokio::time::timeout(self.config.timeout, self.source.fetch_page(request)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(PipelineError::timeout("Page query")),
        }
    }
}

/// Cursor state for one pass over the changed range.
pub struct PageScan<'a> {
    reader: &'a ChangeReader,
    after: Option<Watermark>,
    cursor: PageCursor,
    pages: u64,
    records: u64,
    max_changed_at: Option<DateTime<Utc>>,
    exhausted: bool,
}

impl PageScan<'_> {
    /// Fetch the next page, or `None` once the range is drained.
    ///
    /// A page shorter than the page size ends the scan without another
    /// round trip.
    #[instrument(skip(self), fields(page = self.pages + 1))]
    pub async fn next_page(&mut self) -> Result<Option<Vec<SourceRecord>>, PipelineError> {
        if self.exhausted {
            return Ok(None);
        }

        let limit = self.reader.page_size();
        let request = PageRequest {
            after: self.after,
            cursor: self.cursor.clone(),
            limit,
        };
        let records = self.reader.fetch(&request).await?;

        if records.len() < limit {
            self.exhausted = true;
        }
        if records.is_empty() {
            return Ok(None);
        }

        self.cursor = match &self.cursor {
            PageCursor::Offset(offset) => PageCursor::Offset(offset + limit as u64),
            // Pages arrive in source order; the last row is the resume point.
            PageCursor::After(previous) => {
                PageCursor::After(records.last().map(SourceRecord::key).or(previous.clone()))
            }
        };

        // Ties and out-of-order rows can appear anywhere in a page.
        let page_max = records.iter().map(|r| r.changed_at).max();
        self.max_changed_at = self.max_changed_at.max(page_max);
        self.pages += 1;
        self.records += records.len() as u64;

        debug!(
            records = records.len(),
            max_changed_at = ?self.max_changed_at,
            "Read page"
        );
        Ok(Some(records))
    }

    /// Pages returned so far.
    pub fn pages(&self) -> u64 {
        self.pages
    }

    /// Records returned so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Largest change timestamp among all records returned so far.
    pub fn max_changed_at(&self) -> Option<DateTime<Utc>> {
        self.max_changed_at
    }
}

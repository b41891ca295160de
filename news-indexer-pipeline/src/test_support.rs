//! In-memory fakes of the repository traits for pipeline tests.

use std::cmp::Ordering as IdOrdering;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use news_indexer_repository::{
    BulkResult, ChangeSource, CheckpointError, CheckpointStore, DocumentResult, PageCursor,
    PageRequest, SearchIndexError, SearchIndexProvider, SourceError,
};
use news_indexer_shared::{IndexDocument, RecordKey, SourceRecord, Watermark};

use crate::orchestrator::ShutdownHandle;

/// Timestamp `secs` seconds after a fixed epoch.
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// An article row changed at `ts(secs)`.
pub fn article(id: &str, secs: i64) -> SourceRecord {
    SourceRecord::new(id, ts(secs))
        .with_field("title", format!("Title {}", id))
        .with_field("published_at", ts(secs))
}

type IdOrder = fn(&str, &str) -> IdOrdering;

/// Table-backed change source honouring [`PageRequest`] semantics.
#[derive(Default)]
pub struct FakeSource {
    rows: Mutex<Vec<SourceRecord>>,
    /// Collation for ids at equal timestamps; bytewise when unset.
    id_order: Option<IdOrder>,
    requests: Mutex<Vec<PageRequest>>,
    failures: Mutex<Vec<SourceError>>,
    shutdown_after: Mutex<Option<(usize, ShutdownHandle)>>,
}

impl FakeSource {
    pub fn with_rows(rows: Vec<SourceRecord>) -> Arc<Self> {
        let source = Self::default();
        *source.rows.lock().unwrap() = rows;
        Arc::new(source)
    }

    /// Order ids with `order` instead of bytewise, for both sorting and
    /// keyset comparison.
    pub fn with_id_order(self: Arc<Self>, order: IdOrder) -> Arc<Self> {
        let rows = self.rows.lock().unwrap().clone();
        Arc::new(Self {
            rows: Mutex::new(rows),
            id_order: Some(order),
            ..Self::default()
        })
    }

    fn compare(&self, a: &RecordKey, b: &RecordKey) -> IdOrdering {
        let by_id = match self.id_order {
            Some(order) => order(&a.id, &b.id),
            None => a.id.cmp(&b.id),
        };
        a.changed_at.cmp(&b.changed_at).then(by_id)
    }

    pub fn insert(&self, record: SourceRecord) {
        self.rows.lock().unwrap().push(record);
    }

    /// Queue an error returned by the next fetch.
    pub fn fail_next(&self, error: SourceError) {
        self.failures.lock().unwrap().push(error);
    }

    /// Trigger `handle` once `pages` fetches have been served.
    pub fn shutdown_after(&self, pages: usize, handle: ShutdownHandle) {
        *self.shutdown_after.lock().unwrap() = Some((pages, handle));
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChangeSource for FakeSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<SourceRecord>, SourceError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(error) = self.failures.lock().unwrap().pop() {
            return Err(error);
        }

        let mut rows: Vec<SourceRecord> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| request.after.map_or(true, |w| r.changed_at > w.timestamp()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| self.compare(&a.key(), &b.key()));

        let page: Vec<SourceRecord> = match &request.cursor {
            PageCursor::Offset(offset) => rows
                .into_iter()
                .skip(*offset as usize)
                .take(request.limit)
                .collect(),
            PageCursor::After(key) => rows
                .into_iter()
                .filter(|r| {
                    key.as_ref()
                        .map_or(true, |k| self.compare(&r.key(), k) == IdOrdering::Greater)
                })
                .take(request.limit)
                .collect(),
        };

        let served = self.requests.lock().unwrap().len();
        if let Some((pages, handle)) = self.shutdown_after.lock().unwrap().as_ref() {
            if served >= *pages {
                handle.trigger();
            }
        }

        Ok(page)
    }
}

/// Search index keeping the latest document per id.
#[derive(Default)]
pub struct FakeIndex {
    documents: Mutex<BTreeMap<String, IndexDocument>>,
    rejected_ids: Mutex<HashSet<String>>,
    failures: Mutex<Vec<SearchIndexError>>,
    ensure_failures: Mutex<Vec<SearchIndexError>>,
    pub bulk_calls: AtomicUsize,
    pub upserted: AtomicUsize,
    pub ensure_calls: AtomicUsize,
}

impl FakeIndex {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reject every upsert of `id` with a throttling status.
    pub fn reject(&self, id: &str) {
        self.rejected_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn accept(&self, id: &str) {
        self.rejected_ids.lock().unwrap().remove(id);
    }

    /// Fail the next bulk request as a whole.
    pub fn fail_next(&self, error: SearchIndexError) {
        self.failures.lock().unwrap().push(error);
    }

    pub fn fail_next_ensure(&self, error: SearchIndexError) {
        self.ensure_failures.lock().unwrap().push(error);
    }

    pub fn snapshot(&self) -> BTreeMap<String, IndexDocument> {
        self.documents.lock().unwrap().clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.documents.lock().unwrap().keys().cloned().collect()
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    pub fn upserted(&self) -> usize {
        self.upserted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchIndexProvider for FakeIndex {
    async fn ensure_index(&self) -> Result<(), SearchIndexError> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        match self.ensure_failures.lock().unwrap().pop() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn bulk_upsert(&self, documents: &[IndexDocument]) -> Result<BulkResult, SearchIndexError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failures.lock().unwrap().pop() {
            return Err(error);
        }

        let rejected = self.rejected_ids.lock().unwrap().clone();
        let mut stored = self.documents.lock().unwrap();
        let results = documents
            .iter()
            .map(|doc| {
                if rejected.contains(&doc.id) {
                    DocumentResult::failed(
                        doc.id.clone(),
                        SearchIndexError::document_rejected(429, "es_rejected_execution_exception"),
                    )
                } else {
                    stored.insert(doc.id.clone(), doc.clone());
                    self.upserted.fetch_add(1, Ordering::SeqCst);
                    DocumentResult::succeeded(doc.id.clone())
                }
            })
            .collect();

        Ok(BulkResult::from_results(results))
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        Ok(true)
    }
}

/// Checkpoint slot that can be poisoned with unreadable content or made to
/// fail writes.
#[derive(Default)]
pub struct FakeCheckpoints {
    value: Mutex<Option<Watermark>>,
    corrupt: Mutex<Option<String>>,
    save_failures: Mutex<Vec<CheckpointError>>,
    history: Mutex<Vec<Watermark>>,
}

impl FakeCheckpoints {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_watermark(watermark: Watermark) -> Arc<Self> {
        let store = Self::default();
        *store.value.lock().unwrap() = Some(watermark);
        Arc::new(store)
    }

    /// Make the slot hold unparseable content until the next save.
    pub fn corrupt(&self, content: &str) {
        *self.corrupt.lock().unwrap() = Some(content.to_string());
    }

    pub fn fail_next_save(&self, error: CheckpointError) {
        self.save_failures.lock().unwrap().push(error);
    }

    pub fn current(&self) -> Option<Watermark> {
        *self.value.lock().unwrap()
    }

    /// Every watermark successfully saved, in order.
    pub fn history(&self) -> Vec<Watermark> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl CheckpointStore for FakeCheckpoints {
    async fn try_load(&self) -> Result<Option<Watermark>, CheckpointError> {
        if let Some(content) = self.corrupt.lock().unwrap().as_ref() {
            return Err(CheckpointError::corrupt(content.clone()));
        }
        Ok(self.current())
    }

    async fn save(&self, watermark: Watermark) -> Result<(), CheckpointError> {
        if let Some(error) = self.save_failures.lock().unwrap().pop() {
            return Err(error);
        }
        *self.corrupt.lock().unwrap() = None;
        *self.value.lock().unwrap() = Some(watermark);
        self.history.lock().unwrap().push(watermark);
        Ok(())
    }
}

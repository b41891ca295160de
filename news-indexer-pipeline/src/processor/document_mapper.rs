//! Document mapper implementation.
//!
//! Turns [`SourceRecord`]s into [`IndexDocument`]s. Every date or time value
//! is rendered in the canonical timestamp form, whatever column type it was
//! read from.

use chrono::NaiveTime;
use serde_json::{Map, Number, Value};
use tracing::{debug, instrument};

use news_indexer_shared::{format_timestamp, Batch, FieldValue, IndexDocument, SourceRecord};

/// Pure mapper from source records to index documents.
///
/// The document is keyed by the record identifier and carries the record's
/// fields as its source. The identifier and change timestamp are not copied
/// into the source unless the table exposes them as regular columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentMapper;

impl DocumentMapper {
    pub fn new() -> Self {
        Self
    }

    /// Map a single record.
    pub fn map(&self, record: &SourceRecord) -> IndexDocument {
        let source: Map<String, Value> = record
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), to_json(value)))
            .collect();

        IndexDocument::new(record.id.clone(), source)
    }

    /// Map a page of records into a batch, preserving order.
    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub fn map_page(&self, records: &[SourceRecord]) -> Batch {
        let batch: Batch = records.iter().map(|record| self.map(record)).collect();
        debug!(document_count = batch.len(), "Mapped page");
        batch
    }
}

fn to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Integer(n) => Value::from(*n),
        // JSON has no NaN or infinity.
        FieldValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Json(v) => v.clone(),
        FieldValue::Timestamp(ts) => Value::String(format_timestamp(ts)),
        FieldValue::LocalTimestamp(naive) => Value::String(format_timestamp(&naive.and_utc())),
        FieldValue::Date(date) => {
            Value::String(format_timestamp(&date.and_time(NaiveTime::MIN).and_utc()))
        }
    }
}

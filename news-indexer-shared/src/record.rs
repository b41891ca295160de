//! Rows read from the system of record.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single column value as decoded from the source store.
///
/// Date and time values keep their native representation here; the
/// document mapper is responsible for rendering them canonically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
    /// Timestamp with a known offset.
    Timestamp(DateTime<Utc>),
    /// Timestamp without an offset; treated as UTC.
    LocalTimestamp(NaiveDateTime),
    Date(NaiveDate),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Position of a record in change order: timestamp first, identifier as
/// the tie-breaker.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub changed_at: DateTime<Utc>,
    pub id: String,
}

/// One row from the system of record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Opaque identifier, reused as the index document id.
    pub id: String,
    /// Change timestamp that drives incremental extraction.
    pub changed_at: DateTime<Utc>,
    /// Named column values.
    pub fields: BTreeMap<String, FieldValue>,
}

impl SourceRecord {
    /// Create a record with no fields.
    pub fn new(id: impl Into<String>, changed_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            changed_at,
            fields: BTreeMap::new(),
        }
    }

    /// Add a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The paging key of this record.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            changed_at: self.changed_at,
            id: self.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_key_orders_by_time_then_id() {
        let t1 = Utc.timestamp_opt(1, 0).unwrap();
        let t2 = Utc.timestamp_opt(2, 0).unwrap();

        let mut keys = vec![
            SourceRecord::new("b", t1).key(),
            SourceRecord::new("a", t2).key(),
            SourceRecord::new("a", t1).key(),
        ];
        keys.sort();

        let ordered: Vec<(i64, &str)> = keys
            .iter()
            .map(|k| (k.changed_at.timestamp(), k.id.as_str()))
            .collect();
        assert_eq!(ordered, vec![(1, "a"), (1, "b"), (2, "a")]);
    }

    #[test]
    fn test_optional_field_values() {
        let record = SourceRecord::new("1", Utc::now())
            .with_field("author", None::<String>)
            .with_field("title", Some("Hello"));

        assert_eq!(record.fields["author"], FieldValue::Null);
        assert_eq!(record.fields["title"], FieldValue::Text("Hello".to_string()));
    }
}

//! # News Indexer Shared
//!
//! Shared types used across the news indexer crates: the persisted
//! [`Watermark`], the rows read from the system of record
//! ([`SourceRecord`]) and the documents written to the search index
//! ([`IndexDocument`], [`Batch`]).

mod document;
mod record;
mod watermark;

pub use document::{Batch, IndexDocument};
pub use record::{FieldValue, RecordKey, SourceRecord};
pub use watermark::{format_timestamp, Watermark, WatermarkParseError};

//! Watermark type and the canonical timestamp format.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Layouts accepted for timestamps written without an offset.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Render a timestamp in the canonical form used for both the index and the
/// checkpoint: RFC 3339, UTC, microsecond precision, `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Error returned when a persisted watermark cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid watermark {input:?}: expected an ISO-8601 timestamp")]
pub struct WatermarkParseError {
    input: String,
}

/// The latest change timestamp known to be fully propagated to the index.
///
/// "No watermark" is modelled as `Option<Watermark>::None` and means a full
/// sync from the beginning of the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    /// Create a watermark at the given change timestamp.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp)
    }

    /// The change timestamp this watermark points at.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    /// Compute the watermark to persist after a cycle.
    ///
    /// Returns `Some` only when `observed` is strictly newer than `current`,
    /// so a cycle can never move the watermark backwards.
    pub fn advance(current: Option<Watermark>, observed: Option<DateTime<Utc>>) -> Option<Watermark> {
        let observed = Watermark::new(observed?);
        match current {
            Some(current) if observed <= current => None,
            _ => Some(observed),
        }
    }
}

impl From<DateTime<Utc>> for Watermark {
    fn from(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp)
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_timestamp(&self.0))
    }
}

impl FromStr for Watermark {
    type Err = WatermarkParseError;

    /// Parses RFC 3339 text with any offset, and naive ISO-8601 text which
    /// is taken to be UTC.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self(ts.with_timezone(&Utc)));
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
            .map(|naive| Self(naive.and_utc()))
            .ok_or_else(|| WatermarkParseError {
                input: trimmed.to_string(),
            })
    }
}

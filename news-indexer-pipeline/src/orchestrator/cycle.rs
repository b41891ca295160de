//! Cycle state machine and per-cycle reporting.

use std::fmt;
use std::str::FromStr;

use tracing::debug;
use uuid::Uuid;

use crate::errors::PipelineError;
use news_indexer_repository::BulkResult;
use news_indexer_shared::Watermark;

/// Where a sync cycle currently is.
///
/// `Idle -> Reading -> Loading -> ... -> Checkpointing -> Idle`, with
/// `Failed` reachable from any step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    #[default]
    Idle,
    Reading,
    Loading,
    Checkpointing,
    Failed,
}

impl CycleState {
    pub(crate) fn transition(&mut self, next: CycleState) {
        if *self != next {
            debug!(from = %self, to = %next, "Cycle state");
            *self = next;
        }
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Reading => "reading",
            Self::Loading => "loading",
            Self::Checkpointing => "checkpointing",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What to do with the watermark when some documents of a cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialFailurePolicy {
    /// Advance to the newest record read. Failed documents are only
    /// retried if their row changes again.
    #[default]
    Advance,
    /// Keep the previous watermark so the whole range is re-read next cycle.
    Withhold,
}

impl FromStr for PartialFailurePolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "advance" => Ok(Self::Advance),
            "withhold" => Ok(Self::Withhold),
            other => Err(PipelineError::configuration(format!(
                "Unknown partial failure policy {:?}, expected advance or withhold",
                other
            ))),
        }
    }
}

impl fmt::Display for PartialFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advance => f.write_str("advance"),
            Self::Withhold => f.write_str("withhold"),
        }
    }
}

/// How a cycle that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Records were read and the checkpoint step ran.
    Completed,
    /// Nothing changed since the watermark.
    NoChanges,
    /// Shutdown was requested between pages; nothing was checkpointed.
    Interrupted,
}

/// Summary of one sync cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub pages: u64,
    pub records_read: u64,
    pub documents_upserted: u64,
    pub documents_failed: u64,
    pub previous_watermark: Option<Watermark>,
    pub new_watermark: Option<Watermark>,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    pub(crate) fn new(cycle_id: Uuid, previous_watermark: Option<Watermark>) -> Self {
        Self {
            cycle_id,
            pages: 0,
            records_read: 0,
            documents_upserted: 0,
            documents_failed: 0,
            previous_watermark,
            new_watermark: previous_watermark,
            outcome: CycleOutcome::NoChanges,
        }
    }

    pub(crate) fn record_page(&mut self, records: usize, result: &BulkResult) {
        self.pages += 1;
        self.records_read += records as u64;
        self.documents_upserted += result.succeeded as u64;
        self.documents_failed += result.failed as u64;
    }

    /// Whether this cycle moved the watermark.
    pub fn advanced(&self) -> bool {
        self.new_watermark != self.previous_watermark
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use news_indexer_repository::DocumentResult;

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "advance".parse::<PartialFailurePolicy>().unwrap(),
            PartialFailurePolicy::Advance
        );
        assert_eq!(
            "Withhold".parse::<PartialFailurePolicy>().unwrap(),
            PartialFailurePolicy::Withhold
        );
        assert!("skip".parse::<PartialFailurePolicy>().is_err());
    }

    #[test]
    fn test_report_accumulates_pages() {
        let mut report = CycleReport::new(Uuid::new_v4(), None);
        report.record_page(2, &BulkResult::from_results(vec![
            DocumentResult::succeeded("1"),
            DocumentResult::succeeded("2"),
        ]));
        report.record_page(1, &BulkResult::from_results(vec![DocumentResult::failed(
            "3",
            news_indexer_repository::SearchIndexError::document_rejected(400, "mapper_parsing_exception"),
        )]));

        assert_eq!(report.pages, 2);
        assert_eq!(report.records_read, 3);
        assert_eq!(report.documents_upserted, 2);
        assert_eq!(report.documents_failed, 1);
        assert!(!report.advanced());
    }

    #[test]
    fn test_state_transition() {
        let mut state = CycleState::default();
        state.transition(CycleState::Reading);
        assert_eq!(state, CycleState::Reading);
        assert_eq!(state.to_string(), "reading");
    }
}

//! Pass report and timings.
//!
//! Every completed pass produces a [`PassReport`]: what was looked at, what was recorded, and
//! every recoverable error met on the way. The report is returned to the caller and summarised
//! in one `info!` line; the individual errors are logged where they happen.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::PassError;
use crate::{BoardId, Completion};

/// Wall-clock time spent in each stage of a pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassMetrics {
    pub total: Duration,
    /// Loading boards, items, teams, rosters and guests.
    pub config: Duration,
    /// Clan and guest activity feeds, including waiting on timeouts.
    pub fetch: Duration,
    /// Text matching and team resolution.
    pub matching: Duration,
    /// Store lookups and inserts.
    pub commit: Duration,
}

#[derive(Debug, Clone)]
pub struct PassReport {
    /// The pass's notion of "now"; becomes the watermark.
    pub started_at: DateTime<Utc>,
    pub live_boards: Vec<BoardId>,
    /// Activities returned by all feeds, after merging duplicates.
    pub activities_fetched: usize,
    /// Activities inside at least one board window.
    pub activities_considered: usize,
    /// `(item, team)` pairs produced by matching, before dedupe and store checks.
    pub matched_pairs: usize,
    pub completions: Vec<Completion>,
    /// Pairs skipped because a completion already existed.
    pub already_complete: usize,
    pub errors: Vec<PassError>,
    pub metrics: PassMetrics,
}

impl PassReport {
    pub(crate) fn new(started_at: DateTime<Utc>, live_boards: Vec<BoardId>) -> Self {
        PassReport {
            started_at,
            live_boards,
            activities_fetched: 0,
            activities_considered: 0,
            matched_pairs: 0,
            completions: Vec::new(),
            already_complete: 0,
            errors: Vec::new(),
            metrics: PassMetrics::default(),
        }
    }

    pub fn summary(&self) -> String {
        format!("{} completions found, {} errors", self.completions.len(), self.errors.len())
    }
}

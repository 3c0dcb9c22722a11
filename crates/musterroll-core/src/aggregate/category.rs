use std::collections::{HashMap, HashSet};

use chrono::Duration;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::models::{AttendanceLogEntry, CategoryCounts};
use crate::store::codec::{summary_enrollment_id, write_summary_counts};
use crate::store::{tables, Sheet, Workbook};

use super::lookup::EventTypeMap;

/// Lock resource guarding category runs
pub const CATEGORY_LOCK: &str = "run-attendance-categories";

/// Every entry counts once regardless of its status.
pub const ENTRY_WEIGHT: u32 = 1;

/// Per-cadet bucket counts. Entries missing either id are skipped.
pub fn tally_categories(
    log: &[AttendanceLogEntry],
    types: &EventTypeMap,
) -> HashMap<String, CategoryCounts> {
    let mut tallies: HashMap<String, CategoryCounts> = HashMap::new();
    for entry in log.iter().filter(|e| e.has_event() && e.has_cadet()) {
        let bucket = types.resolve(&entry.event_id).bucket();
        tallies
            .entry(entry.enrollment_id.clone())
            .or_default()
            .add(bucket, ENTRY_WEIGHT);
    }
    tallies
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Summary rows whose derived columns were overwritten
    pub updated: usize,
    /// Summary rows with no log entries, left as they were
    pub untouched: usize,
    /// Tallied cadets with no summary row
    pub dropped: usize,
}

/// Overwrite the derived columns of every summary row that has a tally.
/// Rows are never added or removed.
pub fn merge_into_summary(
    summary: &mut Sheet,
    tallies: &HashMap<String, CategoryCounts>,
) -> MergeStats {
    let mut stats = MergeStats::default();
    let mut matched: HashSet<&str> = HashSet::new();

    for row in summary.records_mut() {
        let enrollment_id = summary_enrollment_id(row);
        match tallies.get_key_value(enrollment_id.as_str()) {
            Some((key, counts)) => {
                write_summary_counts(row, counts);
                stats.updated += 1;
                matched.insert(key.as_str());
            }
            None => stats.untouched += 1,
        }
    }

    stats.dropped = tallies.len() - matched.len();
    stats
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub cadets: usize,
    #[serde(flatten)]
    pub merge: MergeStats,
}

impl std::fmt::Display for CategoryReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} cadets tallied, {} rows updated, {} untouched, {} without a summary row",
            self.cadets, self.merge.updated, self.merge.untouched, self.merge.dropped
        )
    }
}

/// Refreshes the derived columns of the per-cadet attendance summary.
pub struct CategoryAggregator<'a, W: Workbook> {
    workbook: &'a W,
    config: &'a Config,
}

impl<'a, W: Workbook> CategoryAggregator<'a, W> {
    pub fn new(workbook: &'a W, config: &'a Config) -> Self {
        Self { workbook, config }
    }

    pub fn run(&self) -> Result<CategoryReport> {
        let sheets = &self.config.sheets;
        let _guard = self.workbook.try_lock(
            CATEGORY_LOCK,
            Duration::minutes(self.config.run_lock_stale_minutes),
        )?;

        let log = tables::attendance_log(self.workbook, sheets)?;
        let events = tables::events(self.workbook, sheets)?;
        let mut summary = self.workbook.require_sheet(&sheets.attendance_summary)?;
        debug!(
            entries = log.len(),
            events = events.len(),
            rows = summary.record_count(),
            "Category inputs loaded"
        );

        let types = EventTypeMap::from_events(&events);
        let tallies = tally_categories(&log, &types);
        let merge = merge_into_summary(&mut summary, &tallies);
        self.workbook.write_sheet(&sheets.attendance_summary, &summary)?;

        if merge.dropped > 0 {
            debug!(dropped = merge.dropped, "Cadets in the log have no summary row");
        }
        let report = CategoryReport {
            cadets: tallies.len(),
            merge,
        };
        info!(
            cadets = report.cadets,
            updated = merge.updated,
            untouched = merge.untouched,
            "Attendance categories refreshed"
        );
        Ok(report)
    }
}

use std::collections::HashMap;

use chrono::Duration;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::models::{AttendanceLogEntry, EventStrengthRow};
use crate::store::codec::encode_strength;
use crate::store::layout::event_strength;
use crate::store::{tables, Sheet, Workbook};
use crate::utils::calendar_date;

use super::lookup::CohortMap;

/// Lock resource guarding strength runs
pub const STRENGTH_LOCK: &str = "run-event-strength";

/// Count log entries per event, splitting by cohort where the cadet resolves.
///
/// Entries are visited in storage order; an event's date comes from the first
/// entry seen for it. Rows are returned in order of first appearance.
pub fn compute_strength(log: &[AttendanceLogEntry], cohorts: &CohortMap) -> Vec<EventStrengthRow> {
    let mut order: Vec<String> = Vec::new();
    let mut stats: HashMap<String, EventStrengthRow> = HashMap::new();

    for entry in log.iter().filter(|e| e.has_event()) {
        let row = stats.entry(entry.event_id.clone()).or_insert_with(|| {
            order.push(entry.event_id.clone());
            EventStrengthRow::empty(entry.event_id.as_str(), calendar_date(&entry.timestamp))
        });
        row.total += 1;
        if let Some(year) = cohorts.resolve(&entry.enrollment_id) {
            row.bump_year(year);
        }
    }

    order
        .into_iter()
        .filter_map(|event_id| stats.remove(&event_id))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrengthReport {
    pub events: usize,
    pub entries: u32,
    /// Entries whose cadet is on no roster partition
    pub unresolved: u32,
}

impl std::fmt::Display for StrengthReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} events, {} entries ({} unresolved)",
            self.events, self.entries, self.unresolved
        )
    }
}

/// Rebuilds the event strength sheet from the attendance log and roster.
pub struct StrengthAggregator<'a, W: Workbook> {
    workbook: &'a W,
    config: &'a Config,
}

impl<'a, W: Workbook> StrengthAggregator<'a, W> {
    pub fn new(workbook: &'a W, config: &'a Config) -> Self {
        Self { workbook, config }
    }

    /// Every input is read before the summary is touched, so a failed read
    /// leaves the previous summary in place.
    pub fn run(&self) -> Result<StrengthReport> {
        let sheets = &self.config.sheets;
        let _guard = self.workbook.try_lock(
            STRENGTH_LOCK,
            Duration::minutes(self.config.run_lock_stale_minutes),
        )?;

        let cadets = tables::roster(self.workbook, sheets)?;
        let log = tables::attendance_log(self.workbook, sheets)?;
        let cohorts = CohortMap::from_cadets(&cadets);
        debug!(cadets = cohorts.len(), entries = log.len(), "Strength inputs loaded");

        let rows = compute_strength(&log, &cohorts);

        let mut summary = match self.workbook.read_sheet(&sheets.event_strength)? {
            Some(sheet) if sheet.header().is_some_and(|h| !h.is_empty()) => sheet,
            _ => Sheet::with_header(&event_strength::HEADER),
        };
        summary.replace_records(rows.iter().map(encode_strength).collect());
        self.workbook.write_sheet(&sheets.event_strength, &summary)?;

        let report = StrengthReport {
            events: rows.len(),
            entries: rows.iter().map(|r| r.total).sum(),
            unresolved: rows.iter().map(EventStrengthRow::unresolved).sum(),
        };
        info!(
            events = report.events,
            entries = report.entries,
            unresolved = report.unresolved,
            "Event strength refreshed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{CadetRecord, CohortYear};
    use crate::store::codec::{decode_strength, encode_cadet, encode_log_entry};
    use crate::store::layout::{attendance_log, roster};
    use crate::store::{Cell, MemoryWorkbook};

    fn entry(timestamp: &str, event_id: &str, enrollment_id: &str) -> AttendanceLogEntry {
        AttendanceLogEntry {
            timestamp: timestamp.to_string(),
            event_id: event_id.to_string(),
            enrollment_id: enrollment_id.to_string(),
            name: None,
            status: None,
        }
    }

    fn cohorts(pairs: &[(&str, CohortYear)]) -> CohortMap {
        let cadets: Vec<CadetRecord> =
            pairs.iter().map(|(id, y)| CadetRecord::new(*id, *y)).collect();
        CohortMap::from_cadets(&cadets)
    }

    fn roster_sheet(ids: &[&str], year: CohortYear) -> Sheet {
        let mut sheet = Sheet::with_header(&roster::HEADER);
        for (i, id) in ids.iter().enumerate() {
            sheet.push(encode_cadet(i + 1, &CadetRecord::new(*id, year)));
        }
        sheet
    }

    fn log_sheet(entries: &[AttendanceLogEntry]) -> Sheet {
        let mut sheet = Sheet::with_header(&attendance_log::HEADER);
        for e in entries {
            sheet.push(encode_log_entry(e));
        }
        sheet
    }

    fn strength_rows(workbook: &MemoryWorkbook) -> Vec<EventStrengthRow> {
        workbook
            .read_sheet("Event_Strength")
            .unwrap()
            .unwrap()
            .records()
            .iter()
            .filter_map(|r| decode_strength(r))
            .collect()
    }

    #[test]
    fn test_two_cohorts_one_event() {
        let log = vec![
            entry("2026-01-15 08:00:00", "EVT1", "C1"),
            entry("2026-01-15 08:05:00", "EVT1", "C2"),
        ];
        let map = cohorts(&[("C1", CohortYear::First), ("C2", CohortYear::Second)]);

        let rows = compute_strength(&log, &map);
        assert_eq!(
            rows,
            vec![EventStrengthRow {
                event_id: "EVT1".to_string(),
                date: "2026-01-15".to_string(),
                total: 2,
                year1: 1,
                year2: 1,
                year3: 0,
            }]
        );
    }

    #[test]
    fn test_unknown_cadet_counts_in_total_only() {
        let log = vec![entry("2026-01-15 08:00:00", "EVT1", "GHOST"), entry("", "EVT1", "C3")];
        let map = cohorts(&[("C3", CohortYear::Third)]);

        let rows = compute_strength(&log, &map);
        assert_eq!(rows[0].total, 2);
        assert_eq!(rows[0].year3, 1);
        assert_eq!(rows[0].year1 + rows[0].year2 + rows[0].year3, 1);
    }

    #[test]
    fn test_first_timestamp_sets_date() {
        let log = vec![
            entry("2026-02-01 23:50:00", "EVT1", "C1"),
            entry("2026-02-02 00:10:00", "EVT1", "C1"),
        ];
        let rows = compute_strength(&log, &CohortMap::default());
        assert_eq!(rows[0].date, "2026-02-01");
    }

    #[test]
    fn test_duplicates_counted_and_blank_event_skipped() {
        let log = vec![
            entry("t", "EVT1", "C1"),
            entry("t", "EVT1", "C1"),
            entry("t", "", "C1"),
            entry("t", "EVT2", "C1"),
        ];
        let map = cohorts(&[("C1", CohortYear::First)]);
        let rows = compute_strength(&log, &map);
        let ids: Vec<&str> = rows.iter().map(|r| r.event_id.as_str()).collect();
        assert_eq!(ids, vec!["EVT1", "EVT2"]);
        assert_eq!(rows[0].total, 2);
        assert_eq!(rows[0].year1, 2);
    }

    #[test]
    fn test_run_replaces_stale_rows() {
        let mut stale = Sheet::with_header(&event_strength::HEADER);
        stale.push(vec![Cell::from("EVT-GONE"), Cell::from("2025-12-01"), Cell::Int(40)]);
        let workbook = MemoryWorkbook::new()
            .with_sheet("1st Year", roster_sheet(&["C1"], CohortYear::First))
            .with_sheet("Attendance_Logs", log_sheet(&[entry("2026-01-15 08:00:00", "EVT1", "C1")]))
            .with_sheet("Event_Strength", stale);
        let config = Config::default();

        let report = StrengthAggregator::new(&workbook, &config).run().unwrap();
        assert_eq!(report.events, 1);
        assert_eq!(report.unresolved, 0);

        let rows = strength_rows(&workbook);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_id, "EVT1");
        assert_eq!(rows[0].year1, 1);
    }

    #[test]
    fn test_run_is_idempotent() {
        let workbook = MemoryWorkbook::new()
            .with_sheet("2nd Year", roster_sheet(&["C2"], CohortYear::Second))
            .with_sheet(
                "Attendance_Logs",
                log_sheet(&[
                    entry("2026-01-15 08:00:00", "EVT1", "C2"),
                    entry("2026-01-16 08:00:00", "EVT2", "X"),
                ]),
            );
        let config = Config::default();
        let aggregator = StrengthAggregator::new(&workbook, &config);

        aggregator.run().unwrap();
        let first = workbook.read_sheet("Event_Strength").unwrap();
        aggregator.run().unwrap();
        let second = workbook.read_sheet("Event_Strength").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_log_leaves_summary_untouched() {
        let mut existing = Sheet::with_header(&event_strength::HEADER);
        existing.push(vec![Cell::from("EVT1"), Cell::from("2026-01-15"), Cell::Int(9)]);
        let workbook = MemoryWorkbook::new()
            .with_sheet("1st Year", roster_sheet(&["C1"], CohortYear::First))
            .with_sheet("Event_Strength", existing.clone());
        let config = Config::default();

        let err = StrengthAggregator::new(&workbook, &config).run().unwrap_err();
        assert!(matches!(err, Error::MissingDependency(ref s) if s == "Attendance_Logs"));
        assert_eq!(workbook.read_sheet("Event_Strength").unwrap(), Some(existing));
    }

    #[test]
    fn test_missing_roster_fails_before_write() {
        let workbook = MemoryWorkbook::new()
            .with_sheet("Attendance_Logs", log_sheet(&[entry("t", "EVT1", "C1")]));
        let config = Config::default();

        let err = StrengthAggregator::new(&workbook, &config).run().unwrap_err();
        assert!(err.is_missing_dependency());
        assert!(workbook.read_sheet("Event_Strength").unwrap().is_none());
    }

    #[test]
    fn test_busy_when_run_in_progress() {
        let workbook = MemoryWorkbook::new()
            .with_sheet("1st Year", roster_sheet(&["C1"], CohortYear::First))
            .with_sheet("Attendance_Logs", log_sheet(&[]));
        let config = Config::default();
        let _held = workbook.try_lock(STRENGTH_LOCK, Duration::minutes(30)).unwrap();

        let err = StrengthAggregator::new(&workbook, &config).run().unwrap_err();
        assert!(matches!(err, Error::Busy(_)));
    }
}

//! Read-only views over the workbook for the dashboard and the CLI.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{
    ActiveEvent, AttendanceStatus, AttendanceSummaryRow, CadetRecord, EventRoster, EventStrengthRow,
    RosterLine, RosterStatus, TimelineEntry, UnitStrength,
};
use crate::store::codec::{decode_strength, decode_summary};
use crate::store::{tables, Workbook};
use crate::utils::{age_display, DATE_FORMAT};

/// When a summary table was last written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetAge {
    pub sheet: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SheetAge {
    /// "5m ago", or "never" when the sheet has not been written
    pub fn age(&self) -> String {
        match self.updated_at {
            Some(at) => age_display((Utc::now() - at).num_minutes()),
            None => "never".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkbookStatus {
    pub strength: SheetAge,
    pub summary: SheetAge,
}

impl WorkbookStatus {
    /// Most recent write across both summary tables
    pub fn last_updated(&self) -> String {
        [&self.strength, &self.summary]
            .into_iter()
            .filter(|s| s.updated_at.is_some())
            .max_by_key(|s| s.updated_at)
            .map(SheetAge::age)
            .unwrap_or_else(|| "never".to_string())
    }
}

pub struct Reports<'a, W: Workbook> {
    workbook: &'a W,
    config: &'a Config,
}

impl<'a, W: Workbook> Reports<'a, W> {
    pub fn new(workbook: &'a W, config: &'a Config) -> Self {
        Self { workbook, config }
    }

    pub fn strength_summary(&self) -> Result<Vec<EventStrengthRow>> {
        let sheet = self.workbook.require_sheet(&self.config.sheets.event_strength)?;
        Ok(sheet.records().iter().filter_map(|r| decode_strength(r)).collect())
    }

    pub fn attendance_summary(&self) -> Result<Vec<AttendanceSummaryRow>> {
        let sheet = self.workbook.require_sheet(&self.config.sheets.attendance_summary)?;
        Ok(sheet.records().iter().filter_map(|r| decode_summary(r)).collect())
    }

    /// Newest first; undated events go last in catalog order.
    pub fn recent_events(&self, limit: usize) -> Result<Vec<TimelineEntry>> {
        let mut events = tables::events(self.workbook, &self.config.sheets)?;
        events.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(events
            .into_iter()
            .take(limit)
            .map(|e| TimelineEntry {
                date: e
                    .date
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
                event_id: e.event_id,
                title: e.title,
                event_type: e.event_type,
            })
            .collect())
    }

    /// The last `Active` event in the catalog with its running strength. An
    /// event not yet aggregated gets a zero row.
    pub fn active_event(&self) -> Result<ActiveEvent> {
        let events = tables::events(self.workbook, &self.config.sheets)?;
        let Some(event) = events.into_iter().rev().find(|e| e.status.is_active()) else {
            return Ok(ActiveEvent::None);
        };

        let strength = self
            .workbook
            .read_sheet(&self.config.sheets.event_strength)?
            .and_then(|sheet| {
                sheet
                    .records()
                    .iter()
                    .filter_map(|r| decode_strength(r))
                    .find(|row| row.event_id == event.event_id)
            })
            .unwrap_or_else(|| {
                let date = event
                    .date
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default();
                EventStrengthRow::empty(event.event_id.as_str(), date)
            });

        Ok(ActiveEvent::Live { event, strength })
    }

    /// Every roster cadet with their status at `event_id`, seniors first.
    /// A cadet's latest log entry for the event decides the status; no entry
    /// means absent.
    pub fn event_roster(&self, event_id: &str) -> Result<EventRoster> {
        let event_id = event_id.trim();
        let events = tables::events(self.workbook, &self.config.sheets)?;
        let event = events
            .into_iter()
            .find(|e| e.event_id == event_id)
            .ok_or_else(|| Error::UnknownEvent(event_id.to_string()))?;

        let cadets = unique_cadets(tables::roster(self.workbook, &self.config.sheets)?);
        let log = tables::attendance_log(self.workbook, &self.config.sheets)?;

        let mut latest: HashMap<&str, AttendanceStatus> = HashMap::new();
        for entry in log.iter().filter(|e| e.event_id == event_id && e.has_cadet()) {
            latest.insert(entry.enrollment_id.as_str(), entry.status_or_present());
        }

        let lines = cadets
            .into_iter()
            .map(|cadet| {
                let status = latest
                    .get(cadet.enrollment_id.as_str())
                    .cloned()
                    .map(RosterStatus::from)
                    .unwrap_or(RosterStatus::Absent);
                RosterLine { cadet, status }
            })
            .collect();

        Ok(EventRoster { event, lines })
    }

    /// The enrolled cadets, one entry each, seniors first.
    pub fn cadets(&self) -> Result<Vec<CadetRecord>> {
        Ok(unique_cadets(tables::roster(self.workbook, &self.config.sheets)?))
    }

    /// Enrolled head-count per cohort plus the unit total.
    pub fn unit_strength(&self) -> Result<UnitStrength> {
        Ok(UnitStrength::from_roster(&self.cadets()?))
    }

    pub fn status(&self) -> Result<WorkbookStatus> {
        let sheets = &self.config.sheets;
        Ok(WorkbookStatus {
            strength: self.sheet_age(&sheets.event_strength)?,
            summary: self.sheet_age(&sheets.attendance_summary)?,
        })
    }

    fn sheet_age(&self, name: &str) -> Result<SheetAge> {
        Ok(SheetAge {
            sheet: name.to_string(),
            updated_at: self.workbook.updated_at(name)?,
        })
    }
}

/// One entry per enrollment id, the later partition winning, ordered 3rd,
/// 2nd, 1st year and by roster position within a year.
fn unique_cadets(cadets: Vec<CadetRecord>) -> Vec<CadetRecord> {
    let mut last_index: HashMap<String, usize> = HashMap::new();
    for (idx, cadet) in cadets.iter().enumerate() {
        last_index.insert(cadet.enrollment_id.clone(), idx);
    }
    let mut unique: Vec<CadetRecord> = cadets
        .into_iter()
        .enumerate()
        .filter(|(idx, cadet)| last_index.get(&cadet.enrollment_id) == Some(idx))
        .map(|(_, cadet)| cadet)
        .collect();
    unique.sort_by(|a, b| b.cohort.cmp(&a.cohort));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CohortYear, EventRecord, EventStatus, EventType};
    use crate::store::codec::{encode_cadet, encode_event, encode_strength};
    use crate::store::layout::{attendance_log, event_master, event_strength, roster};
    use crate::store::{Cell, MemoryWorkbook, Sheet};
    use chrono::NaiveDate;

    fn event(event_id: &str, date: Option<(i32, u32, u32)>, status: EventStatus) -> EventRecord {
        EventRecord {
            event_id: event_id.to_string(),
            title: format!("Event {event_id}"),
            event_type: EventType::SocialDrive,
            type_label: "Social Drive".to_string(),
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            time: None,
            created_at: None,
            status,
        }
    }

    fn catalog(events: &[EventRecord]) -> Sheet {
        let mut sheet = Sheet::with_header(&event_master::HEADER);
        for e in events {
            sheet.push(encode_event(e));
        }
        sheet
    }

    fn roster_sheet(ids: &[&str], year: CohortYear) -> Sheet {
        let mut sheet = Sheet::with_header(&roster::HEADER);
        for (i, id) in ids.iter().enumerate() {
            sheet.push(encode_cadet(i + 1, &CadetRecord::new(*id, year)));
        }
        sheet
    }

    fn log_sheet(rows: &[(&str, &str, &str)]) -> Sheet {
        let mut sheet = Sheet::with_header(&attendance_log::HEADER);
        for (event_id, enrollment_id, status) in rows {
            sheet.push(vec![
                Cell::from("2026-01-15 08:00:00"),
                Cell::from(*event_id),
                Cell::from(*enrollment_id),
                Cell::Empty,
                Cell::from(*status),
            ]);
        }
        sheet
    }

    fn with_config<T>(
        workbook: &MemoryWorkbook,
        f: impl FnOnce(Reports<'_, MemoryWorkbook>) -> T,
    ) -> T {
        let config = Config::default();
        f(Reports::new(workbook, &config))
    }

    #[test]
    fn test_recent_events_newest_first_undated_last() {
        let workbook = MemoryWorkbook::new().with_sheet(
            "Event_Master",
            catalog(&[
                event("EVT1", Some((2026, 1, 10)), EventStatus::Ended),
                event("EVT2", None, EventStatus::Ended),
                event("EVT3", Some((2026, 2, 1)), EventStatus::Ended),
                event("EVT4", Some((2025, 12, 1)), EventStatus::Ended),
            ]),
        );

        let recent = with_config(&workbook, |r| r.recent_events(3)).unwrap();
        let ids: Vec<&str> = recent.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["EVT3", "EVT1", "EVT4"]);
        assert_eq!(recent[0].date, "2026-02-01");

        let all = with_config(&workbook, |r| r.recent_events(10)).unwrap();
        assert_eq!(all.last().map(|e| e.event_id.as_str()), Some("EVT2"));
        assert_eq!(all.last().map(|e| e.date.as_str()), Some(""));
    }

    #[test]
    fn test_active_event_with_zero_strength() {
        let workbook = MemoryWorkbook::new().with_sheet(
            "Event_Master",
            catalog(&[
                event("EVT1", Some((2026, 1, 10)), EventStatus::Active),
                event("EVT2", Some((2026, 1, 11)), EventStatus::Active),
                event("EVT3", Some((2026, 1, 12)), EventStatus::Ended),
            ]),
        );

        match with_config(&workbook, |r| r.active_event()).unwrap() {
            ActiveEvent::Live { event, strength } => {
                assert_eq!(event.event_id, "EVT2");
                assert_eq!(strength, EventStrengthRow::empty("EVT2", "2026-01-11"));
            }
            ActiveEvent::None => panic!("expected a live event"),
        }
    }

    #[test]
    fn test_active_event_reads_strength_row() {
        let mut strength = Sheet::with_header(&event_strength::HEADER);
        let row = EventStrengthRow {
            event_id: "EVT1".to_string(),
            date: "2026-01-10".to_string(),
            total: 4,
            year1: 1,
            year2: 1,
            year3: 1,
        };
        strength.push(encode_strength(&row));
        let workbook = MemoryWorkbook::new()
            .with_sheet("Event_Master", catalog(&[event("EVT1", None, EventStatus::Active)]))
            .with_sheet("Event_Strength", strength);

        let active = with_config(&workbook, |r| r.active_event()).unwrap();
        assert_eq!(
            active,
            ActiveEvent::Live {
                event: event("EVT1", None, EventStatus::Active),
                strength: row
            }
        );
    }

    #[test]
    fn test_no_active_event() {
        let workbook = MemoryWorkbook::new()
            .with_sheet("Event_Master", catalog(&[event("EVT1", None, EventStatus::Ended)]));
        let active = with_config(&workbook, |r| r.active_event()).unwrap();
        assert!(!active.is_live());
    }

    #[test]
    fn test_event_roster_statuses_and_order() {
        let workbook = MemoryWorkbook::new()
            .with_sheet("Event_Master", catalog(&[event("EVT1", None, EventStatus::Active)]))
            .with_sheet("1st Year", roster_sheet(&["A1", "A2"], CohortYear::First))
            .with_sheet("2nd Year", roster_sheet(&["B1"], CohortYear::Second))
            .with_sheet("3rd Year", roster_sheet(&["C1", "A2"], CohortYear::Third))
            .with_sheet(
                "Attendance_Logs",
                log_sheet(&[
                    ("EVT1", "A1", ""),
                    ("EVT1", "B1", "Absent"),
                    ("EVT1", "B1", "OD - NSS"),
                    ("EVT2", "C1", ""),
                    ("EVT1", "GHOST", ""),
                ]),
            );

        let roster = with_config(&workbook, |r| r.event_roster(" EVT1 ")).unwrap();
        let lines: Vec<(&str, CohortYear, RosterStatus)> = roster
            .lines
            .iter()
            .map(|l| (l.cadet.enrollment_id.as_str(), l.cadet.cohort, l.status.clone()))
            .collect();
        assert_eq!(
            lines,
            vec![
                ("C1", CohortYear::Third, RosterStatus::Absent),
                ("A2", CohortYear::Third, RosterStatus::Absent),
                ("B1", CohortYear::Second, RosterStatus::OnDuty("OD - NSS".to_string())),
                ("A1", CohortYear::First, RosterStatus::Present),
            ]
        );
        assert_eq!(roster.present_count(), 1);
        assert_eq!(roster.on_duty_count(), 1);
    }

    #[test]
    fn test_event_roster_unknown_event() {
        let workbook = MemoryWorkbook::new()
            .with_sheet("Event_Master", catalog(&[event("EVT1", None, EventStatus::Active)]));
        let err = with_config(&workbook, |r| r.event_roster("EVT9")).unwrap_err();
        assert!(matches!(err, Error::UnknownEvent(ref id) if id == "EVT9"));
    }

    #[test]
    fn test_cadets_unique_and_seniors_first() {
        let workbook = MemoryWorkbook::new()
            .with_sheet("1st Year", roster_sheet(&["A1", "A2"], CohortYear::First))
            .with_sheet("3rd Year", roster_sheet(&["C1", "A2"], CohortYear::Third));

        let cadets = with_config(&workbook, |r| r.cadets()).unwrap();
        let ids: Vec<&str> = cadets.iter().map(|c| c.enrollment_id.as_str()).collect();
        assert_eq!(ids, vec!["C1", "A2", "A1"]);

        let strength = with_config(&workbook, |r| r.unit_strength()).unwrap();
        assert_eq!(strength.total, 3);
        assert_eq!(strength.cohort(CohortYear::Third), 2);
        assert_eq!(strength.cohort(CohortYear::Second), 0);
        assert_eq!(strength.cohort(CohortYear::First), 1);
    }

    #[test]
    fn test_unit_strength_needs_a_roster() {
        let workbook = MemoryWorkbook::new();
        let err = with_config(&workbook, |r| r.unit_strength()).unwrap_err();
        assert!(err.is_missing_dependency());
    }

    #[test]
    fn test_status_never_then_fresh() {
        let workbook = MemoryWorkbook::new();
        let status = with_config(&workbook, |r| r.status()).unwrap();
        assert_eq!(status.strength.age(), "never");
        assert_eq!(status.last_updated(), "never");

        let workbook =
            workbook.with_sheet("Event_Strength", Sheet::with_header(&event_strength::HEADER));
        let status = with_config(&workbook, |r| r.status()).unwrap();
        assert_eq!(status.strength.age(), "just now");
        assert_eq!(status.summary.age(), "never");
        assert_eq!(status.last_updated(), "just now");
    }
}

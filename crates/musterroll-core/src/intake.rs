//! Write path: event lifecycle and attendance marking.

use chrono::{Local, NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{AttendanceLogEntry, AttendanceStatus, EventRecord, EventStatus, EventType};
use crate::store::codec::{
    decode_event, decode_log_entry, encode_event, encode_log_entry, set_event_status,
};
use crate::store::layout::event_master;
use crate::store::{Sheet, Workbook};
use crate::utils::format_timestamp;

/// Prefix of generated event ids
const EVENT_ID_PREFIX: &str = "EVT-";

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub type_label: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Clone)]
pub struct Mark {
    pub event_id: String,
    pub enrollment_id: String,
    pub name: Option<String>,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MarkOutcome {
    Recorded { entry: AttendanceLogEntry },
    AlreadyMarked { event_id: String, enrollment_id: String },
}

pub struct Intake<'a, W: Workbook> {
    workbook: &'a W,
    config: &'a Config,
}

impl<'a, W: Workbook> Intake<'a, W> {
    pub fn new(workbook: &'a W, config: &'a Config) -> Self {
        Self { workbook, config }
    }

    /// Add an `Active` event to the catalog, creating the catalog sheet when
    /// the workbook has none yet.
    pub fn create_event(&self, new: NewEvent) -> Result<EventRecord> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(Error::invalid("event title", &new.title));
        }
        let type_label = new.type_label.trim();
        if type_label.is_empty() {
            return Err(Error::invalid("event type", &new.type_label));
        }

        let event = self.workbook.update_sheet(&self.config.sheets.event_master, |slot| {
            let sheet = slot.get_or_insert_with(|| Sheet::with_header(&event_master::HEADER));
            let taken: Vec<String> = sheet
                .records()
                .iter()
                .filter_map(|r| decode_event(r))
                .map(|e| e.event_id)
                .collect();

            let now = Local::now();
            let event = EventRecord {
                event_id: unique_event_id(now.timestamp(), &taken),
                title: title.to_string(),
                event_type: EventType::classify(type_label),
                type_label: type_label.to_string(),
                date: Some(new.date),
                time: new.time,
                created_at: Some(format_timestamp(now)),
                status: EventStatus::Active,
            };
            sheet.push(encode_event(&event));
            Ok(event)
        })?;

        info!(event_id = %event.event_id, event_type = %event.event_type.label(), "Event created");
        Ok(event)
    }

    /// Mark the most recent `Active` event `Ended`. Returns its id, or `None`
    /// when nothing was active.
    pub fn end_active_event(&self) -> Result<Option<String>> {
        let sheet_name = &self.config.sheets.event_master;
        let ended = self.workbook.update_sheet(sheet_name, |slot| {
            let sheet = slot
                .as_mut()
                .ok_or_else(|| Error::MissingDependency(sheet_name.clone()))?;

            let target = sheet
                .records()
                .iter()
                .enumerate()
                .rev()
                .find_map(|(idx, row)| {
                    decode_event(row)
                        .filter(|e| e.status.is_active())
                        .map(|e| (idx, e.event_id))
                });

            let Some((idx, event_id)) = target else {
                return Ok(None);
            };
            if let Some(row) = sheet.records_mut().get_mut(idx) {
                set_event_status(row, &EventStatus::Ended);
            }
            Ok(Some(event_id))
        })?;

        match ended {
            Some(ref event_id) => info!(event_id = %event_id, "Event ended"),
            None => debug!("No active event to end"),
        }
        Ok(ended)
    }

    /// Append a check-in to the attendance log, stamped with the local time.
    /// The duplicate check and the append happen under the log's write lock.
    pub fn record_attendance(&self, mark: Mark) -> Result<MarkOutcome> {
        let event_id = mark.event_id.trim().to_string();
        let enrollment_id = mark.enrollment_id.trim().to_string();
        if event_id.is_empty() {
            return Err(Error::invalid("event id", &mark.event_id));
        }
        if enrollment_id.is_empty() {
            return Err(Error::invalid("enrollment id", &mark.enrollment_id));
        }

        let log_name = &self.config.sheets.attendance_logs;
        let dedupe = self.config.dedupe_attendance;
        let outcome = self.workbook.update_sheet(log_name, move |slot| {
            let sheet = slot
                .as_mut()
                .ok_or_else(|| Error::MissingDependency(log_name.clone()))?;

            let marked = dedupe
                && sheet
                    .records()
                    .iter()
                    .map(|r| decode_log_entry(r))
                    .any(|e| e.event_id == event_id && e.enrollment_id == enrollment_id);
            if marked {
                return Ok(MarkOutcome::AlreadyMarked {
                    event_id,
                    enrollment_id,
                });
            }

            let entry = AttendanceLogEntry {
                timestamp: format_timestamp(Local::now()),
                event_id,
                enrollment_id,
                name: mark.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
                status: match mark.status {
                    AttendanceStatus::Present => None,
                    other => Some(other),
                },
            };
            sheet.push(encode_log_entry(&entry));
            Ok(MarkOutcome::Recorded { entry })
        })?;

        match outcome {
            MarkOutcome::Recorded { ref entry } => info!(
                event_id = %entry.event_id,
                enrollment_id = %entry.enrollment_id,
                "Attendance recorded"
            ),
            MarkOutcome::AlreadyMarked {
                ref event_id,
                ref enrollment_id,
            } => debug!(event_id = %event_id, enrollment_id = %enrollment_id, "Already marked"),
        }
        Ok(outcome)
    }
}

/// `EVT-<unix seconds>`, suffixed when two events are created within the
/// same second.
fn unique_event_id(unix_seconds: i64, taken: &[String]) -> String {
    let base = format!("{}{}", EVENT_ID_PREFIX, unix_seconds);
    if !taken.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}

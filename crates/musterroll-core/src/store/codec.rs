//! Row codecs: the boundary between positional sheet rows and named records.

use crate::models::{
    AttendanceLogEntry, AttendanceStatus, AttendanceSummaryRow, CadetRecord, CategoryCounts,
    CohortYear, EventRecord, EventStatus, EventStrengthRow, EventType,
};
use crate::utils::{parse_date, parse_time};

use super::layout::{attendance_log, attendance_summary, event_master, event_strength, roster};
use super::sheet::{cell, pad};
use super::{Cell, Row};

// ===== Roster =====

/// Decode a roster row read from the partition of `cohort`. Rows without an
/// enrollment id are skipped.
pub fn decode_cadet(row: &[Cell], cohort: CohortYear) -> Option<CadetRecord> {
    let enrollment_id = cell(row, roster::ENROLLMENT_ID).non_blank()?;
    Some(CadetRecord {
        enrollment_id,
        cohort,
        name: cell(row, roster::NAME).non_blank(),
        rank: cell(row, roster::RANK).non_blank(),
        department: cell(row, roster::DEPT).non_blank(),
        pu_roll_number: cell(row, roster::PU_ROLL).non_blank(),
    })
}

pub fn encode_cadet(sr_no: usize, cadet: &CadetRecord) -> Row {
    let opt = |v: &Option<String>| v.as_deref().map(Cell::from).unwrap_or_default();
    let mut row = vec![Cell::Empty; roster::HEADER.len()];
    row[roster::SR_NO] = Cell::from(sr_no as i64);
    row[roster::ENROLLMENT_ID] = Cell::from(cadet.enrollment_id.as_str());
    row[roster::RANK] = opt(&cadet.rank);
    row[roster::NAME] = opt(&cadet.name);
    row[roster::DEPT] = opt(&cadet.department);
    row[roster::PU_ROLL] = opt(&cadet.pu_roll_number);
    row
}

// ===== Event master =====

pub fn decode_event(row: &[Cell]) -> Option<EventRecord> {
    let event_id = cell(row, event_master::EVENT_ID).non_blank()?;
    let type_label = cell(row, event_master::TYPE).trimmed();
    Some(EventRecord {
        event_id,
        title: cell(row, event_master::TITLE).trimmed(),
        event_type: EventType::classify(&type_label),
        type_label,
        date: parse_date(&cell(row, event_master::DATE).text()),
        time: parse_time(&cell(row, event_master::TIME).text()),
        created_at: cell(row, event_master::CREATED_AT).non_blank(),
        status: EventStatus::parse(&cell(row, event_master::STATUS).text()),
    })
}

pub fn encode_event(event: &EventRecord) -> Row {
    let mut row = vec![Cell::Empty; event_master::NUM_COLS];
    row[event_master::EVENT_ID] = Cell::from(event.event_id.as_str());
    row[event_master::TITLE] = Cell::from(event.title.as_str());
    row[event_master::TYPE] = Cell::from(event.type_label.as_str());
    if let Some(date) = event.date {
        row[event_master::DATE] = Cell::from(date.format("%Y-%m-%d").to_string());
    }
    if let Some(time) = event.time {
        row[event_master::TIME] = Cell::from(time.format("%H:%M").to_string());
    }
    if let Some(ref created_at) = event.created_at {
        row[event_master::CREATED_AT] = Cell::from(created_at.as_str());
    }
    row[event_master::STATUS] = Cell::from(event.status.as_str());
    row
}

/// Overwrite only the status cell of an event master row.
pub fn set_event_status(row: &mut Row, status: &EventStatus) {
    pad(row, event_master::NUM_COLS);
    row[event_master::STATUS] = Cell::from(status.as_str());
}

// ===== Attendance log =====

pub fn decode_log_entry(row: &[Cell]) -> AttendanceLogEntry {
    AttendanceLogEntry {
        timestamp: cell(row, attendance_log::TIMESTAMP).trimmed(),
        event_id: cell(row, attendance_log::EVENT_ID).trimmed(),
        enrollment_id: cell(row, attendance_log::ENROLLMENT_ID).trimmed(),
        name: cell(row, attendance_log::NAME).non_blank(),
        status: cell(row, attendance_log::STATUS)
            .non_blank()
            .map(|s| AttendanceStatus::parse(&s)),
    }
}

pub fn encode_log_entry(entry: &AttendanceLogEntry) -> Row {
    let mut row = vec![Cell::Empty; attendance_log::NUM_COLS];
    row[attendance_log::TIMESTAMP] = Cell::from(entry.timestamp.as_str());
    row[attendance_log::EVENT_ID] = Cell::from(entry.event_id.as_str());
    row[attendance_log::ENROLLMENT_ID] = Cell::from(entry.enrollment_id.as_str());
    if let Some(ref name) = entry.name {
        row[attendance_log::NAME] = Cell::from(name.as_str());
    }
    if let Some(ref status) = entry.status {
        row[attendance_log::STATUS] = Cell::from(status.as_str());
    }
    row
}

// ===== Event strength =====

pub fn encode_strength(row: &EventStrengthRow) -> Row {
    let mut out = vec![Cell::Empty; event_strength::NUM_COLS];
    out[event_strength::EVENT_ID] = Cell::from(row.event_id.as_str());
    out[event_strength::DATE] = Cell::from(row.date.as_str());
    out[event_strength::TOTAL] = Cell::from(row.total);
    out[event_strength::YEAR3] = Cell::from(row.year3);
    out[event_strength::YEAR2] = Cell::from(row.year2);
    out[event_strength::YEAR1] = Cell::from(row.year1);
    out
}

pub fn decode_strength(row: &[Cell]) -> Option<EventStrengthRow> {
    let event_id = cell(row, event_strength::EVENT_ID).non_blank()?;
    Some(EventStrengthRow {
        event_id,
        date: cell(row, event_strength::DATE).trimmed(),
        total: cell(row, event_strength::TOTAL).as_count(),
        year1: cell(row, event_strength::YEAR1).as_count(),
        year2: cell(row, event_strength::YEAR2).as_count(),
        year3: cell(row, event_strength::YEAR3).as_count(),
    })
}

// ===== Attendance summary =====

pub fn summary_enrollment_id(row: &[Cell]) -> String {
    cell(row, attendance_summary::ENROLLMENT_ID).trimmed()
}

pub fn decode_summary_counts(row: &[Cell]) -> CategoryCounts {
    CategoryCounts {
        mandatory: cell(row, attendance_summary::MANDATORY).as_count(),
        social: cell(row, attendance_summary::SOCIAL).as_count(),
        college: cell(row, attendance_summary::COLLEGE).as_count(),
        others: cell(row, attendance_summary::OTHERS).as_count(),
        total: cell(row, attendance_summary::TOTAL).as_count(),
    }
}

/// Write the five derived columns, padding a short row first. Static columns
/// are left exactly as they were.
pub fn write_summary_counts(row: &mut Row, counts: &CategoryCounts) {
    pad(row, attendance_summary::NUM_COLS);
    row[attendance_summary::MANDATORY] = Cell::from(counts.mandatory);
    row[attendance_summary::SOCIAL] = Cell::from(counts.social);
    row[attendance_summary::COLLEGE] = Cell::from(counts.college);
    row[attendance_summary::OTHERS] = Cell::from(counts.others);
    row[attendance_summary::TOTAL] = Cell::from(counts.total);
}

pub fn decode_summary(row: &[Cell]) -> Option<AttendanceSummaryRow> {
    let enrollment_id = cell(row, attendance_summary::ENROLLMENT_ID).non_blank()?;
    Some(AttendanceSummaryRow {
        sr_no: cell(row, attendance_summary::SR_NO).trimmed(),
        enrollment_id,
        rank: cell(row, attendance_summary::RANK).trimmed(),
        year: cell(row, attendance_summary::YEAR).trimmed(),
        name: cell(row, attendance_summary::NAME).trimmed(),
        dept: cell(row, attendance_summary::DEPT).trimmed(),
        pu_roll: cell(row, attendance_summary::PU_ROLL).trimmed(),
        counts: decode_summary_counts(row),
    })
}

//! Typed reads of whole tables.

use tracing::{debug, warn};

use crate::config::SheetNames;
use crate::error::{Error, Result};
use crate::models::{AttendanceLogEntry, CadetRecord, EventRecord};

use super::codec::{decode_cadet, decode_event, decode_log_entry};
use super::Workbook;

/// All roster partitions, in configured order. A missing partition is
/// skipped with a warning; the roster is only missing when every partition
/// is.
pub fn roster<W: Workbook + ?Sized>(workbook: &W, sheets: &SheetNames) -> Result<Vec<CadetRecord>> {
    let mut cadets = Vec::new();
    let mut found = 0;

    for partition in &sheets.cohorts {
        let sheet = match workbook.read_sheet(&partition.sheet)? {
            Some(sheet) => sheet,
            None => {
                warn!(sheet = %partition.sheet, "Roster partition not found, skipping");
                continue;
            }
        };
        found += 1;
        let before = cadets.len();
        cadets.extend(
            sheet
                .records()
                .iter()
                .filter_map(|row| decode_cadet(row, partition.year)),
        );
        debug!(sheet = %partition.sheet, count = cadets.len() - before, "Roster partition loaded");
    }

    if found == 0 {
        let names: Vec<&str> = sheets.cohorts.iter().map(|c| c.sheet.as_str()).collect();
        return Err(Error::MissingDependency(names.join(", ")));
    }
    Ok(cadets)
}

pub fn events<W: Workbook + ?Sized>(workbook: &W, sheets: &SheetNames) -> Result<Vec<EventRecord>> {
    let sheet = workbook.require_sheet(&sheets.event_master)?;
    Ok(sheet.records().iter().filter_map(|row| decode_event(row)).collect())
}

/// The attendance log in storage order, blank rows included.
pub fn attendance_log<W: Workbook + ?Sized>(
    workbook: &W,
    sheets: &SheetNames,
) -> Result<Vec<AttendanceLogEntry>> {
    let sheet = workbook.require_sheet(&sheets.attendance_logs)?;
    Ok(sheet.records().iter().map(|row| decode_log_entry(row)).collect())
}

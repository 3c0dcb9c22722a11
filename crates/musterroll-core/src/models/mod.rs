//! Data models for the attendance workbook.
//!
//! This module contains the named-field records decoded from sheet rows:
//!
//! - `CadetRecord`, `CohortYear`: roster entries and their enrollment year
//! - `EventRecord`, `EventType`, `EventStatus`: the event catalog
//! - `AttendanceLogEntry`, `AttendanceStatus`: raw check-in facts
//! - Derived rows: `EventStrengthRow`, `CategoryCounts`, `AttendanceSummaryRow`
//! - Report shapes: `TimelineEntry`, `ActiveEvent`, `RosterLine`, `RosterStatus`,
//!   `UnitStrength`

pub mod attendance;
pub mod cadet;
pub mod event;
pub mod summary;

pub use attendance::{AttendanceLogEntry, AttendanceStatus};
pub use cadet::{CadetRecord, CohortYear};
pub use event::{CategoryBucket, EventRecord, EventStatus, EventType};
pub use summary::{
    ActiveEvent, AttendanceSummaryRow, CategoryCounts, CohortStrength, EventRoster,
    EventStrengthRow, RosterLine, RosterStatus, TimelineEntry, UnitStrength,
};

//! Column positions of every sheet in the workbook.
//!
//! These constants are the only place the on-sheet column order is known.
//! Everything above the codec works with named fields. If a sheet's columns
//! are rearranged, update the matching module here and its `HEADER`.

/// Roster partition sheets ("1st Year", "2nd Year", "3rd Year").
pub mod roster {
    pub const SR_NO: usize = 0;
    /// Enrollment / regimental number, the cadet key
    pub const ENROLLMENT_ID: usize = 1;
    pub const RANK: usize = 2;
    pub const NAME: usize = 3;
    pub const DEPT: usize = 4;
    pub const PU_ROLL: usize = 5;

    pub const HEADER: [&str; 6] =
        ["Sr No", "Enrollment ID", "RANK", "Name", "DEPT", "PU ROLL NUMBER"];
}

/// Event catalog sheet.
pub mod event_master {
    pub const EVENT_ID: usize = 0;
    pub const TITLE: usize = 1;
    pub const TYPE: usize = 2;
    pub const DATE: usize = 3;
    pub const TIME: usize = 4;
    pub const CREATED_AT: usize = 5;
    /// "Active" while attendance is being taken, "Ended" afterwards
    pub const STATUS: usize = 6;

    pub const NUM_COLS: usize = 7;
    pub const HEADER: [&str; NUM_COLS] =
        ["Event ID", "Title", "Type", "Date", "Time", "Created At", "Status"];
}

/// Append-only attendance log.
pub mod attendance_log {
    pub const TIMESTAMP: usize = 0;
    pub const EVENT_ID: usize = 1;
    pub const ENROLLMENT_ID: usize = 2;
    pub const NAME: usize = 3;
    /// Blank, "Present", or an OD descriptor
    pub const STATUS: usize = 4;

    pub const NUM_COLS: usize = 5;
    pub const HEADER: [&str; NUM_COLS] =
        ["Timestamp", "Event ID", "Enrollment ID", "Name", "Status"];
}

/// Per-event strength summary. Year columns run 3rd to 1st.
pub mod event_strength {
    pub const EVENT_ID: usize = 0;
    pub const DATE: usize = 1;
    pub const TOTAL: usize = 2;
    pub const YEAR3: usize = 3;
    pub const YEAR2: usize = 4;
    pub const YEAR1: usize = 5;

    pub const NUM_COLS: usize = 6;
    pub const HEADER: [&str; NUM_COLS] =
        ["Event ID", "Date", "Total", "3rd Year", "2nd Year", "1st Year"];
}

/// Per-cadet attendance summary. Columns 0..=6 are static roster details
/// maintained by hand; 7..=11 are derived.
pub mod attendance_summary {
    pub const SR_NO: usize = 0;
    pub const ENROLLMENT_ID: usize = 1;
    pub const RANK: usize = 2;
    pub const YEAR: usize = 3;
    pub const NAME: usize = 4;
    pub const DEPT: usize = 5;
    pub const PU_ROLL: usize = 6;
    pub const MANDATORY: usize = 7;
    pub const SOCIAL: usize = 8;
    pub const COLLEGE: usize = 9;
    pub const OTHERS: usize = 10;
    pub const TOTAL: usize = 11;

    pub const NUM_COLS: usize = 12;
    pub const HEADER: [&str; NUM_COLS] = [
        "Sr No",
        "Enrollment ID",
        "RANK",
        "Year",
        "Name",
        "DEPT",
        "PU ROLL",
        "Mandatory Parade",
        "Social Drives",
        "College Events",
        "Others",
        "Total",
    ];
}

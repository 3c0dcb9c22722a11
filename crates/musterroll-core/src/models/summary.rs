use serde::{Deserialize, Serialize};

use super::{AttendanceStatus, CadetRecord, CohortYear, EventRecord, EventType};
use super::event::CategoryBucket;

/// Per-event strength, one row per event id found in the log.
///
/// Field order here is ascending by year; the sheet stores the year columns
/// descending (3rd, 2nd, 1st), which the codec handles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct EventStrengthRow {
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub date: String,
    pub total: u32,
    pub year1: u32,
    pub year2: u32,
    pub year3: u32,
}

impl EventStrengthRow {
    pub fn empty(event_id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            date: date.into(),
            ..Default::default()
        }
    }

    pub fn year_count(&self, year: CohortYear) -> u32 {
        match year {
            CohortYear::First => self.year1,
            CohortYear::Second => self.year2,
            CohortYear::Third => self.year3,
        }
    }

    pub fn bump_year(&mut self, year: CohortYear) {
        match year {
            CohortYear::First => self.year1 += 1,
            CohortYear::Second => self.year2 += 1,
            CohortYear::Third => self.year3 += 1,
        }
    }

    /// Entries whose cadet could not be placed in a cohort. A hand-edited
    /// row with more year counts than its total reports zero.
    pub fn unresolved(&self) -> u32 {
        let resolved = self.year1.saturating_add(self.year2).saturating_add(self.year3);
        self.total.saturating_sub(resolved)
    }
}

/// The four participation buckets plus their total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CategoryCounts {
    pub mandatory: u32,
    pub social: u32,
    pub college: u32,
    pub others: u32,
    pub total: u32,
}

impl CategoryCounts {
    pub fn add(&mut self, bucket: CategoryBucket, weight: u32) {
        match bucket {
            CategoryBucket::Mandatory => self.mandatory += weight,
            CategoryBucket::Social => self.social += weight,
            CategoryBucket::College => self.college += weight,
            CategoryBucket::Others => self.others += weight,
        }
        self.total += weight;
    }

    pub fn get(&self, bucket: CategoryBucket) -> u32 {
        match bucket {
            CategoryBucket::Mandatory => self.mandatory,
            CategoryBucket::Social => self.social,
            CategoryBucket::College => self.college,
            CategoryBucket::Others => self.others,
        }
    }
}

/// A row of the per-cadet attendance summary as exposed to the registry view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AttendanceSummaryRow {
    #[serde(rename = "srNo")]
    pub sr_no: String,
    #[serde(rename = "enrollmentId")]
    pub enrollment_id: String,
    pub rank: String,
    pub year: String,
    pub name: String,
    pub dept: String,
    #[serde(rename = "puRoll")]
    pub pu_roll: String,
    #[serde(flatten)]
    pub counts: CategoryCounts,
}

/// Roster head-count of one cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CohortStrength {
    pub year: CohortYear,
    pub total: u32,
}

/// Enrolled strength of the unit, seniors first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UnitStrength {
    pub total: u32,
    pub breakdown: Vec<CohortStrength>,
}

impl UnitStrength {
    /// Count each cadet once; cohorts with nobody enrolled still get a line.
    pub fn from_roster(cadets: &[CadetRecord]) -> Self {
        let breakdown: Vec<CohortStrength> = CohortYear::ALL
            .iter()
            .rev()
            .map(|&year| CohortStrength {
                year,
                total: cadets.iter().filter(|c| c.cohort == year).count() as u32,
            })
            .collect();
        Self {
            total: breakdown.iter().map(|c| c.total).sum(),
            breakdown,
        }
    }

    pub fn cohort(&self, year: CohortYear) -> u32 {
        self.breakdown
            .iter()
            .find(|c| c.year == year)
            .map(|c| c.total)
            .unwrap_or(0)
    }
}

/// Entry of the recent-events timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TimelineEntry {
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub date: String,
    pub title: String,
    #[serde(rename = "eventType")]
    pub event_type: EventType,
}

/// Result of the live-event poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ActiveEvent {
    Live {
        event: EventRecord,
        strength: EventStrengthRow,
    },
    None,
}

impl ActiveEvent {
    pub fn is_live(&self) -> bool {
        matches!(self, ActiveEvent::Live { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum RosterStatus {
    Present,
    Absent,
    OnDuty(String),
}

impl From<AttendanceStatus> for RosterStatus {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Present => RosterStatus::Present,
            AttendanceStatus::Absent => RosterStatus::Absent,
            AttendanceStatus::OnDuty(descriptor) => RosterStatus::OnDuty(descriptor),
        }
    }
}

impl std::fmt::Display for RosterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterStatus::Present => write!(f, "Present"),
            RosterStatus::Absent => write!(f, "Absent"),
            RosterStatus::OnDuty(descriptor) => write!(f, "{}", descriptor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RosterLine {
    pub cadet: CadetRecord,
    pub status: RosterStatus,
}

/// Detailed attendance of one event across the whole roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct EventRoster {
    pub event: EventRecord,
    pub lines: Vec<RosterLine>,
}

impl EventRoster {
    pub fn present_count(&self) -> usize {
        self.lines.iter().filter(|l| l.status == RosterStatus::Present).count()
    }

    pub fn absent_count(&self) -> usize {
        self.lines.iter().filter(|l| l.status == RosterStatus::Absent).count()
    }

    pub fn on_duty_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l.status, RosterStatus::OnDuty(_)))
            .count()
    }
}

use serde::{Deserialize, Serialize};

/// Enrollment year of a cadet. Each year has its own roster sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum CohortYear {
    #[serde(rename = "1st Year")]
    First,
    #[serde(rename = "2nd Year")]
    Second,
    #[serde(rename = "3rd Year")]
    Third,
}

impl CohortYear {
    pub const ALL: [CohortYear; 3] = [CohortYear::First, CohortYear::Second, CohortYear::Third];

    pub fn label(&self) -> &'static str {
        match self {
            CohortYear::First => "1st Year",
            CohortYear::Second => "2nd Year",
            CohortYear::Third => "3rd Year",
        }
    }

    /// Parse a year label as typed into a sheet: "1st Year", "2nd", "3".
    pub fn from_label(s: &str) -> Option<Self> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.chars().next()? {
            '1' if lower.len() == 1 || lower.starts_with("1st") => Some(CohortYear::First),
            '2' if lower.len() == 1 || lower.starts_with("2nd") => Some(CohortYear::Second),
            '3' if lower.len() == 1 || lower.starts_with("3rd") => Some(CohortYear::Third),
            _ => None,
        }
    }
}

impl std::fmt::Display for CohortYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A roster entry. The cohort comes from the partition the row was read from,
/// not from a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CadetRecord {
    #[serde(rename = "enrollmentId")]
    pub enrollment_id: String,
    pub cohort: CohortYear,
    pub name: Option<String>,
    pub rank: Option<String>,
    pub department: Option<String>,
    #[serde(rename = "puRollNumber")]
    pub pu_roll_number: Option<String>,
}

impl CadetRecord {
    pub fn new(enrollment_id: impl Into<String>, cohort: CohortYear) -> Self {
        Self {
            enrollment_id: enrollment_id.into(),
            cohort,
            name: None,
            rank: None,
            department: None,
            pu_roll_number: None,
        }
    }

    pub fn display_name(&self) -> String {
        match (&self.rank, &self.name) {
            (Some(rank), Some(name)) => format!("{} {}", rank, name),
            (None, Some(name)) => name.clone(),
            _ => self.enrollment_id.clone(),
        }
    }
}

use serde::{Deserialize, Serialize};

/// Status column of a log row. Blank means plain presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum AttendanceStatus {
    Present,
    Absent,
    /// On-duty presence, keeps the descriptor as written ("OD", "OD - NSS", "3")
    OnDuty(String),
}

impl AttendanceStatus {
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("present") {
            AttendanceStatus::Present
        } else if trimmed.eq_ignore_ascii_case("absent") {
            AttendanceStatus::Absent
        } else {
            AttendanceStatus::OnDuty(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::OnDuty(descriptor) => descriptor,
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One check-in fact. Ids are kept as read (trimmed); an empty id means the
/// cell was blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AttendanceLogEntry {
    /// Timestamp cell text, parsed lazily when a date is needed
    pub timestamp: String,
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(rename = "enrollmentId")]
    pub enrollment_id: String,
    pub name: Option<String>,
    pub status: Option<AttendanceStatus>,
}

impl AttendanceLogEntry {
    pub fn has_event(&self) -> bool {
        !self.event_id.is_empty()
    }

    pub fn has_cadet(&self) -> bool {
        !self.enrollment_id.is_empty()
    }

    pub fn status_or_present(&self) -> AttendanceStatus {
        self.status.clone().unwrap_or(AttendanceStatus::Present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(AttendanceStatus::parse(""), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::parse("present"), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::parse("ABSENT"), AttendanceStatus::Absent);
        assert_eq!(
            AttendanceStatus::parse(" OD - NSS Camp "),
            AttendanceStatus::OnDuty("OD - NSS Camp".to_string())
        );
    }
}

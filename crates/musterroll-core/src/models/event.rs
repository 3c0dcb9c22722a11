use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Kind of event, classified from the free-text type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum EventType {
    MandatoryParade,
    SocialDrive,
    CollegeEvent,
    Camp,
    Other,
}

impl EventType {
    /// Classify a type label. Matching is by keyword so that "Parade",
    /// "Mandatory Parade" and "mandatory parade (RD)" all land together.
    pub fn classify(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        if lower.contains("mandatory") || lower.contains("parade") {
            EventType::MandatoryParade
        } else if lower.contains("social") {
            EventType::SocialDrive
        } else if lower.contains("college") {
            EventType::CollegeEvent
        } else if lower.contains("camp") {
            EventType::Camp
        } else {
            EventType::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventType::MandatoryParade => "Mandatory Parade",
            EventType::SocialDrive => "Social Service",
            EventType::CollegeEvent => "College Events",
            EventType::Camp => "Camp",
            EventType::Other => "Others",
        }
    }

    /// Participation bucket this type is counted in. Camps have no column of
    /// their own in the summary table.
    pub fn bucket(&self) -> CategoryBucket {
        match self {
            EventType::MandatoryParade => CategoryBucket::Mandatory,
            EventType::SocialDrive => CategoryBucket::Social,
            EventType::CollegeEvent => CategoryBucket::College,
            EventType::Camp | EventType::Other => CategoryBucket::Others,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Count columns of the per-cadet summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryBucket {
    Mandatory,
    Social,
    College,
    Others,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum EventStatus {
    Active,
    Ended,
    Other(String),
}

impl EventStatus {
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("active") {
            EventStatus::Active
        } else if trimmed.eq_ignore_ascii_case("ended") {
            EventStatus::Ended
        } else {
            EventStatus::Other(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventStatus::Active => "Active",
            EventStatus::Ended => "Ended",
            EventStatus::Other(s) => s,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, EventStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct EventRecord {
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub title: String,
    #[serde(rename = "eventType")]
    pub event_type: EventType,
    /// Type text as written in the sheet
    #[serde(rename = "typeLabel")]
    pub type_label: String,
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub date: Option<NaiveDate>,
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub time: Option<NaiveTime>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    pub status: EventStatus,
}

impl EventRecord {
    pub fn formatted_date(&self) -> String {
        match self.date {
            Some(date) => date.format("%b %d, %Y").to_string(),
            None => "TBD".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keywords() {
        assert_eq!(EventType::classify("Mandatory Parade"), EventType::MandatoryParade);
        assert_eq!(EventType::classify("Parade"), EventType::MandatoryParade);
        assert_eq!(EventType::classify("Social Service"), EventType::SocialDrive);
        assert_eq!(EventType::classify("social drive"), EventType::SocialDrive);
        assert_eq!(EventType::classify("College Events"), EventType::CollegeEvent);
        assert_eq!(EventType::classify("Annual Training Camp"), EventType::Camp);
        assert_eq!(EventType::classify("Others"), EventType::Other);
        assert_eq!(EventType::classify(""), EventType::Other);
    }

    #[test]
    fn test_camp_counts_as_others() {
        assert_eq!(EventType::Camp.bucket(), CategoryBucket::Others);
        assert_eq!(EventType::Other.bucket(), CategoryBucket::Others);
        assert_eq!(EventType::MandatoryParade.bucket(), CategoryBucket::Mandatory);
    }

    #[test]
    fn test_status_parse() {
        assert!(EventStatus::parse(" active ").is_active());
        assert_eq!(EventStatus::parse("Ended"), EventStatus::Ended);
        assert_eq!(EventStatus::parse("Postponed"), EventStatus::Other("Postponed".to_string()));
    }
}

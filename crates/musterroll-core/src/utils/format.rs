use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Layout used when stamping new log and event rows
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layout of calendar dates written to summary sheets
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const NAIVE_DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M", "%I:%M %p"];

/// Parse a timestamp cell. Zoned values are converted to local time; naive
/// values are taken as already local.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| parse_timestamp(raw).map(|dt| dt.date()))
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

/// Local calendar date of a timestamp cell, as written to the strength sheet.
/// Unparseable text falls back to its first ten characters.
pub fn calendar_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match parse_timestamp(trimmed) {
        Some(dt) => dt.date().format(DATE_FORMAT).to_string(),
        None => match parse_date(trimmed) {
            Some(date) => date.format(DATE_FORMAT).to_string(),
            None => trimmed.chars().take(10).collect(),
        },
    }
}

pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Human readable age: "just now", "5m ago", "2h ago", "3d ago"
pub fn age_display(minutes: i64) -> String {
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_date_naive_formats() {
        assert_eq!(calendar_date("2026-01-15 08:30:00"), "2026-01-15");
        assert_eq!(calendar_date("2026-01-15T23:59:59"), "2026-01-15");
        assert_eq!(calendar_date("15/01/2026 07:05:00"), "2026-01-15");
        assert_eq!(calendar_date("2026-01-15"), "2026-01-15");
    }

    #[test]
    fn test_calendar_date_fallbacks() {
        assert_eq!(calendar_date(""), "");
        assert_eq!(calendar_date("   "), "");
        assert_eq!(calendar_date("yesterday evening"), "yesterday ");
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("07:30"), NaiveTime::from_hms_opt(7, 30, 0));
        assert_eq!(parse_time("07:30:15"), NaiveTime::from_hms_opt(7, 30, 15));
        assert_eq!(parse_time("noon"), None);
    }

    #[test]
    fn test_age_display() {
        assert_eq!(age_display(-3), "just now");
        assert_eq!(age_display(0), "just now");
        assert_eq!(age_display(5), "5m ago");
        assert_eq!(age_display(89), "1h ago");
        assert_eq!(age_display(90), "2h ago");
        assert_eq!(age_display(1440 * 2), "2d ago");
        assert_eq!(age_display(1440 + 13 * 60), "2d ago");
    }
}

use chrono::{DateTime, Duration, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::config::ScheduleConfig;

/// The two refresh jobs a trigger can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Job {
    EventStrength,
    AttendanceCategories,
}

impl Job {
    pub fn label(&self) -> &'static str {
        match self {
            Job::EventStrength => "event strength",
            Job::AttendanceCategories => "attendance categories",
        }
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "every", rename_all = "snake_case")]
pub enum Cadence {
    EveryMinutes { minutes: u32 },
    EveryHours { hours: u32 },
    /// Once a day at the top of `hour`, local time
    DailyAt { hour: u32 },
}

impl Cadence {
    /// First firing strictly after `now`.
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        match *self {
            Cadence::EveryMinutes { minutes } => {
                now.clone() + Duration::minutes(i64::from(minutes.max(1)))
            }
            Cadence::EveryHours { hours } => now.clone() + Duration::hours(i64::from(hours.max(1))),
            Cadence::DailyAt { hour } => next_daily(now, hour.min(23)),
        }
    }
}

fn next_daily<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> DateTime<Tz> {
    let tz = now.timezone();
    let at = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let mut day = now.date_naive();

    // Two days covers a target already passed today; the extra days cover a
    // DST gap swallowing the hour.
    for _ in 0..4 {
        if let Some(candidate) = tz.from_local_datetime(&day.and_time(at)).earliest() {
            if candidate > *now {
                return candidate;
            }
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    now.clone() + Duration::days(1)
}

/// What should fire and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub job: Job,
    pub cadence: Cadence,
}

impl TriggerSpec {
    pub fn new(job: Job, cadence: Cadence) -> Self {
        Self { job, cadence }
    }
}

impl std::fmt::Display for TriggerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.cadence {
            Cadence::EveryMinutes { minutes } => write!(f, "{} every {}m", self.job, minutes),
            Cadence::EveryHours { hours } => write!(f, "{} every {}h", self.job, hours),
            Cadence::DailyAt { hour } => write!(f, "{} daily at {:02}:00", self.job, hour),
        }
    }
}

/// One strength trigger at the short interval; a daily full category refresh
/// plus an hourly top-up.
pub fn desired_triggers(schedule: &ScheduleConfig) -> Vec<TriggerSpec> {
    vec![
        TriggerSpec::new(
            Job::EventStrength,
            Cadence::EveryMinutes {
                minutes: schedule.strength_every_minutes,
            },
        ),
        TriggerSpec::new(
            Job::AttendanceCategories,
            Cadence::DailyAt {
                hour: schedule.category_daily_hour,
            },
        ),
        TriggerSpec::new(
            Job::AttendanceCategories,
            Cadence::EveryHours {
                hours: schedule.category_every_hours,
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_interval_cadences() {
        let now = at(2026, 3, 1, 10, 2);
        assert_eq!(Cadence::EveryMinutes { minutes: 5 }.next_after(&now), at(2026, 3, 1, 10, 7));
        assert_eq!(Cadence::EveryHours { hours: 1 }.next_after(&now), at(2026, 3, 1, 11, 2));
        assert_eq!(Cadence::EveryMinutes { minutes: 0 }.next_after(&now), at(2026, 3, 1, 10, 3));
    }

    #[test]
    fn test_daily_before_and_after_hour() {
        let daily = Cadence::DailyAt { hour: 1 };
        assert_eq!(daily.next_after(&at(2026, 3, 1, 0, 30)), at(2026, 3, 1, 1, 0));
        assert_eq!(daily.next_after(&at(2026, 3, 1, 1, 0)), at(2026, 3, 2, 1, 0));
        assert_eq!(daily.next_after(&at(2026, 12, 31, 23, 0)), at(2027, 1, 1, 1, 0));
    }

    #[test]
    fn test_desired_triggers_from_defaults() {
        let specs = desired_triggers(&ScheduleConfig::default());
        assert_eq!(specs.len(), 3);
        assert_eq!(specs.iter().filter(|s| s.job == Job::EventStrength).count(), 1);
        assert_eq!(specs[0].cadence, Cadence::EveryMinutes { minutes: 5 });
        assert_eq!(specs[1].to_string(), "attendance categories daily at 01:00");
    }

    #[test]
    fn test_spec_json_shape() {
        let spec = TriggerSpec::new(Job::EventStrength, Cadence::EveryMinutes { minutes: 5 });
        let json = serde_json::to_value(spec).unwrap();
        assert_eq!(json["job"], "event_strength");
        assert_eq!(json["cadence"]["every"], "every_minutes");
        assert_eq!(json["cadence"]["minutes"], 5);
    }
}

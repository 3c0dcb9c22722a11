//! Application configuration management.
//!
//! This module handles loading and saving the configuration that names the
//! workbook location, every sheet the pipeline reads or writes, and the
//! refresh schedule. The configuration is passed explicitly into the
//! pipeline, reports and intake rather than living in process globals.
//!
//! Configuration is stored at `~/.config/musterroll/config.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::CohortYear;

/// Application name used for config/data directory paths
const APP_NAME: &str = "musterroll";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Workbook directory name under the data directory
const WORKBOOK_DIR: &str = "workbook";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workbook_dir: Option<PathBuf>,
    pub sheets: SheetNames,
    pub schedule: ScheduleConfig,
    pub recent_events_limit: usize,
    pub dedupe_attendance: bool,
    pub run_lock_stale_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workbook_dir: None,
            sheets: SheetNames::default(),
            schedule: ScheduleConfig::default(),
            recent_events_limit: 5,
            dedupe_attendance: true,
            run_lock_stale_minutes: 30,
        }
    }
}

/// Names of the sheets making up the workbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub attendance_logs: String,
    pub event_strength: String,
    pub attendance_summary: String,
    pub event_master: String,
    /// Roster partitions in read order. A later partition wins when the same
    /// enrollment id appears twice.
    pub cohorts: Vec<CohortSheet>,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            attendance_logs: "Attendance_Logs".to_string(),
            event_strength: "Event_Strength".to_string(),
            attendance_summary: "Attendance".to_string(),
            event_master: "Event_Master".to_string(),
            cohorts: CohortYear::ALL
                .iter()
                .map(|&year| CohortSheet {
                    year,
                    sheet: year.label().to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortSheet {
    pub year: CohortYear,
    pub sheet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Live strength refresh interval
    pub strength_every_minutes: u32,
    /// Local hour of the daily full category refresh
    pub category_daily_hour: u32,
    /// Freshness top-up interval for the category refresh
    pub category_every_hours: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            strength_every_minutes: 5,
            category_daily_hour: 1,
            category_every_hours: 1,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when no file
    /// exists yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&contents).map_err(|source| Error::Corrupt {
                sheet: path.display().to_string(),
                source,
            })?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self).map_err(|source| Error::Corrupt {
            sheet: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::InvalidInput("Could not find config directory".to_string()))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn workbook_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.workbook_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| Error::InvalidInput("Could not find data directory".to_string()))?;
        Ok(data_dir.join(APP_NAME).join(WORKBOOK_DIR))
    }

    /// Reject schedules that would never fire or fire on an invalid hour.
    pub fn validate(&self) -> Result<()> {
        let s = &self.schedule;
        if s.strength_every_minutes == 0 {
            return Err(Error::InvalidInput(
                "schedule.strength_every_minutes must be at least 1".to_string(),
            ));
        }
        if s.category_every_hours == 0 {
            return Err(Error::InvalidInput(
                "schedule.category_every_hours must be at least 1".to_string(),
            ));
        }
        if s.category_daily_hour > 23 {
            return Err(Error::InvalidInput(
                "schedule.category_daily_hour must be between 0 and 23".to_string(),
            ));
        }
        if self.sheets.cohorts.is_empty() {
            return Err(Error::InvalidInput(
                "sheets.cohorts must name at least one roster sheet".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sheet_names() {
        let config = Config::default();
        assert_eq!(config.sheets.attendance_logs, "Attendance_Logs");
        assert_eq!(config.sheets.event_strength, "Event_Strength");
        let cohort_sheets: Vec<&str> =
            config.sheets.cohorts.iter().map(|c| c.sheet.as_str()).collect();
        assert_eq!(cohort_sheets, vec!["1st Year", "2nd Year", "3rd Year"]);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let contents = r#"{
            "recent_events_limit": 8,
            "schedule": { "strength_every_minutes": 2 }
        }"#;
        std::fs::write(&path, contents).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.recent_events_limit, 8);
        assert_eq!(config.schedule.strength_every_minutes, 2);
        assert_eq!(config.schedule.category_daily_hour, 1);
        assert!(config.dedupe_attendance);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.recent_events_limit, 5);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.schedule.strength_every_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.workbook_dir = Some(dir.path().join("wb"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.workbook_dir, config.workbook_dir);
        assert_eq!(loaded.workbook_dir().unwrap(), dir.path().join("wb"));
    }
}

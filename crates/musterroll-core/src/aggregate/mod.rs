//! The two summary refreshes and the pipeline that owns the workbook they
//! run against.
//!
//! Each run reads its inputs, computes the derived rows in memory and then
//! writes the output table once. A run that fails before the write leaves the
//! previous output in place.

pub mod category;
pub mod lookup;
pub mod strength;

pub use category::{
    merge_into_summary, tally_categories, CategoryAggregator, CategoryReport, MergeStats,
};
pub use lookup::{CohortMap, EventTypeMap};
pub use strength::{compute_strength, StrengthAggregator, StrengthReport};

use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::intake::Intake;
use crate::reports::Reports;
use crate::schedule::Job;
use crate::store::Workbook;

/// Outcome of one scheduled or on-demand job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum JobReport {
    Strength(StrengthReport),
    Category(CategoryReport),
}

impl std::fmt::Display for JobReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobReport::Strength(r) => write!(f, "strength: {}", r),
            JobReport::Category(r) => write!(f, "categories: {}", r),
        }
    }
}

/// A workbook plus the configuration naming its sheets.
pub struct Pipeline<W: Workbook> {
    workbook: W,
    config: Config,
}

impl<W: Workbook> Pipeline<W> {
    pub fn new(workbook: W, config: Config) -> Self {
        Self { workbook, config }
    }

    pub fn workbook(&self) -> &W {
        &self.workbook
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run_strength(&self) -> Result<StrengthReport> {
        StrengthAggregator::new(&self.workbook, &self.config).run()
    }

    pub fn run_category(&self) -> Result<CategoryReport> {
        CategoryAggregator::new(&self.workbook, &self.config).run()
    }

    pub fn run_job(&self, job: Job) -> Result<JobReport> {
        match job {
            Job::EventStrength => self.run_strength().map(JobReport::Strength),
            Job::AttendanceCategories => self.run_category().map(JobReport::Category),
        }
    }

    pub fn reports(&self) -> Reports<'_, W> {
        Reports::new(&self.workbook, &self.config)
    }

    pub fn intake(&self) -> Intake<'_, W> {
        Intake::new(&self.workbook, &self.config)
    }
}

//! Cadet attendance workbook: roster, event catalog and check-in log, plus the
//! derived event strength and per-cadet category summaries kept fresh by a
//! timer daemon.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod intake;
pub mod models;
pub mod reports;
pub mod schedule;
pub mod store;
pub mod utils;

pub use aggregate::{JobReport, Pipeline};
pub use config::Config;
pub use error::{Error, Result};
pub use store::{JsonWorkbook, MemoryWorkbook, Workbook};

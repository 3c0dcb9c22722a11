//! Workbook storage for the roster, event catalog, attendance log and the
//! two summary tables.
//!
//! The `Workbook` trait is the persistence boundary. `JsonWorkbook` keeps
//! one JSON file per sheet on disk; `MemoryWorkbook` keeps everything in
//! process. Column positions live in `layout` and are applied by `codec`;
//! nothing above this module indexes into a row.

pub mod cell;
pub mod codec;
pub mod json;
pub mod layout;
pub mod memory;
pub mod sheet;
pub mod tables;

pub use cell::Cell;
pub use json::JsonWorkbook;
pub use memory::MemoryWorkbook;
pub use sheet::{Row, Sheet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::age_display;

pub trait Workbook {
    /// Full data range of a sheet, header included. `Ok(None)` when the sheet
    /// does not exist.
    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>>;

    /// Replace a sheet's contents in one step. Readers see either the old or
    /// the new contents, never a mix.
    fn write_sheet(&self, name: &str, sheet: &Sheet) -> Result<()>;

    /// Read, edit and store one sheet while holding that sheet's write lock,
    /// so concurrent edits never overwrite each other.
    ///
    /// `edit` gets the current contents (`None` when the sheet does not
    /// exist). The sheet is stored only when `edit` succeeds and changed it;
    /// clearing the slot leaves the stored sheet in place. `edit` must not
    /// call back into the workbook.
    fn update_sheet<T, F>(&self, name: &str, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Option<Sheet>) -> Result<T>;

    /// Append records to an existing sheet.
    fn append_rows(&self, name: &str, rows: Vec<Row>) -> Result<()> {
        self.update_sheet(name, |slot| {
            let sheet = slot
                .as_mut()
                .ok_or_else(|| Error::MissingDependency(name.to_string()))?;
            for row in rows {
                sheet.push(row);
            }
            Ok(())
        })
    }

    /// When the sheet was last written.
    fn updated_at(&self, name: &str) -> Result<Option<DateTime<Utc>>>;

    /// Take the run-in-progress guard for `resource`. A guard older than
    /// `stale_after` is treated as abandoned.
    fn try_lock(&self, resource: &str, stale_after: Duration) -> Result<RunGuard>;

    fn require_sheet(&self, name: &str) -> Result<Sheet> {
        self.read_sheet(name)?
            .ok_or_else(|| Error::MissingDependency(name.to_string()))
    }
}

/// Held for the duration of a run; releases its lock on drop.
pub struct RunGuard {
    resource: String,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl RunGuard {
    pub fn new(resource: impl Into<String>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            resource: resource.into(),
            release: Some(Box::new(release)),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for RunGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunGuard").field("resource", &self.resource).finish()
    }
}

/// Data with the time it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stamped<T> {
    pub data: T,
    pub updated_at: DateTime<Utc>,
}

impl<T> Stamped<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            updated_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.updated_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        age_display(self.age_minutes())
    }

    pub fn is_older_than(&self, limit: Duration) -> bool {
        Utc::now() - self.updated_at > limit
    }
}

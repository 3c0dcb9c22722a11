use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use crate::error::{Error, Result};

use super::{RunGuard, Sheet, Stamped, Workbook};

/// In-process workbook. Clones share the same sheets.
#[derive(Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Arc<Mutex<HashMap<String, Stamped<Sheet>>>>,
    locks: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

/// A poisoned lock only means another thread panicked mid-access; the map
/// itself is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper for fixtures
    pub fn with_sheet(self, name: &str, sheet: Sheet) -> Self {
        lock(&self.sheets).insert(name.to_string(), Stamped::new(sheet));
        self
    }

    pub fn remove_sheet(&self, name: &str) -> Option<Sheet> {
        lock(&self.sheets).remove(name).map(|s| s.data)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.sheets).keys().cloned().collect();
        names.sort();
        names
    }
}

impl Workbook for MemoryWorkbook {
    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>> {
        Ok(lock(&self.sheets).get(name).map(|s| s.data.clone()))
    }

    fn write_sheet(&self, name: &str, sheet: &Sheet) -> Result<()> {
        lock(&self.sheets).insert(name.to_string(), Stamped::new(sheet.clone()));
        Ok(())
    }

    fn update_sheet<T, F>(&self, name: &str, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Option<Sheet>) -> Result<T>,
    {
        // The map stays locked across the edit
        let mut sheets = lock(&self.sheets);
        let before = sheets.get(name).map(|s| s.data.clone());
        let mut slot = before.clone();
        let out = edit(&mut slot)?;
        match slot {
            Some(sheet) if Some(&sheet) != before.as_ref() => {
                sheets.insert(name.to_string(), Stamped::new(sheet));
            }
            _ => {}
        }
        Ok(out)
    }

    fn updated_at(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(lock(&self.sheets).get(name).map(|s| s.updated_at))
    }

    fn try_lock(&self, resource: &str, stale_after: Duration) -> Result<RunGuard> {
        let mut locks = lock(&self.locks);
        let now = Utc::now();
        if let Some(taken_at) = locks.get(resource) {
            if now - *taken_at <= stale_after {
                return Err(Error::Busy(resource.to_string()));
            }
        }
        locks.insert(resource.to_string(), now);

        let shared = Arc::clone(&self.locks);
        let name = resource.to_string();
        Ok(RunGuard::new(resource, move || {
            lock(&shared).remove(&name);
        }))
    }
}

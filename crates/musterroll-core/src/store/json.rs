use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::{RunGuard, Sheet, Stamped, Workbook};

/// How many times a sheet write waits for another writer to finish
const WRITE_LOCK_ATTEMPTS: u32 = 200;

/// Pause between write lock attempts
const WRITE_RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(10);

/// A write lock older than this was left behind by a crashed process
const WRITE_LOCK_STALE_SECS: i64 = 30;

/// Sequence for lock owner tokens, unique per process
static LOCK_SEQ: AtomicU64 = AtomicU64::new(0);

/// Workbook stored as a directory with one JSON file per sheet.
pub struct JsonWorkbook {
    dir: PathBuf,
}

impl JsonWorkbook {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(name)))
    }

    fn lock_path(&self, resource: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", file_stem(resource)))
    }

    fn load(&self, name: &str) -> Result<Option<Stamped<Sheet>>> {
        let path = self.sheet_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)?;
        let stamped: Stamped<Sheet> =
            serde_json::from_str(&contents).map_err(|source| Error::Corrupt {
                sheet: name.to_string(),
                source,
            })?;

        Ok(Some(stamped))
    }

    fn save(&self, name: &str, sheet: &Sheet) -> Result<()> {
        let stamped = Stamped::new(sheet);
        let path = self.sheet_path(name);
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(&stamped).map_err(|source| Error::Corrupt {
            sheet: name.to_string(),
            source,
        })?;
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &path)?;
        debug!(sheet = name, rows = sheet.rows.len(), "Sheet written");
        Ok(())
    }

    /// Per-sheet lock held across every write of `name`.
    fn lock_for_write(&self, name: &str) -> Result<RunGuard> {
        let resource = format!("write-{}", name);
        for _ in 0..WRITE_LOCK_ATTEMPTS {
            match self.try_lock(&resource, Duration::seconds(WRITE_LOCK_STALE_SECS)) {
                Err(Error::Busy(_)) => std::thread::sleep(WRITE_RETRY_DELAY),
                other => return other,
            }
        }
        Err(Error::Busy(resource))
    }
}

impl Workbook for JsonWorkbook {
    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>> {
        Ok(self.load(name)?.map(|stamped| stamped.data))
    }

    fn write_sheet(&self, name: &str, sheet: &Sheet) -> Result<()> {
        let _guard = self.lock_for_write(name)?;
        self.save(name, sheet)
    }

    fn update_sheet<T, F>(&self, name: &str, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Option<Sheet>) -> Result<T>,
    {
        let _guard = self.lock_for_write(name)?;
        let before = self.read_sheet(name)?;
        let mut slot = before.clone();
        let out = edit(&mut slot)?;
        match slot {
            Some(sheet) if Some(&sheet) != before.as_ref() => self.save(name, &sheet)?,
            _ => {}
        }
        Ok(out)
    }

    fn updated_at(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.load(name)?.map(|stamped| stamped.updated_at))
    }

    fn try_lock(&self, resource: &str, stale_after: Duration) -> Result<RunGuard> {
        let path = self.lock_path(resource);

        for attempt in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let token = lock_token();
                    if let Err(e) = writeln!(file, "{}", token) {
                        drop(file);
                        if let Err(remove) = std::fs::remove_file(&path) {
                            warn!(resource, error = %remove, "Failed to remove empty lock file");
                        }
                        return Err(e.into());
                    }
                    let release_path = path.clone();
                    let name = resource.to_string();
                    return Ok(RunGuard::new(resource, move || {
                        release_lock(&release_path, &token, &name)
                    }));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if attempt == 0 && break_stale_lock(&path, stale_after) {
                        warn!(resource, "Broke abandoned lock");
                        continue;
                    }
                    return Err(Error::Busy(resource.to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Busy(resource.to_string()))
    }
}

/// `<pid>-<seq>`, written into the lock file so a holder only ever removes
/// its own lock.
fn lock_token() -> String {
    format!("{}-{}", std::process::id(), LOCK_SEQ.fetch_add(1, Ordering::Relaxed))
}

/// Remove the lock at `path` if it still carries `token`. A lock broken as
/// stale and retaken by someone else stays in place.
fn release_lock(path: &Path, token: &str, resource: &str) {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim() == token => {
            if let Err(e) = std::fs::remove_file(path) {
                warn!(resource, error = %e, "Failed to remove lock file");
            }
        }
        Ok(_) => warn!(resource, "Lock was taken over while held; leaving it to the new holder"),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(resource, "Lock file already gone");
        }
        Err(e) => warn!(resource, error = %e, "Failed to read lock file"),
    }
}

/// Move a stale lock aside under a unique name; only one breaker can move a
/// given file. When the moved file turns out to be fresh, a new holder took
/// the lock in between and it is linked back in place.
fn break_stale_lock(path: &Path, stale_after: Duration) -> bool {
    if !lock_is_stale(path, stale_after) {
        return false;
    }

    let aside = path.with_extension(format!("lock.{}", lock_token()));
    if std::fs::rename(path, &aside).is_err() {
        return false;
    }

    let broken = lock_is_stale(&aside, stale_after);
    if !broken {
        if let Err(e) = std::fs::hard_link(&aside, path) {
            warn!(path = %path.display(), error = %e, "Failed to restore lock moved aside");
        }
    }
    if let Err(e) = std::fs::remove_file(&aside) {
        warn!(path = %aside.display(), error = %e, "Failed to remove lock moved aside");
    }
    broken
}

fn lock_is_stale(path: &Path, stale_after: Duration) -> bool {
    let limit = match stale_after.to_std() {
        Ok(limit) => limit,
        Err(_) => return false,
    };
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .map(|age| age > limit)
        .unwrap_or(false)
}

/// File-system safe form of a sheet name ("1st Year" -> "1st_Year")
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::trigger::TriggerSpec;

/// Registry file name in the workbook directory
const TRIGGERS_FILE: &str = "triggers.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledTrigger {
    pub id: u64,
    pub spec: TriggerSpec,
    pub installed_at: DateTime<Utc>,
}

/// Where installed triggers live. `installed` always reflects the current
/// persisted state, so a running scheduler sees another process's changes.
pub trait TriggerRegistry {
    fn installed(&self) -> Result<Vec<InstalledTrigger>>;

    fn install(&mut self, spec: TriggerSpec) -> Result<InstalledTrigger>;

    /// Returns false when no trigger had that id.
    fn remove(&mut self, id: u64) -> Result<bool>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RegistryState {
    next_id: u64,
    triggers: Vec<InstalledTrigger>,
}

impl RegistryState {
    fn install(&mut self, spec: TriggerSpec) -> InstalledTrigger {
        self.next_id += 1;
        let trigger = InstalledTrigger {
            id: self.next_id,
            spec,
            installed_at: Utc::now(),
        };
        self.triggers.push(trigger.clone());
        trigger
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.triggers.len();
        self.triggers.retain(|t| t.id != id);
        self.triggers.len() != before
    }
}

/// Triggers persisted as JSON next to the workbook sheets.
pub struct FileTriggerRegistry {
    path: PathBuf,
}

impl FileTriggerRegistry {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(TRIGGERS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<RegistryState> {
        if !self.path.exists() {
            return Ok(RegistryState::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|source| Error::Corrupt {
            sheet: TRIGGERS_FILE.to_string(),
            source,
        })
    }

    fn save(&self, state: &RegistryState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(state).map_err(|source| Error::Corrupt {
            sheet: TRIGGERS_FILE.to_string(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TriggerRegistry for FileTriggerRegistry {
    fn installed(&self) -> Result<Vec<InstalledTrigger>> {
        Ok(self.load()?.triggers)
    }

    fn install(&mut self, spec: TriggerSpec) -> Result<InstalledTrigger> {
        let mut state = self.load()?;
        let trigger = state.install(spec);
        self.save(&state)?;
        Ok(trigger)
    }

    fn remove(&mut self, id: u64) -> Result<bool> {
        let mut state = self.load()?;
        let removed = state.remove(id);
        if removed {
            self.save(&state)?;
        }
        Ok(removed)
    }
}

/// Registry held in memory, for tests and one-off runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryTriggerRegistry {
    state: RegistryState,
}

impl MemoryTriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TriggerRegistry for MemoryTriggerRegistry {
    fn installed(&self) -> Result<Vec<InstalledTrigger>> {
        Ok(self.state.triggers.clone())
    }

    fn install(&mut self, spec: TriggerSpec) -> Result<InstalledTrigger> {
        Ok(self.state.install(spec))
    }

    fn remove(&mut self, id: u64) -> Result<bool> {
        Ok(self.state.remove(id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub kept: usize,
    pub installed: usize,
    pub removed: usize,
}

impl std::fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} kept, {} installed, {} removed",
            self.kept, self.installed, self.removed
        )
    }
}

/// Bring the registry in line with `desired`: each desired spec ends up
/// installed exactly once and nothing else remains. Missing triggers are
/// installed before extras and duplicates are removed.
pub fn reconcile<R: TriggerRegistry + ?Sized>(
    registry: &mut R,
    desired: &[TriggerSpec],
) -> Result<ReconcileReport> {
    let mut unclaimed = registry.installed()?;
    let mut missing = Vec::new();
    let mut report = ReconcileReport::default();

    for spec in desired {
        match unclaimed.iter().position(|t| t.spec == *spec) {
            Some(idx) => {
                unclaimed.remove(idx);
                report.kept += 1;
            }
            None => missing.push(*spec),
        }
    }

    for spec in missing {
        let trigger = registry.install(spec)?;
        info!(id = trigger.id, trigger = %spec, "Trigger installed");
        report.installed += 1;
    }

    for stale in unclaimed {
        if registry.remove(stale.id)? {
            info!(id = stale.id, trigger = %stale.spec, "Trigger removed");
            report.removed += 1;
        } else {
            debug!(id = stale.id, "Trigger already gone");
        }
    }

    Ok(report)
}

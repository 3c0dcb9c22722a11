//! Recurring refresh triggers.
//!
//! `install` reconciles the persisted trigger set against the configured
//! schedule; `Scheduler` is the daemon that fires them.

pub mod registry;
pub mod runner;
pub mod trigger;

pub use registry::{
    reconcile, FileTriggerRegistry, InstalledTrigger, MemoryTriggerRegistry, ReconcileReport,
    TriggerRegistry,
};
pub use runner::{Firing, Scheduler};
pub use trigger::{desired_triggers, Cadence, Job, TriggerSpec};

use crate::config::Config;
use crate::error::Result;

/// Idempotent schedule setup for the configured cadences.
pub fn install<R: TriggerRegistry + ?Sized>(
    registry: &mut R,
    config: &Config,
) -> Result<ReconcileReport> {
    config.validate()?;
    reconcile(registry, &desired_triggers(&config.schedule))
}

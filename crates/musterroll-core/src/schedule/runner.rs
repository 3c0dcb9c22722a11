use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

use crate::aggregate::{JobReport, Pipeline};
use crate::error::{Error, Result};
use crate::store::Workbook;

use super::registry::TriggerRegistry;
use super::trigger::{Job, TriggerSpec};

/// Longest sleep between wakes; the registry is re-read at least this often.
const MAX_SLEEP_SECS: i64 = 60;

/// One trigger firing and how it went.
#[derive(Debug)]
pub struct Firing {
    pub trigger_id: u64,
    pub job: Job,
    pub outcome: Result<JobReport>,
}

struct Armed {
    spec: TriggerSpec,
    next_due: DateTime<Local>,
}

/// Timer daemon firing installed triggers against a pipeline.
///
/// Firings run one at a time on the scheduler's task. Each firing is a full,
/// independent run; a failure is logged and the loop carries on.
pub struct Scheduler<W: Workbook, R: TriggerRegistry> {
    pipeline: Pipeline<W>,
    registry: R,
    armed: HashMap<u64, Armed>,
}

impl<W: Workbook, R: TriggerRegistry> Scheduler<W, R> {
    pub fn new(pipeline: Pipeline<W>, registry: R) -> Self {
        Self {
            pipeline,
            registry,
            armed: HashMap::new(),
        }
    }

    pub fn pipeline(&self) -> &Pipeline<W> {
        &self.pipeline
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// Sync armed triggers with the registry. New triggers are first due one
    /// cadence after `now`.
    fn reload(&mut self, now: DateTime<Local>) -> Result<()> {
        let installed = self.registry.installed()?;
        self.armed
            .retain(|id, armed| installed.iter().any(|t| t.id == *id && t.spec == armed.spec));
        for trigger in installed {
            self.armed.entry(trigger.id).or_insert_with(|| {
                debug!(id = trigger.id, trigger = %trigger.spec, "Trigger armed");
                Armed {
                    spec: trigger.spec,
                    next_due: trigger.spec.cadence.next_after(&now),
                }
            });
        }
        Ok(())
    }

    /// Fire everything due at `now`, earliest first.
    pub fn tick(&mut self, now: DateTime<Local>) -> Result<Vec<Firing>> {
        self.reload(now)?;

        let mut due: Vec<(DateTime<Local>, u64)> = self
            .armed
            .iter()
            .filter(|(_, a)| a.next_due <= now)
            .map(|(id, a)| (a.next_due, *id))
            .collect();
        due.sort();

        let mut firings = Vec::with_capacity(due.len());
        for (_, id) in due {
            let Some(armed) = self.armed.get_mut(&id) else {
                continue;
            };
            let job = armed.spec.job;
            armed.next_due = armed.spec.cadence.next_after(&now);

            let outcome = self.pipeline.run_job(job);
            log_outcome(id, job, &outcome);
            firings.push(Firing {
                trigger_id: id,
                job,
                outcome,
            });
        }
        Ok(firings)
    }

    /// When the earliest armed trigger is next due.
    pub fn next_due(&self) -> Option<DateTime<Local>> {
        self.armed.values().map(|a| a.next_due).min()
    }

    /// Run until `shutdown` resolves.
    pub async fn run<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("Scheduler started");

        loop {
            let now = Local::now();
            if let Err(e) = self.tick(now) {
                error!(error = %e, "Failed to read trigger registry");
            }

            let wait = self
                .next_due()
                .map(|due| (due - Local::now()).num_seconds())
                .unwrap_or(MAX_SLEEP_SECS)
                .clamp(1, MAX_SLEEP_SECS);

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Scheduler stopping");
                    break;
                }
                _ = tokio::time::sleep(std::time::Duration::from_secs(wait as u64)) => {}
            }
        }
        Ok(())
    }
}

fn log_outcome(trigger_id: u64, job: Job, outcome: &Result<JobReport>) {
    match outcome {
        Ok(report) => info!(trigger_id, %job, "{}", report),
        Err(Error::Busy(resource)) => {
            warn!(trigger_id, %job, resource = %resource, "Previous run still in progress, skipped")
        }
        Err(e) => error!(trigger_id, %job, error = %e, "Scheduled run failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{CadetRecord, CohortYear};
    use crate::schedule::registry::MemoryTriggerRegistry;
    use crate::schedule::trigger::Cadence;
    use crate::store::codec::encode_cadet;
    use crate::store::layout::{attendance_log, roster};
    use crate::store::{Cell, MemoryWorkbook, Sheet};
    use chrono::Duration;

    fn workbook() -> MemoryWorkbook {
        let mut first = Sheet::with_header(&roster::HEADER);
        first.push(encode_cadet(1, &CadetRecord::new("C1", CohortYear::First)));
        let mut log = Sheet::with_header(&attendance_log::HEADER);
        log.push(vec![Cell::from("2026-01-15 08:00:00"), Cell::from("EVT1"), Cell::from("C1")]);
        MemoryWorkbook::new()
            .with_sheet("1st Year", first)
            .with_sheet("Attendance_Logs", log)
    }

    fn scheduler(specs: &[TriggerSpec]) -> Scheduler<MemoryWorkbook, MemoryTriggerRegistry> {
        let mut registry = MemoryTriggerRegistry::new();
        for spec in specs {
            registry.install(*spec).unwrap();
        }
        Scheduler::new(Pipeline::new(workbook(), Config::default()), registry)
    }

    #[test]
    fn test_fires_after_one_interval() {
        let strength = TriggerSpec::new(Job::EventStrength, Cadence::EveryMinutes { minutes: 5 });
        let mut scheduler = scheduler(&[strength]);
        let start = Local::now();

        assert!(scheduler.tick(start).unwrap().is_empty());
        assert!(scheduler.tick(start + Duration::minutes(4)).unwrap().is_empty());

        let firings = scheduler.tick(start + Duration::minutes(5)).unwrap();
        assert_eq!(firings.len(), 1);
        assert_eq!(firings[0].job, Job::EventStrength);
        assert!(firings[0].outcome.is_ok());
        assert!(scheduler
            .pipeline()
            .workbook()
            .read_sheet("Event_Strength")
            .unwrap()
            .is_some());

        assert_eq!(scheduler.next_due(), Some(start + Duration::minutes(10)));
    }

    #[test]
    fn test_failed_firing_is_rearmed() {
        let category =
            TriggerSpec::new(Job::AttendanceCategories, Cadence::EveryHours { hours: 1 });
        let mut scheduler = scheduler(&[category]);
        let start = Local::now();
        scheduler.tick(start).unwrap();

        let firings = scheduler.tick(start + Duration::hours(1)).unwrap();
        assert_eq!(firings.len(), 1);
        assert!(matches!(firings[0].outcome, Err(Error::MissingDependency(_))));
        assert_eq!(scheduler.next_due(), Some(start + Duration::hours(2)));
    }

    #[test]
    fn test_removed_trigger_is_disarmed() {
        let strength = TriggerSpec::new(Job::EventStrength, Cadence::EveryMinutes { minutes: 5 });
        let mut scheduler = scheduler(&[strength]);
        let start = Local::now();
        scheduler.tick(start).unwrap();
        assert!(scheduler.next_due().is_some());

        let id = scheduler.registry_mut().installed().unwrap()[0].id;
        scheduler.registry_mut().remove(id).unwrap();
        assert!(scheduler.tick(start + Duration::minutes(5)).unwrap().is_empty());
        assert!(scheduler.next_due().is_none());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let scheduler = scheduler(&[]);
        scheduler.run(async {}).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_waits_for_signal() {
        let strength = TriggerSpec::new(Job::EventStrength, Cadence::EveryMinutes { minutes: 5 });
        let scheduler = scheduler(&[strength]);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            scheduler
                .run(async {
                    let _ = rx.await;
                })
                .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}

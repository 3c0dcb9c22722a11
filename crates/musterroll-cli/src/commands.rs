use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tokio::signal;
use tracing::{info, warn};

use musterroll_core::intake::{Mark, NewEvent};
use musterroll_core::models::AttendanceStatus;
use musterroll_core::schedule::{self, FileTriggerRegistry, Scheduler, TriggerRegistry};
use musterroll_core::utils::{parse_date, parse_time};
use musterroll_core::{JsonWorkbook, Pipeline};

use crate::Command;

#[derive(Serialize)]
struct StatusView {
    strength: String,
    summary: String,
    #[serde(rename = "lastUpdated")]
    last_updated: String,
    triggers: Vec<String>,
}

pub fn parse_date_arg(raw: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(raw).ok_or_else(|| format!("not a date: {raw:?} (expected YYYY-MM-DD)"))
}

pub fn parse_time_arg(raw: &str) -> std::result::Result<NaiveTime, String> {
    parse_time(raw).ok_or_else(|| format!("not a time: {raw:?} (expected HH:MM)"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

pub async fn run(command: Command, pipeline: Pipeline<JsonWorkbook>) -> Result<()> {
    let registry = FileTriggerRegistry::new(pipeline.workbook().dir());

    match command {
        Command::InstallSchedule => {
            let mut registry = registry;
            let report = schedule::install(&mut registry, pipeline.config())
                .context("Failed to install schedule")?;
            info!(%report, "Schedule installed");
            print_json(&report)
        }
        Command::RunStrength => {
            let report = pipeline.run_strength().context("Event strength run failed")?;
            print_json(&report)
        }
        Command::RunCategory => {
            let report = pipeline.run_category().context("Attendance category run failed")?;
            print_json(&report)
        }
        Command::Daemon { .. } => run_daemon(pipeline, registry).await,
        Command::Strength => print_json(&pipeline.reports().strength_summary()?),
        Command::Summary => print_json(&pipeline.reports().attendance_summary()?),
        Command::Recent { limit } => {
            let limit = limit.unwrap_or(pipeline.config().recent_events_limit);
            print_json(&pipeline.reports().recent_events(limit)?)
        }
        Command::Active => print_json(&pipeline.reports().active_event()?),
        Command::Roster { event_id } => print_json(&pipeline.reports().event_roster(&event_id)?),
        Command::Cadets => print_json(&pipeline.reports().cadets()?),
        Command::UnitStrength => print_json(&pipeline.reports().unit_strength()?),
        Command::CreateEvent {
            title,
            type_label,
            date,
            time,
        } => {
            let event = pipeline.intake().create_event(NewEvent {
                title,
                type_label,
                date,
                time,
            })?;
            print_json(&event)
        }
        Command::EndEvent => {
            let ended = pipeline.intake().end_active_event()?;
            print_json(&serde_json::json!({ "ended": ended }))
        }
        Command::Mark {
            event_id,
            enrollment_id,
            name,
            status,
        } => {
            let outcome = pipeline.intake().record_attendance(Mark {
                event_id,
                enrollment_id,
                name,
                status: status
                    .as_deref()
                    .map(AttendanceStatus::parse)
                    .unwrap_or(AttendanceStatus::Present),
            })?;
            print_json(&outcome)
        }
        Command::Status => {
            let status = pipeline.reports().status()?;
            let triggers = registry
                .installed()
                .context("Failed to read trigger registry")?
                .iter()
                .map(|t| t.spec.to_string())
                .collect();
            print_json(&StatusView {
                strength: status.strength.age(),
                summary: status.summary.age(),
                last_updated: status.last_updated(),
                triggers,
            })
        }
    }
}

async fn run_daemon(pipeline: Pipeline<JsonWorkbook>, registry: FileTriggerRegistry) -> Result<()> {
    let installed = registry.installed().context("Failed to read trigger registry")?;
    if installed.is_empty() {
        warn!("No triggers installed; run `musterroll install-schedule` first");
    }
    info!(
        workbook = %pipeline.workbook().dir().display(),
        triggers = installed.len(),
        "Starting scheduler"
    );

    Scheduler::new(pipeline, registry)
        .run(shutdown_signal())
        .await
        .context("Scheduler stopped with an error")
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl-C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_arg() {
        assert_eq!(parse_date_arg("2026-01-26"), Ok(NaiveDate::from_ymd_opt(2026, 1, 26).unwrap()));
        assert!(parse_date_arg("next tuesday").is_err());
    }

    #[test]
    fn test_parse_time_arg() {
        assert_eq!(parse_time_arg("07:30"), Ok(NaiveTime::from_hms_opt(7, 30, 0).unwrap()));
        assert!(parse_time_arg("25:00").is_err());
    }
}

//! musterroll - cadet attendance workbook aggregation.
//!
//! One-shot commands refresh or query the workbook and print JSON on stdout.
//! `daemon` runs the installed refresh triggers until interrupted.

mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use musterroll_core::{Config, JsonWorkbook, Pipeline};

/// Log file prefix under `--log-dir`
const LOG_FILE_PREFIX: &str = "musterroll.log";

#[derive(Parser, Debug)]
#[command(name = "musterroll")]
#[command(about = "Attendance strength and category summaries for a cadet unit")]
#[command(version)]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "MUSTERROLL_CONFIG")]
    config: Option<PathBuf>,

    /// Workbook directory, overriding the config
    #[arg(long, global = true, env = "MUSTERROLL_WORKBOOK")]
    workbook: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install the refresh triggers, replacing stale or duplicate ones
    InstallSchedule,
    /// Rebuild the event strength summary now
    RunStrength,
    /// Refresh the per-cadet category counts now
    RunCategory,
    /// Fire installed triggers until Ctrl-C
    Daemon {
        /// Also write daily-rolling log files here
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
    /// Print the event strength summary
    Strength,
    /// Print the per-cadet attendance summary
    Summary,
    /// Print the most recent events
    Recent {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the live event and its running strength
    Active,
    /// Print every cadet's status at an event
    Roster { event_id: String },
    /// Print the enrolled cadets, seniors first
    Cadets,
    /// Print the enrolled head-count per year
    UnitStrength,
    /// Open a new event
    CreateEvent {
        #[arg(long)]
        title: String,
        #[arg(long = "type")]
        type_label: String,
        /// YYYY-MM-DD
        #[arg(long, value_parser = commands::parse_date_arg)]
        date: chrono::NaiveDate,
        /// HH:MM
        #[arg(long, value_parser = commands::parse_time_arg)]
        time: Option<chrono::NaiveTime>,
    },
    /// Close the most recent active event
    EndEvent,
    /// Record a cadet's attendance at an event
    Mark {
        event_id: String,
        enrollment_id: String,
        #[arg(long)]
        name: Option<String>,
        /// Present (default), Absent, or an on-duty descriptor such as "OD"
        #[arg(long)]
        status: Option<String>,
    },
    /// Show when each summary table was last refreshed
    Status,
}

impl Command {
    fn default_log_level(&self) -> &'static str {
        match self {
            Command::Daemon { .. } => "info",
            _ => "warn",
        }
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr so stdout stays clean JSON. With a log directory the
/// same events are also written to a daily file; the returned guard must be
/// held until exit so buffered lines are flushed.
fn init_tracing(default_level: &str, log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        Some(ref path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    if let Some(ref dir) = args.workbook {
        config.workbook_dir = Some(dir.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let log_dir = match args.command {
        Command::Daemon { ref log_dir } => log_dir.as_ref(),
        _ => None,
    };
    let _log_guard = init_tracing(args.command.default_log_level(), log_dir);

    let config = load_config(&args)?;
    let dir = config.workbook_dir().context("Failed to resolve workbook directory")?;
    let workbook = JsonWorkbook::new(dir.clone())
        .with_context(|| format!("Failed to open workbook at {}", dir.display()))?;
    let pipeline = Pipeline::new(workbook, config);

    commands::run(args.command, pipeline).await
}

// src/logging.rs

//! Logging setup for `segexport` using `tracing` + `tracing-subscriber`.
//!
//! Every event goes to three places:
//! - STDERR, for the operator watching the run,
//! - the master log, truncated at the start of each run,
//! - a per-run session log named after the run's start time.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `SEGEXPORT_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, time::ChronoLocal};
use tracing_subscriber::prelude::*;

use crate::cli::LogLevel;

/// Name of the log file that is rewritten on every run.
pub const MASTER_LOG_NAME: &str = "orchestrator_log.txt";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The pair of log files for one run. Computed once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDestinations {
    pub master: PathBuf,
    pub session: PathBuf,
}

impl LogDestinations {
    pub fn new(dir: &Path, started_at: DateTime<Local>) -> Self {
        let session_name = format!("orchestrator_log_{}.txt", started_at.format("%Y%m%d_%H%M%S"));
        Self {
            master: dir.join(MASTER_LOG_NAME),
            session: dir.join(session_name),
        }
    }
}

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, destinations: &LogDestinations) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("SEGEXPORT_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    let master = open_log(&destinations.master, true)?;
    let session = open_log(&destinations.session, false)?;

    let timer = ChronoLocal::new(TIMESTAMP_FORMAT.to_string());

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(
            fmt::layer()
                .with_timer(timer.clone())
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .with_timer(timer.clone())
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(master)),
        )
        .with(
            fmt::layer()
                .with_timer(timer)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(session)),
        )
        .init();

    Ok(())
}

fn open_log(path: &Path, truncate: bool) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating log dir {:?}", parent))?;
        }
    }
    let mut options = OpenOptions::new();
    options.create(true);
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    options
        .open(path)
        .with_context(|| format!("opening log file {:?}", path))
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

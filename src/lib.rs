// src/lib.rs

pub mod cli;
pub mod config;
pub mod control;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod plan;
pub mod resume;
pub mod types;

use anyhow::Result;
use tracing::{error, info};

use crate::cli::CliArgs;
use crate::config::{default_settings_path, load_settings, parse_duration, Settings};
use crate::engine::{prepare_batch, Batch, Orchestrator};
use crate::errors::ExportError;
use crate::exec::{cancel_pair, Invocation, RealLauncher};
use crate::fs::{FileSystem, RealFileSystem};
use crate::resume::ResumePolicy;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings loading and CLI overrides
/// - batch preparation (control file, sidecar, interval plan)
/// - the orchestrator with the real process launcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    info!("starting segexport");

    let settings = resolve_settings(&args).inspect_err(|e| error!(error = %e, "invalid settings"))?;
    let fs = RealFileSystem;
    let batch = prepare_batch(&fs, &args.control_file)
        .inspect_err(|e| error!(error = %e, "configuration error; aborting batch"))?;

    if args.dry_run {
        print_dry_run(&settings, &batch, &fs);
        return Ok(());
    }

    // Ctrl-C -> escalate any in-flight launch and stop scheduling.
    let (cancel_handle, cancel) = cancel_pair();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("process interrupted by user; attempting clean shutdown");
        cancel_handle.cancel();
    });

    let mut orchestrator = Orchestrator::new(&settings, batch, RealLauncher::new(), fs);
    let summary = orchestrator.run(cancel).await;
    summary.log();

    Ok(())
}

/// Defaults, then the settings file, then CLI flags.
pub fn resolve_settings(args: &CliArgs) -> errors::Result<Settings> {
    let path = args
        .settings
        .clone()
        .unwrap_or_else(|| default_settings_path(&args.control_file));
    if args.settings.is_some() && !path.is_file() {
        return Err(ExportError::MissingInputFile(path));
    }

    let mut settings = load_settings(&path)?;

    if let Some(tool) = &args.tool_path {
        settings.tool.path = tool.clone();
    }
    if let Some(timeout) = &args.timeout {
        let timeout = parse_duration(timeout)
            .map_err(|e| ExportError::ConfigError(format!("--timeout: {e}")))?;
        if timeout.is_zero() {
            return Err(ExportError::ConfigError(
                "--timeout must be greater than zero".to_string(),
            ));
        }
        settings.supervision.timeout = timeout;
    }
    if args.no_resume {
        settings.resume = false;
    }

    Ok(settings)
}

/// Print the plan without launching anything.
fn print_dry_run(settings: &Settings, batch: &Batch, fs: &dyn FileSystem) {
    let resume = ResumePolicy::new(
        &batch.seed.source_path,
        batch.seed.output_dir.clone(),
        settings.resume,
    );

    println!("segexport dry-run");
    println!("  source     = {}", batch.seed.source_path.display());
    println!("  output_dir = {}", batch.seed.output_dir.display());
    println!("  sidecar    = {}", batch.sidecar.display());
    println!("  command    = {}", Invocation::from_settings(settings));
    println!(
        "  timeout = {:?}, poll = {:?}, grace = {:?}, settle = {:?}",
        settings.supervision.timeout,
        settings.supervision.poll_interval,
        settings.supervision.grace_period,
        settings.supervision.settle_delay
    );
    println!("  resume = {}", settings.resume);
    println!();

    println!("intervals ({}):", batch.intervals.len());
    for interval in &batch.intervals {
        let skip = if resume.should_skip(fs, interval) {
            "  [skip: exists]"
        } else {
            ""
        };
        println!(
            "  - {:>5}..={:<5} -> {}{}",
            interval.start,
            interval.end,
            resume.artifact_name(interval),
            skip
        );
    }
}

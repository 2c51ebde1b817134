// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

/// Command-line arguments for `segexport`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "segexport",
    version,
    about = "Export time-sliced FBX files by launching the authoring tool once per slice.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the authoring tool executable.
    ///
    /// Overrides `[tool].path` from the settings file.
    #[arg(value_name = "TOOL_PATH")]
    pub tool_path: Option<PathBuf>,

    /// Control file shared with the in-host export script.
    ///
    /// Its first two lines name the source project and the output directory.
    #[arg(long, value_name = "PATH", default_value = "export_config.txt")]
    pub control_file: PathBuf,

    /// Settings file (TOML).
    ///
    /// Default: `segexport.toml` next to the control file, if it exists.
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Directory for the master and session log files.
    ///
    /// Default: the directory holding the control file.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Per-launch timeout, e.g. `120s` or `5m`.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Re-export every interval even if its artifact already exists.
    #[arg(long)]
    pub no_resume: bool,

    /// Load inputs and print the plan, but don't launch anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SEGEXPORT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    pub fn effective_log_dir(&self) -> PathBuf {
        if let Some(dir) = &self.log_dir {
            return dir.clone();
        }
        parent_or_cwd(&self.control_file)
    }
}

fn parent_or_cwd(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

// src/exec/backend.rs

//! Pluggable process backend.
//!
//! The supervisor talks to a `Launcher` and the `ProcessHandle`s it returns
//! instead of `tokio::process` directly. Production code uses
//! [`RealLauncher`]; tests provide a scripted fake that never spawns an OS
//! process.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

use crate::config::Settings;

/// The fixed command line used for every launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    /// Tool path plus the run-script flag and the script identifier.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            program: settings.tool.path.clone(),
            args: vec![
                settings.tool.run_script_flag.clone(),
                settings.tool.script_id.clone(),
            ],
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Starts processes.
pub trait Launcher: Send {
    fn launch(&mut self, invocation: &Invocation) -> Result<Box<dyn ProcessHandle>>;
}

/// A started process, seen through the operations the supervisor needs.
///
/// All methods are non-blocking; the supervisor does its own waiting.
pub trait ProcessHandle: Send {
    /// OS process id, if the process has not been reaped yet.
    fn id(&self) -> Option<u32>;

    /// `Some(code)` once the process has exited. A process ended by a signal
    /// reports `-1`.
    fn try_exit_code(&mut self) -> Result<Option<i32>>;

    /// Ask the process to stop (SIGTERM on Unix).
    fn request_termination(&mut self) -> Result<()>;

    /// Stop the process with a signal it cannot ignore.
    fn force_kill(&mut self) -> Result<()>;
}

/// Launcher backed by `tokio::process`.
#[derive(Debug, Default)]
pub struct RealLauncher;

impl RealLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl Launcher for RealLauncher {
    fn launch(&mut self, invocation: &Invocation) -> Result<Box<dyn ProcessHandle>> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning '{}'", invocation.program.display()))?;

        let pid = child.id();
        debug!(pid, "external tool spawned");

        // Always consume output so pipe buffers never fill; log at debug.
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(pid, "stdout: {}", line);
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(pid, "stderr: {}", line);
                }
            });
        }

        Ok(Box::new(RealProcess { child }))
    }
}

struct RealProcess {
    child: Child,
}

impl ProcessHandle for RealProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn try_exit_code(&mut self) -> Result<Option<i32>> {
        let status = self.child.try_wait().context("polling external tool")?;
        Ok(status.map(|s| s.code().unwrap_or(-1)))
    }

    #[cfg(unix)]
    fn request_termination(&mut self) -> Result<()> {
        // Already reaped: nothing left to signal.
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let pid = libc::pid_t::try_from(pid).context("pid out of range")?;
        // SAFETY: plain kill(2) on a pid we spawned and have not reaped.
        let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error()).context("sending SIGTERM");
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn request_termination(&mut self) -> Result<()> {
        self.child.start_kill().context("terminating external tool")
    }

    fn force_kill(&mut self) -> Result<()> {
        self.child.start_kill().context("killing external tool")
    }
}

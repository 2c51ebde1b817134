use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::time::Instant;

use segexport::control::{ControlChannel, ControlRecord};
use segexport::exec::{Invocation, Launcher, ProcessHandle};
use segexport::fs::mock::MockFileSystem;
use segexport::resume::ResumePolicy;

/// Script for one fake launch.
#[derive(Debug, Clone)]
pub struct FakeRun {
    /// Exit on its own after this long; `None` runs forever.
    pub exit_after: Option<Duration>,
    pub exit_code: i32,
    /// Write the artifact named by the control file when exiting.
    pub writes_artifact: bool,
    /// Exit when asked to terminate gracefully.
    pub honours_terminate: bool,
    /// Every stop/kill request fails and the process keeps running.
    pub unkillable: bool,
}

impl FakeRun {
    /// Behaves like a healthy export: a few seconds of work, exit 0, artifact.
    pub fn succeed() -> Self {
        Self {
            exit_after: Some(Duration::from_secs(3)),
            exit_code: 0,
            writes_artifact: true,
            honours_terminate: true,
            unkillable: false,
        }
    }

    pub fn succeed_without_artifact() -> Self {
        Self {
            writes_artifact: false,
            ..Self::succeed()
        }
    }

    pub fn fail(code: i32) -> Self {
        Self {
            exit_code: code,
            writes_artifact: false,
            ..Self::succeed()
        }
    }

    pub fn hang() -> Self {
        Self {
            exit_after: None,
            writes_artifact: false,
            ..Self::succeed()
        }
    }

    pub fn hang_ignoring_terminate() -> Self {
        Self {
            honours_terminate: false,
            ..Self::hang()
        }
    }

    pub fn unkillable() -> Self {
        Self {
            unkillable: true,
            honours_terminate: false,
            ..Self::hang()
        }
    }

    pub fn after(mut self, d: Duration) -> Self {
        self.exit_after = Some(d);
        self
    }
}

/// What the fake saw at one launch.
#[derive(Debug, Clone)]
pub struct LaunchRecord {
    pub invocation: Invocation,
    /// Control record as read at spawn time, like the in-host script does.
    pub control: ControlRecord,
}

/// Signals a fake process received, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Terminate,
    Kill,
}

/// A launcher that never spawns OS processes.
///
/// Each launch consumes the next scripted [`FakeRun`] (or the default), reads
/// the control file from the shared mock filesystem and, on a scripted
/// successful exit, writes the artifact the control record names.
pub struct FakeLauncher {
    fs: MockFileSystem,
    control: ControlChannel,
    runs: VecDeque<FakeRun>,
    default_run: FakeRun,
    fail_launch: bool,
    launches: Arc<Mutex<Vec<LaunchRecord>>>,
    signals: Arc<Mutex<Vec<Signal>>>,
}

impl FakeLauncher {
    pub fn new(fs: MockFileSystem, control_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            control: ControlChannel::new(control_path),
            runs: VecDeque::new(),
            default_run: FakeRun::succeed(),
            fail_launch: false,
            launches: Arc::new(Mutex::new(Vec::new())),
            signals: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_runs(mut self, runs: impl IntoIterator<Item = FakeRun>) -> Self {
        self.runs.extend(runs);
        self
    }

    pub fn with_default(mut self, run: FakeRun) -> Self {
        self.default_run = run;
        self
    }

    /// Every launch fails as if the binary did not exist.
    pub fn failing(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn launches(&self) -> Arc<Mutex<Vec<LaunchRecord>>> {
        Arc::clone(&self.launches)
    }

    pub fn signals(&self) -> Arc<Mutex<Vec<Signal>>> {
        Arc::clone(&self.signals)
    }
}

impl Launcher for FakeLauncher {
    fn launch(&mut self, invocation: &Invocation) -> Result<Box<dyn ProcessHandle>> {
        if self.fail_launch {
            return Err(anyhow!(
                "spawning '{}': No such file or directory",
                invocation.program.display()
            ));
        }

        let control = self.control.read(&self.fs)?;
        let policy = ResumePolicy::new(&control.source_path, control.output_dir.clone(), true);
        let artifact = policy.artifact_path(&control.interval());

        self.launches.lock().unwrap().push(LaunchRecord {
            invocation: invocation.clone(),
            control,
        });

        let run = self.runs.pop_front().unwrap_or_else(|| self.default_run.clone());
        Ok(Box::new(FakeProcess {
            run,
            started: Instant::now(),
            artifact,
            fs: self.fs.clone(),
            exit_code: None,
            signals: Arc::clone(&self.signals),
        }))
    }
}

struct FakeProcess {
    run: FakeRun,
    started: Instant,
    artifact: PathBuf,
    fs: MockFileSystem,
    exit_code: Option<i32>,
    signals: Arc<Mutex<Vec<Signal>>>,
}

impl ProcessHandle for FakeProcess {
    fn id(&self) -> Option<u32> {
        if self.exit_code.is_some() { None } else { Some(4242) }
    }

    fn try_exit_code(&mut self) -> Result<Option<i32>> {
        if self.exit_code.is_none() {
            if let Some(after) = self.run.exit_after {
                if self.started.elapsed() >= after {
                    if self.run.writes_artifact {
                        self.fs.add_file(&self.artifact, b"fbx".to_vec());
                    }
                    self.exit_code = Some(self.run.exit_code);
                }
            }
        }
        Ok(self.exit_code)
    }

    fn request_termination(&mut self) -> Result<()> {
        self.signals.lock().unwrap().push(Signal::Terminate);
        if self.run.unkillable {
            return Err(anyhow!("sending SIGTERM: Operation not permitted"));
        }
        if self.run.honours_terminate && self.exit_code.is_none() {
            self.exit_code = Some(-1);
        }
        Ok(())
    }

    fn force_kill(&mut self) -> Result<()> {
        self.signals.lock().unwrap().push(Signal::Kill);
        if self.run.unkillable {
            return Err(anyhow!("killing external tool: Operation not permitted"));
        }
        if self.exit_code.is_none() {
            self.exit_code = Some(-1);
        }
        Ok(())
    }
}

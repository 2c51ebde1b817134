// src/exec/supervisor.rs

//! Async shell around [`crate::exec::state`].
//!
//! Waiting is cooperative: the shell sleeps one poll interval (waking early
//! on cancellation), looks at the process, and lets the state machine decide
//! what happens next. The only other suspension point is the grace period
//! after a stop request.

use std::time::Duration;

use anyhow::Result;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::SupervisionSettings;
use crate::exec::backend::{Invocation, Launcher, ProcessHandle};
use crate::exec::cancel::CancelSignal;
use crate::exec::state::{transition, Action, Observation, SupervisorState};

/// What happened to one launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisionReport {
    /// Terminal state reached.
    pub state: SupervisorState,
    /// Exit code, when the process was seen exiting.
    pub exit_code: Option<i32>,
    /// Wall-clock time from spawn to the terminal state.
    pub elapsed: Duration,
    /// Escalation was triggered by the user rather than the timeout.
    pub cancelled: bool,
    /// Stop or kill requests that failed. The batch carries on regardless.
    pub termination_warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    settings: SupervisionSettings,
}

impl ProcessSupervisor {
    pub fn new(settings: SupervisionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SupervisionSettings {
        &self.settings
    }

    /// Launch the tool and supervise it to a terminal state.
    ///
    /// Returns `Err` only when the process could not be started.
    pub async fn supervise<L>(
        &self,
        launcher: &mut L,
        invocation: &Invocation,
        cancel: &mut CancelSignal,
    ) -> Result<SupervisionReport>
    where
        L: Launcher + ?Sized,
    {
        let mut child = launcher.launch(invocation)?;
        let started = Instant::now();
        info!(pid = child.id(), "external tool started");

        let mut state = SupervisorState::NotStarted;
        let mut observation = Observation::Spawned;
        let mut exit_code = None;
        let mut cancelled = false;
        let mut termination_warnings = Vec::new();

        loop {
            let step = transition(state, observation, self.settings.timeout);
            if step.next != state {
                debug!(from = ?state, to = ?step.next, "supervisor transition");
            }
            state = step.next;

            match step.action {
                Action::Wait => {
                    tokio::select! {
                        _ = sleep(self.settings.poll_interval) => {}
                        _ = cancel.cancelled() => {}
                    }
                }
                Action::Terminate => {
                    if cancelled {
                        info!("cancellation requested; asking external tool to stop");
                    } else {
                        warn!(
                            timeout_secs = self.settings.timeout.as_secs_f64(),
                            "external tool timed out; asking it to stop"
                        );
                    }
                    if let Err(err) = child.request_termination() {
                        warn!(error = %err, "graceful termination request failed");
                        termination_warnings.push(format!("terminate: {err:#}"));
                    }
                    sleep(self.settings.grace_period).await;
                }
                Action::Kill => {
                    warn!("external tool still running after grace period; force killing");
                    if let Err(err) = child.force_kill() {
                        warn!(error = %err, "force kill failed; process may still be running");
                        termination_warnings.push(format!("kill: {err:#}"));
                    }
                    break;
                }
                Action::Finish => break,
            }

            observation = self.observe(child.as_mut(), started, cancel, &mut exit_code);
            if observation == Observation::CancelRequested && state == SupervisorState::Running {
                cancelled = true;
            }
        }

        Ok(SupervisionReport {
            state,
            exit_code,
            elapsed: started.elapsed(),
            cancelled,
            termination_warnings,
        })
    }

    fn observe(
        &self,
        child: &mut dyn ProcessHandle,
        started: Instant,
        cancel: &CancelSignal,
        exit_code: &mut Option<i32>,
    ) -> Observation {
        match child.try_exit_code() {
            Ok(Some(code)) => {
                *exit_code = Some(code);
                return Observation::Exited(code);
            }
            Ok(None) => {}
            // Treated as still running: the timeout bounds how long this lasts.
            Err(err) => warn!(error = %err, "could not poll external tool"),
        }

        if cancel.is_cancelled() {
            Observation::CancelRequested
        } else {
            Observation::Alive {
                elapsed: started.elapsed(),
            }
        }
    }
}

// src/engine/orchestrator.rs

//! The batch loop.
//!
//! Intervals are processed strictly one after another: the external tool is
//! single-instance. For each interval:
//!
//! 1. skip it if resume is on and the artifact exists,
//! 2. rewrite the control file,
//! 3. launch and supervise the tool,
//! 4. verify the artifact independently of the exit code,
//! 5. settle before the next launch.
//!
//! No per-interval failure stops the batch. Cancellation stops it.

use tokio::time::sleep;
use tracing::{error, info, info_span, warn, Instrument};

use crate::config::{Settings, SupervisionSettings};
use crate::control::{ControlChannel, ControlRecord};
use crate::engine::batch::Batch;
use crate::engine::summary::{BatchSummary, IntervalReport};
use crate::exec::{
    CancelSignal, Invocation, Launcher, ProcessSupervisor, SupervisionReport, SupervisorState,
};
use crate::fs::FileSystem;
use crate::resume::ResumePolicy;
use crate::types::{Interval, RunOutcome};

/// Map a terminal supervision state plus the artifact check to an outcome.
///
/// A zero exit code without an artifact is a failure: the tool's exit code
/// alone is not trusted.
pub fn classify_outcome(report: &SupervisionReport, artifact_exists: bool) -> RunOutcome {
    if report.cancelled {
        return RunOutcome::Cancelled;
    }
    match report.state {
        SupervisorState::CompletedOk if artifact_exists => RunOutcome::Succeeded,
        SupervisorState::CompletedOk => RunOutcome::FailedNoArtifact,
        SupervisorState::CompletedWithError(code) => RunOutcome::FailedExitCode(code),
        SupervisorState::TimedOutTerminating | SupervisorState::Killed => RunOutcome::TimedOut,
        SupervisorState::NotStarted | SupervisorState::Running => RunOutcome::LaunchFailed(
            format!("supervision ended in non-terminal state {:?}", report.state),
        ),
    }
}

pub struct Orchestrator<L, F> {
    batch: Batch,
    invocation: Invocation,
    supervisor: ProcessSupervisor,
    resume: ResumePolicy,
    channel: ControlChannel,
    launcher: L,
    fs: F,
}

impl<L, F> Orchestrator<L, F>
where
    L: Launcher,
    F: FileSystem,
{
    pub fn new(settings: &Settings, batch: Batch, launcher: L, fs: F) -> Self {
        let resume = ResumePolicy::new(
            &batch.seed.source_path,
            batch.seed.output_dir.clone(),
            settings.resume,
        );
        let channel = ControlChannel::new(batch.control_file.clone());
        Self {
            invocation: Invocation::from_settings(settings),
            supervisor: ProcessSupervisor::new(settings.supervision),
            resume,
            channel,
            batch,
            launcher,
            fs,
        }
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn resume_policy(&self) -> &ResumePolicy {
        &self.resume
    }

    fn supervision(&self) -> &SupervisionSettings {
        self.supervisor.settings()
    }

    /// Process every planned interval in order.
    pub async fn run(&mut self, mut cancel: CancelSignal) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let intervals = self.batch.intervals.clone();

        for interval in intervals {
            if cancel.is_cancelled() {
                info!("batch cancelled; not scheduling remaining intervals");
                summary.cancelled = true;
                break;
            }

            let span = info_span!("interval", index = interval.index);
            let report = self
                .process_interval(interval, &mut cancel)
                .instrument(span)
                .await;
            let launched = report.outcome.launched();
            let was_cancelled = report.outcome == RunOutcome::Cancelled;
            summary.reports.push(report);

            if was_cancelled {
                summary.cancelled = true;
                break;
            }
            if launched {
                self.settle(&mut cancel).await;
            }
        }

        if !summary.cancelled {
            info!("all intervals have been processed");
        }
        summary
    }

    async fn process_interval(
        &mut self,
        interval: Interval,
        cancel: &mut CancelSignal,
    ) -> IntervalReport {
        let artifact = self.resume.artifact_path(&interval);
        info!(
            start = interval.start,
            end = interval.end,
            "processing {interval}"
        );

        if self.resume.should_skip(&self.fs, &interval) {
            info!(artifact = %artifact.display(), "skipping; artifact already exists");
            return IntervalReport::not_launched(interval, artifact, RunOutcome::Skipped);
        }

        let record = ControlRecord::for_interval(&self.batch.seed, &interval);
        if let Err(err) = self.channel.write(&self.fs, &record) {
            error!(error = %err, "could not write control file");
            return IntervalReport::not_launched(
                interval,
                artifact,
                RunOutcome::LaunchFailed(format!("writing control file: {err}")),
            );
        }

        info!(cmd = %self.invocation, "executing");
        let report = match self
            .supervisor
            .supervise(&mut self.launcher, &self.invocation, cancel)
            .await
        {
            Ok(report) => report,
            Err(err) => {
                error!(error = %format!("{err:#}"), "could not launch external tool");
                return IntervalReport::not_launched(
                    interval,
                    artifact,
                    RunOutcome::LaunchFailed(format!("{err:#}")),
                );
            }
        };

        let artifact_exists = self.fs.exists(&artifact);
        let outcome = classify_outcome(&report, artifact_exists);
        log_outcome(&interval, &report, &outcome, artifact_exists);

        IntervalReport {
            interval,
            artifact,
            outcome,
            elapsed: Some(report.elapsed),
            exit_code: report.exit_code,
            termination_warnings: report.termination_warnings,
        }
    }

    /// Pause between launches so the tool can release its resources.
    async fn settle(&self, cancel: &mut CancelSignal) {
        let delay = self.supervision().settle_delay;
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = sleep(delay) => {}
            _ = cancel.cancelled() => {}
        }
    }
}

fn log_outcome(
    interval: &Interval,
    report: &SupervisionReport,
    outcome: &RunOutcome,
    artifact_exists: bool,
) {
    let elapsed_ms = report.elapsed.as_millis() as u64;
    let exit_code = report.exit_code;

    for warning in &report.termination_warnings {
        warn!(elapsed_ms, "termination failure: {warning}");
    }

    match outcome {
        RunOutcome::Succeeded => info!(
            start = interval.start,
            end = interval.end,
            elapsed_ms,
            ?exit_code,
            "success; artifact created"
        ),
        RunOutcome::FailedNoArtifact => error!(
            start = interval.start,
            end = interval.end,
            elapsed_ms,
            ?exit_code,
            "tool reported success but no artifact was created"
        ),
        RunOutcome::FailedExitCode(code) => {
            error!(
                start = interval.start,
                end = interval.end,
                elapsed_ms,
                exit_code = code,
                "tool exited with an error"
            );
            if artifact_exists {
                warn!("artifact exists despite the error; a resumed run will skip it");
            }
        }
        RunOutcome::TimedOut => error!(
            start = interval.start,
            end = interval.end,
            elapsed_ms,
            state = ?report.state,
            artifact_exists,
            "tool timed out and was terminated"
        ),
        RunOutcome::Cancelled => warn!(
            start = interval.start,
            end = interval.end,
            elapsed_ms,
            state = ?report.state,
            "interval cancelled by user"
        ),
        RunOutcome::Skipped | RunOutcome::LaunchFailed(_) => {}
    }
}

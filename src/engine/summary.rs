// src/engine/summary.rs

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::types::{Interval, RunOutcome};

/// Outcome of one interval, with the context needed to audit it later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalReport {
    pub interval: Interval,
    pub artifact: PathBuf,
    pub outcome: RunOutcome,
    /// Time the tool ran for; `None` when nothing was launched.
    pub elapsed: Option<Duration>,
    pub exit_code: Option<i32>,
    pub termination_warnings: Vec<String>,
}

impl IntervalReport {
    pub fn not_launched(interval: Interval, artifact: PathBuf, outcome: RunOutcome) -> Self {
        Self {
            interval,
            artifact,
            outcome,
            elapsed: None,
            exit_code: None,
            termination_warnings: Vec::new(),
        }
    }
}

/// Per-interval reports in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub reports: Vec<IntervalReport>,
    /// The user interrupted the batch; later intervals were not scheduled.
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn outcomes(&self) -> Vec<RunOutcome> {
        self.reports.iter().map(|r| r.outcome.clone()).collect()
    }

    /// Number of subprocess launches performed.
    pub fn launched(&self) -> usize {
        self.count(RunOutcome::launched)
    }

    pub fn succeeded(&self) -> usize {
        self.count(RunOutcome::is_success)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| *o == RunOutcome::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(RunOutcome::is_failure)
    }

    fn count(&self, pred: impl Fn(&RunOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }

    /// Write the summary to the log, one line per interval.
    pub fn log(&self) {
        for report in &self.reports {
            let name = report
                .artifact
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if report.outcome.is_failure() {
                warn!(artifact = %name, "{}: {}", report.interval, report.outcome);
            } else {
                info!(artifact = %name, "{}: {}", report.interval, report.outcome);
            }
        }

        info!(
            total = self.reports.len(),
            launched = self.launched(),
            succeeded = self.succeeded(),
            skipped = self.skipped(),
            failed = self.failed(),
            cancelled = self.cancelled,
            "batch summary"
        );
    }
}

use std::fmt;

/// A frame number on the source project's timeline.
pub type Frame = i64;

/// Index carried by the synthetic interval that spans every marker.
pub const FULL_RANGE_INDEX: i32 = -1;

/// A contiguous frame range exported as one artifact.
///
/// `index` is the 1-based ordinal of a bounded slice, or
/// [`FULL_RANGE_INDEX`] for the full-range slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub start: Frame,
    pub end: Frame,
    pub index: i32,
}

impl Interval {
    pub fn bounded(start: Frame, end: Frame, index: i32) -> Self {
        Self { start, end, index }
    }

    pub fn full_range(start: Frame, end: Frame) -> Self {
        Self {
            start,
            end,
            index: FULL_RANGE_INDEX,
        }
    }

    pub fn is_full_range(&self) -> bool {
        self.index == FULL_RANGE_INDEX
    }

    /// Number of frames covered, both ends inclusive.
    pub fn frame_count(&self) -> Frame {
        self.end - self.start + 1
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_full_range() {
            write!(f, "FULL interval (frames {}-{})", self.start, self.end)
        } else {
            write!(
                f,
                "interval {} (frames {}-{})",
                self.index, self.start, self.end
            )
        }
    }
}

/// Result of processing one planned interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Artifact already present and resume is enabled; nothing was launched.
    Skipped,
    /// The tool exited with code 0 and the artifact exists.
    Succeeded,
    /// The tool exited on its own with a non-zero code.
    FailedExitCode(i32),
    /// The tool reported success but left no artifact behind.
    FailedNoArtifact,
    /// The tool outlived the timeout budget and was terminated.
    TimedOut,
    /// The tool could not be started at all.
    LaunchFailed(String),
    /// The user interrupted the batch while this interval was in flight.
    Cancelled,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            RunOutcome::Skipped | RunOutcome::Succeeded | RunOutcome::Cancelled
        )
    }

    /// Whether a subprocess was spawned for this outcome.
    pub fn launched(&self) -> bool {
        !matches!(self, RunOutcome::Skipped | RunOutcome::LaunchFailed(_))
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Skipped => write!(f, "skipped (artifact already exists)"),
            RunOutcome::Succeeded => write!(f, "succeeded"),
            RunOutcome::FailedExitCode(code) => write!(f, "failed with exit code {code}"),
            RunOutcome::FailedNoArtifact => write!(f, "failed (no artifact written)"),
            RunOutcome::TimedOut => write!(f, "timed out"),
            RunOutcome::LaunchFailed(reason) => write!(f, "launch failed: {reason}"),
            RunOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

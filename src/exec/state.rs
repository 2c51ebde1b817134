// src/exec/state.rs

//! Pure supervision state machine.
//!
//! ```text
//! NotStarted -> Running -> CompletedOk
//!                       -> CompletedWithError(code)
//!                       -> TimedOutTerminating -> (exits during grace)
//!                                              -> Killed
//! ```
//!
//! The async shell feeds [`Observation`]s in and performs the returned
//! [`Action`]. Timeout and user cancellation share the same escalation path.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    NotStarted,
    Running,
    CompletedOk,
    CompletedWithError(i32),
    /// Graceful stop requested. Terminal if the process exits within the
    /// grace period.
    TimedOutTerminating,
    Killed,
}

impl SupervisorState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SupervisorState::NotStarted | SupervisorState::Running)
    }

    /// Whether the process had to be stopped by the supervisor.
    pub fn was_terminated(&self) -> bool {
        matches!(
            self,
            SupervisorState::TimedOutTerminating | SupervisorState::Killed
        )
    }
}

/// What the shell saw on its last look at the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Spawned,
    Exited(i32),
    Alive { elapsed: Duration },
    CancelRequested,
}

/// What the shell must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Sleep one poll interval (or until cancelled) and observe again.
    Wait,
    /// Ask the process to stop, sleep the grace period, observe again.
    Terminate,
    /// Kill the process forcefully; supervision is over.
    Kill,
    /// Supervision is over.
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: SupervisorState,
    pub action: Action,
}

impl Transition {
    fn to(next: SupervisorState, action: Action) -> Self {
        Self { next, action }
    }
}

/// Advance the state machine by one observation.
pub fn transition(state: SupervisorState, obs: Observation, timeout: Duration) -> Transition {
    use Observation::*;
    use SupervisorState::*;

    match (state, obs) {
        (NotStarted, Spawned) => Transition::to(Running, Action::Wait),
        (NotStarted, _) => Transition::to(NotStarted, Action::Finish),

        (Running, Exited(0)) => Transition::to(CompletedOk, Action::Finish),
        (Running, Exited(code)) => Transition::to(CompletedWithError(code), Action::Finish),
        (Running, Alive { elapsed }) if elapsed > timeout => {
            Transition::to(TimedOutTerminating, Action::Terminate)
        }
        (Running, Alive { .. }) | (Running, Spawned) => Transition::to(Running, Action::Wait),
        (Running, CancelRequested) => Transition::to(TimedOutTerminating, Action::Terminate),

        // Once the stop request is out, escalation runs to completion.
        (TimedOutTerminating, Exited(_)) => Transition::to(TimedOutTerminating, Action::Finish),
        (TimedOutTerminating, _) => Transition::to(Killed, Action::Kill),

        (terminal, _) => Transition::to(terminal, Action::Finish),
    }
}

// src/exec/mod.rs

//! Process execution layer.
//!
//! This module launches the external tool and watches it until it reaches a
//! terminal state.
//!
//! - [`state`] is the pure supervision state machine (no processes, no
//!   timers) and is the single source of truth for escalation rules.
//! - [`supervisor`] is the async shell that drives a real or fake process
//!   through that state machine.
//! - [`backend`] provides the `Launcher` / `ProcessHandle` traits and the
//!   concrete `RealLauncher` used in production; tests swap in a fake.
//! - [`cancel`] carries the user-interrupt flag into the poll loop.

pub mod backend;
pub mod cancel;
pub mod state;
pub mod supervisor;

pub use backend::{Invocation, Launcher, ProcessHandle, RealLauncher};
pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use state::{transition, Action, Observation, SupervisorState, Transition};
pub use supervisor::{ProcessSupervisor, SupervisionReport};

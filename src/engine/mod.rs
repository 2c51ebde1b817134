// src/engine/mod.rs

//! Batch engine.
//!
//! - [`batch`] turns the control file and sidecar into an immutable
//!   [`Batch`]; every configuration error surfaces here, before any launch.
//! - [`orchestrator`] walks the planned intervals one at a time.
//! - [`summary`] aggregates per-interval outcomes.

pub mod batch;
pub mod orchestrator;
pub mod summary;

pub use batch::{prepare_batch, Batch};
pub use orchestrator::{classify_outcome, Orchestrator};
pub use summary::{BatchSummary, IntervalReport};

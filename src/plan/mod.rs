// src/plan/mod.rs

//! Batch planning: turning the sidecar marker file into the ordered list of
//! intervals the orchestrator walks through.
//!
//! - [`markers`] reads and validates frame markers.
//! - [`segments`] derives intervals from them.

pub mod markers;
pub mod segments;

pub use markers::{parse_markers, read_markers, sidecar_path_for};
pub use segments::plan_intervals;

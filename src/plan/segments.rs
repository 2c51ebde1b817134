// src/plan/segments.rs

use crate::errors::Result;
use crate::plan::markers::validate_markers;
use crate::types::{Frame, Interval};

/// Convert markers into the export plan.
///
/// Every adjacent pair `(m[i], m[i+1])` yields the bounded interval
/// `m[i]..=m[i+1]-1` with index `i + 1`, so no bounded interval contains the
/// next marker's frame. One full-range interval `m[0]..=m[last]-1` is
/// appended last. Resumed batches rely on this order being stable.
pub fn plan_intervals(markers: &[Frame]) -> Result<Vec<Interval>> {
    validate_markers(markers)?;

    let mut intervals: Vec<Interval> = markers
        .windows(2)
        .zip(1..)
        .map(|(pair, index)| Interval::bounded(pair[0], pair[1] - 1, index))
        .collect();

    let first = markers[0];
    let last = markers[markers.len() - 1];
    intervals.push(Interval::full_range(first, last - 1));

    Ok(intervals)
}

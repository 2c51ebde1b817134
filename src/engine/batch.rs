// src/engine/batch.rs

use std::path::{Path, PathBuf};

use tracing::info;

use crate::control::{BatchSeed, ControlChannel};
use crate::errors::{ExportError, Result};
use crate::fs::FileSystem;
use crate::plan::{plan_intervals, read_markers, sidecar_path_for};
use crate::types::{Frame, Interval};

/// Everything computed once per run. Immutable after [`prepare_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub control_file: PathBuf,
    pub seed: BatchSeed,
    pub sidecar: PathBuf,
    pub markers: Vec<Frame>,
    pub intervals: Vec<Interval>,
}

/// Load the batch seed from the control file, check the source project,
/// read the sidecar and plan the intervals.
pub fn prepare_batch<F>(fs: &F, control_file: &Path) -> Result<Batch>
where
    F: FileSystem + ?Sized,
{
    let channel = ControlChannel::new(control_file);
    let seed = channel.read_seed(fs)?;
    info!(source = %seed.source_path.display(), "processing source project");
    info!(output_dir = %seed.output_dir.display(), "export directory");

    if !fs.is_file(&seed.source_path) {
        return Err(ExportError::MissingInputFile(seed.source_path.clone()));
    }

    let sidecar = sidecar_path_for(&seed.source_path);
    let markers = read_markers(fs, &sidecar)?;
    info!(?markers, "found frame markers");

    let intervals = plan_intervals(&markers)?;
    info!(count = intervals.len(), "created intervals to export");

    Ok(Batch {
        control_file: control_file.to_path_buf(),
        seed,
        sidecar,
        markers,
        intervals,
    })
}

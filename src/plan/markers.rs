// src/plan/markers.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{ExportError, Result};
use crate::fs::FileSystem;
use crate::types::Frame;

/// Extension of the marker file that sits next to the source project.
pub const SIDECAR_EXTENSION: &str = "txt";

/// Path of the marker sidecar for a source project: same directory, same
/// base name, `.txt` extension.
pub fn sidecar_path_for(source: &Path) -> PathBuf {
    source.with_extension(SIDECAR_EXTENSION)
}

/// Extract markers from sidecar text.
///
/// A line contributes a marker when its first whitespace-delimited token is
/// made of ASCII digits only. Everything else on the line, and every other
/// line, is ignored. Tokens that overflow [`Frame`] are ignored as well.
pub fn parse_markers(text: &str) -> Vec<Frame> {
    text.lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|token| token.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|token| token.parse::<Frame>().ok())
        .collect()
}

/// Read, parse and validate the sidecar at `path`.
pub fn read_markers<F>(fs: &F, path: &Path) -> Result<Vec<Frame>>
where
    F: FileSystem + ?Sized,
{
    if !fs.is_file(path) {
        return Err(ExportError::MissingInputFile(path.to_path_buf()));
    }

    let text = fs.read_to_string(path)?;
    let markers = parse_markers(&text);
    debug!(path = %path.display(), count = markers.len(), "parsed sidecar markers");

    validate_markers(&markers)?;
    Ok(markers)
}

/// Markers must number at least two and be strictly ascending.
pub fn validate_markers(markers: &[Frame]) -> Result<()> {
    if markers.len() < 2 {
        return Err(ExportError::InsufficientMarkers {
            found: markers.len(),
        });
    }

    for pair in markers.windows(2) {
        let (previous, next) = (pair[0], pair[1]);
        if previous == next {
            return Err(ExportError::DuplicateMarker(next));
        }
        if previous > next {
            return Err(ExportError::MarkersNotAscending { previous, next });
        }
    }

    Ok(())
}

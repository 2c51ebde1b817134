// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Everything in here is a configuration-time failure: it aborts the batch
//! before any subprocess is spawned. Per-interval problems are not errors;
//! they are recorded as [`crate::types::RunOutcome`]s.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Frame;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Missing input file: {}", .0.display())]
    MissingInputFile(PathBuf),

    #[error("Insufficient markers: found {found}, at least 2 are required")]
    InsufficientMarkers { found: usize },

    #[error("Duplicate marker: frame {0} appears more than once")]
    DuplicateMarker(Frame),

    #[error("Markers not ascending: {previous} is followed by {next}")]
    MarkersNotAscending { previous: Frame, next: Frame },

    #[error("Malformed control file {}: {reason}", path.display())]
    MalformedControlFile { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

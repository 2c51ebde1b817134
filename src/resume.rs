// src/resume.rs

//! Artifact naming and the skip-if-present decision.
//!
//! Only existence is checked. An artifact older than its source project is
//! still considered done.

use std::path::{Path, PathBuf};

use crate::fs::FileSystem;
use crate::types::Interval;

/// Extension of every exported artifact.
pub const ARTIFACT_EXTENSION: &str = "fbx";

/// `{base}_FULL.fbx` for the full range, `{base}_{index:02}.fbx` otherwise.
pub fn artifact_name(base_name: &str, interval: &Interval) -> String {
    if interval.is_full_range() {
        format!("{base_name}_FULL.{ARTIFACT_EXTENSION}")
    } else {
        format!("{base_name}_{:02}.{ARTIFACT_EXTENSION}", interval.index)
    }
}

/// Base name of a source project: its file name without the extension.
pub fn source_base_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct ResumePolicy {
    enabled: bool,
    base_name: String,
    output_dir: PathBuf,
}

impl ResumePolicy {
    pub fn new(source: &Path, output_dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            enabled,
            base_name: source_base_name(source),
            output_dir: output_dir.into(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn artifact_name(&self, interval: &Interval) -> String {
        artifact_name(&self.base_name, interval)
    }

    pub fn artifact_path(&self, interval: &Interval) -> PathBuf {
        self.output_dir.join(self.artifact_name(interval))
    }

    pub fn artifact_exists<F>(&self, fs: &F, interval: &Interval) -> bool
    where
        F: FileSystem + ?Sized,
    {
        fs.exists(&self.artifact_path(interval))
    }

    /// True when resume is on and the interval's artifact is already there.
    pub fn should_skip<F>(&self, fs: &F, interval: &Interval) -> bool
    where
        F: FileSystem + ?Sized,
    {
        self.enabled && self.artifact_exists(fs, interval)
    }
}

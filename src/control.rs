// src/control.rs

//! The control file: the only channel into the external tool.
//!
//! Layout, one field per line:
//!
//! ```text
//! <source project path>
//! <output directory>
//! <start frame>
//! <end frame>
//! <interval index, -1 for the full range>
//! ```
//!
//! The same file seeds the batch: before any launch only its first two lines
//! are meaningful and they name the project and the output directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{ExportError, Result};
use crate::fs::FileSystem;
use crate::types::{Frame, Interval};

/// One interval's worth of parameters for the in-host export script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRecord {
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    pub start: Frame,
    pub end: Frame,
    pub index: i32,
}

impl ControlRecord {
    pub fn for_interval(seed: &BatchSeed, interval: &Interval) -> Self {
        Self {
            source_path: seed.source_path.clone(),
            output_dir: seed.output_dir.clone(),
            start: interval.start,
            end: interval.end,
            index: interval.index,
        }
    }

    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start,
            end: self.end,
            index: self.index,
        }
    }

    pub fn render(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n",
            self.source_path.display(),
            self.output_dir.display(),
            self.start,
            self.end,
            self.index
        )
    }

    /// Parse the full five-line layout. `path` is only used for errors.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let seed = BatchSeed::parse(text, path)?;
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        if lines.len() < 5 {
            return Err(malformed(
                path,
                format!("expected 5 lines, found {}", lines.len()),
            ));
        }

        Ok(Self {
            source_path: seed.source_path,
            output_dir: seed.output_dir,
            start: parse_field(lines[2], "start frame", path)?,
            end: parse_field(lines[3], "end frame", path)?,
            index: parse_field(lines[4], "interval index", path)?,
        })
    }
}

/// The fixed part of a batch: which project to export and where to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSeed {
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
}

impl BatchSeed {
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut lines = text.lines().map(str::trim);
        let source = lines.next().unwrap_or_default();
        let output = lines.next();

        let Some(output) = output else {
            return Err(malformed(
                path,
                "must contain at least 2 lines (source path and output directory)",
            ));
        };
        if source.is_empty() {
            return Err(malformed(path, "source path (line 1) is empty"));
        }
        if output.is_empty() {
            return Err(malformed(path, "output directory (line 2) is empty"));
        }

        Ok(Self {
            source_path: PathBuf::from(source),
            output_dir: PathBuf::from(output),
        })
    }
}

/// Reader/writer for the control file at a fixed path.
#[derive(Debug, Clone)]
pub struct ControlChannel {
    path: PathBuf,
}

impl ControlChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the record is staged in before it replaces the real one.
    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "control".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    /// Replace the whole control file with `record`.
    ///
    /// The record is written to a staging file first and renamed over the
    /// control file, so a reader never sees a partial record.
    pub fn write<F>(&self, fs: &F, record: &ControlRecord) -> Result<()>
    where
        F: FileSystem + ?Sized,
    {
        let staging = self.staging_path();
        fs.write(&staging, record.render().as_bytes())?;
        fs.rename(&staging, &self.path)?;
        debug!(
            path = %self.path.display(),
            start = record.start,
            end = record.end,
            index = record.index,
            "control record written"
        );
        Ok(())
    }

    pub fn read<F>(&self, fs: &F) -> Result<ControlRecord>
    where
        F: FileSystem + ?Sized,
    {
        let text = self.read_text(fs)?;
        ControlRecord::parse(&text, &self.path)
    }

    pub fn read_seed<F>(&self, fs: &F) -> Result<BatchSeed>
    where
        F: FileSystem + ?Sized,
    {
        let text = self.read_text(fs)?;
        BatchSeed::parse(&text, &self.path)
    }

    fn read_text<F>(&self, fs: &F) -> Result<String>
    where
        F: FileSystem + ?Sized,
    {
        if !fs.is_file(&self.path) {
            return Err(ExportError::MissingInputFile(self.path.clone()));
        }
        Ok(fs.read_to_string(&self.path)?)
    }
}

fn parse_field<T: std::str::FromStr>(value: &str, what: &str, path: &Path) -> Result<T> {
    value
        .parse()
        .map_err(|_| malformed(path, format!("{what} is not an integer: {value:?}")))
}

fn malformed(path: &Path, reason: impl Into<String>) -> ExportError {
    ExportError::MalformedControlFile {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::config::model::{RawSettings, Settings};
use crate::errors::Result;

/// File name looked up next to the control file when `--settings` is absent.
pub const DEFAULT_SETTINGS_FILE: &str = "segexport.toml";

/// Load a settings file and return the raw `RawSettings`.
///
/// This only performs TOML deserialization; use [`load_settings`] for the
/// validated form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawSettings = toml::from_str(&contents)?;

    Ok(raw)
}

/// Load and validate settings.
///
/// A missing file is not an error: every key has a default, so the built-in
/// defaults are returned instead.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let raw = if path.is_file() {
        debug!(path = %path.display(), "loading settings file");
        load_from_path(path)?
    } else {
        debug!(path = %path.display(), "no settings file; using defaults");
        RawSettings::default()
    };
    Settings::try_from(raw)
}

/// `segexport.toml` in the directory holding the control file.
pub fn default_settings_path(control_file: &Path) -> PathBuf {
    match control_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(DEFAULT_SETTINGS_FILE),
        _ => PathBuf::from(DEFAULT_SETTINGS_FILE),
    }
}

/// Parse a simple duration string like `"500ms"`, `"2s"`, `"1m"`, `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

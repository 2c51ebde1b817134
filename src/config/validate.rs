// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::config::loader::parse_duration;
use crate::config::model::{RawSettings, Settings, SupervisionSettings, ToolSettings};
use crate::errors::{ExportError, Result};

impl TryFrom<RawSettings> for Settings {
    type Error = ExportError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        let tool = validate_tool(&raw)?;
        let supervision = validate_supervision(&raw)?;
        Ok(Settings {
            tool,
            supervision,
            resume: raw.batch.resume,
        })
    }
}

fn validate_tool(raw: &RawSettings) -> Result<ToolSettings> {
    let tool = &raw.tool;
    if tool.path.trim().is_empty() {
        return Err(ExportError::ConfigError(
            "[tool].path must not be empty".to_string(),
        ));
    }
    if tool.run_script_flag.trim().is_empty() {
        return Err(ExportError::ConfigError(
            "[tool].run_script_flag must not be empty".to_string(),
        ));
    }
    if tool.script_id.trim().is_empty() {
        return Err(ExportError::ConfigError(
            "[tool].script_id must not be empty".to_string(),
        ));
    }

    Ok(ToolSettings {
        path: PathBuf::from(tool.path.trim()),
        run_script_flag: tool.run_script_flag.trim().to_string(),
        script_id: tool.script_id.trim().to_string(),
    })
}

fn validate_supervision(raw: &RawSettings) -> Result<SupervisionSettings> {
    let section = &raw.supervision;
    Ok(SupervisionSettings {
        timeout: non_zero_duration("timeout", &section.timeout)?,
        poll_interval: non_zero_duration("poll_interval", &section.poll_interval)?,
        grace_period: non_zero_duration("grace_period", &section.grace_period)?,
        settle_delay: duration("settle_delay", &section.settle_delay)?,
    })
}

fn duration(key: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| ExportError::ConfigError(format!("[supervision].{key}: {e}")))
}

/// A zero poll interval would spin and a zero timeout or grace period would
/// kill every launch immediately.
fn non_zero_duration(key: &str, value: &str) -> Result<Duration> {
    let parsed = duration(key, value)?;
    if parsed.is_zero() {
        return Err(ExportError::ConfigError(format!(
            "[supervision].{key} must be greater than zero (got {value:?})"
        )));
    }
    Ok(parsed)
}

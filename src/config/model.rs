// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Default installation path of the authoring tool.
pub const DEFAULT_TOOL_PATH: &str = "C:\\Program Files\\Cascadeur\\cascadeur.exe";

/// Flag that makes the tool execute an embedded script and nothing else.
pub const DEFAULT_RUN_SCRIPT_FLAG: &str = "--run-script";

/// Identifier of the in-host export script.
pub const DEFAULT_SCRIPT_ID: &str = "commands.BatchExportFBXsegments";

/// Settings file as read from TOML.
///
/// ```toml
/// [tool]
/// path = "C:\\Program Files\\Cascadeur\\cascadeur.exe"
/// run_script_flag = "--run-script"
/// script_id = "commands.BatchExportFBXsegments"
///
/// [supervision]
/// timeout = "120s"
/// poll_interval = "1s"
/// grace_period = "2s"
/// settle_delay = "2s"
///
/// [batch]
/// resume = true
/// ```
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSettings {
    #[serde(default)]
    pub tool: ToolSection,

    #[serde(default)]
    pub supervision: SupervisionSection,

    #[serde(default)]
    pub batch: BatchSection,
}

/// `[tool]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSection {
    #[serde(default = "default_tool_path")]
    pub path: String,

    #[serde(default = "default_run_script_flag")]
    pub run_script_flag: String,

    #[serde(default = "default_script_id")]
    pub script_id: String,
}

fn default_tool_path() -> String {
    DEFAULT_TOOL_PATH.to_string()
}

fn default_run_script_flag() -> String {
    DEFAULT_RUN_SCRIPT_FLAG.to_string()
}

fn default_script_id() -> String {
    DEFAULT_SCRIPT_ID.to_string()
}

impl Default for ToolSection {
    fn default() -> Self {
        Self {
            path: default_tool_path(),
            run_script_flag: default_run_script_flag(),
            script_id: default_script_id(),
        }
    }
}

/// `[supervision]` section. Durations are strings such as `"120s"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisionSection {
    /// Wall-clock budget for one launch before escalation starts.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// How often liveness is checked while the tool runs.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Wait between the graceful stop request and the forced kill.
    #[serde(default = "default_grace_period")]
    pub grace_period: String,

    /// Pause after every launch before the next interval starts.
    #[serde(default = "default_settle_delay")]
    pub settle_delay: String,
}

fn default_timeout() -> String {
    "120s".to_string()
}

fn default_poll_interval() -> String {
    "1s".to_string()
}

fn default_grace_period() -> String {
    "2s".to_string()
}

fn default_settle_delay() -> String {
    "2s".to_string()
}

impl Default for SupervisionSection {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            grace_period: default_grace_period(),
            settle_delay: default_settle_delay(),
        }
    }
}

/// `[batch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchSection {
    /// Skip intervals whose artifact already exists.
    #[serde(default = "default_resume")]
    pub resume: bool,
}

fn default_resume() -> bool {
    true
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            resume: default_resume(),
        }
    }
}

/// Validated settings used by the rest of the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tool: ToolSettings,
    pub supervision: SupervisionSettings,
    pub resume: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    pub path: PathBuf,
    pub run_script_flag: String,
    pub script_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisionSettings {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub grace_period: Duration,
    pub settle_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tool: ToolSettings {
                path: PathBuf::from(DEFAULT_TOOL_PATH),
                run_script_flag: DEFAULT_RUN_SCRIPT_FLAG.to_string(),
                script_id: DEFAULT_SCRIPT_ID.to_string(),
            },
            supervision: SupervisionSettings::default(),
            resume: true,
        }
    }
}

impl Default for SupervisionSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
            grace_period: Duration::from_secs(2),
            settle_delay: Duration::from_secs(2),
        }
    }
}

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use segexport::config::Settings;
use segexport::fs::mock::MockFileSystem;

/// Builder for `Settings` to simplify test setup.
///
/// Starts from the production defaults but with a zero settle delay, which
/// only slows tests down.
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        let mut settings = Settings::default();
        settings.supervision.settle_delay = Duration::ZERO;
        Self { settings }
    }

    pub fn tool_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.tool.path = path.into();
        self
    }

    pub fn timeout(mut self, d: Duration) -> Self {
        self.settings.supervision.timeout = d;
        self
    }

    pub fn poll_interval(mut self, d: Duration) -> Self {
        self.settings.supervision.poll_interval = d;
        self
    }

    pub fn grace_period(mut self, d: Duration) -> Self {
        self.settings.supervision.grace_period = d;
        self
    }

    pub fn settle_delay(mut self, d: Duration) -> Self {
        self.settings.supervision.settle_delay = d;
        self
    }

    pub fn resume(mut self, val: bool) -> Self {
        self.settings.resume = val;
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lays out a project in a `MockFileSystem`: control file seed, source
/// project and marker sidecar.
pub struct ProjectBuilder {
    dir: PathBuf,
    source_name: String,
    output_dir: PathBuf,
    sidecar: Option<String>,
    with_source: bool,
}

impl ProjectBuilder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            output_dir: dir.join("out"),
            dir,
            source_name: "shot.casc".to_string(),
            sidecar: None,
            with_source: true,
        }
    }

    pub fn source_name(mut self, name: &str) -> Self {
        self.source_name = name.to_string();
        self
    }

    pub fn markers(mut self, markers: &[i64]) -> Self {
        let text: String = markers.iter().map(|m| format!("{m}\n")).collect();
        self.sidecar = Some(text);
        self
    }

    pub fn sidecar_text(mut self, text: &str) -> Self {
        self.sidecar = Some(text.to_string());
        self
    }

    pub fn without_source(mut self) -> Self {
        self.with_source = false;
        self
    }

    pub fn control_path(&self) -> PathBuf {
        self.dir.join("export_config.txt")
    }

    pub fn source_path(&self) -> PathBuf {
        self.dir.join(&self.source_name)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write everything into `fs` and return the control file path.
    pub fn write_to(&self, fs: &MockFileSystem) -> PathBuf {
        let source = self.source_path();
        fs.add_file(
            self.control_path(),
            format!("{}\n{}\n", source.display(), self.output_dir.display()),
        );
        if self.with_source {
            fs.add_file(&source, b"casc".to_vec());
        }
        if let Some(text) = &self.sidecar {
            fs.add_file(source.with_extension("txt"), text.clone());
        }
        self.control_path()
    }
}

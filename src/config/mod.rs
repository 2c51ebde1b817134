// src/config/mod.rs

//! Settings loading and validation for segexport.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an optional settings file from disk (`loader.rs`).
//! - Validate it into typed [`Settings`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_settings_path, load_from_path, load_settings, parse_duration};
pub use model::{
    BatchSection, RawSettings, Settings, SupervisionSection, SupervisionSettings, ToolSection,
    ToolSettings,
};

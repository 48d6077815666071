//! Shared configuration loader for mdpad.
//!
//! `defaults/mdpad.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`MdpadConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use mdpad_core::export::paginate::Pagination;
use mdpad_core::export::ExportSettings;
use mdpad_core::render::RenderOptions;
use mdpad_core::session::SessionSettings;
use mdpad_core::zoom::ZoomBounds;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../defaults/mdpad.default.toml");

/// Top-level configuration consumed by mdpad applications.
#[derive(Debug, Clone, Deserialize)]
pub struct MdpadConfig {
    pub storage: StorageConfig,
    pub zoom: ZoomConfig,
    pub render: RenderConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoomConfig {
    pub min: i32,
    pub max: i32,
    pub step: i32,
    pub default: i32,
    pub shared: bool,
}

impl From<&ZoomConfig> for ZoomBounds {
    fn from(config: &ZoomConfig) -> Self {
        ZoomBounds::new(config.min, config.max, config.step, config.default)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub gfm: bool,
    pub math: bool,
}

impl From<&RenderConfig> for RenderOptions {
    fn from(config: &RenderConfig) -> Self {
        RenderOptions {
            gfm: config.gfm,
            math: config.math,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub margin_mm: f64,
    pub scale: u32,
    pub pagination: Pagination,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub chrome_binary: Option<PathBuf>,
}

impl From<&ExportConfig> for ExportSettings {
    fn from(config: &ExportConfig) -> Self {
        ExportSettings {
            margin_mm: config.margin_mm,
            scale: config.scale,
            pagination: config.pagination,
        }
    }
}

impl From<&MdpadConfig> for SessionSettings {
    fn from(config: &MdpadConfig) -> Self {
        SessionSettings {
            zoom: (&config.zoom).into(),
            shared_zoom: config.zoom.shared,
            render: (&config.render).into(),
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<MdpadConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<MdpadConfig, ConfigError> {
    Loader::new().build()
}

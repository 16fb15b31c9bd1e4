//! Configuration for the PrintKit editor
//!
//! Supports JSON and TOML files stored in platform-specific directories.
//!
//! Configuration is organized into sections:
//! - Editor behaviour (grid, snapping, zoom limits, history depth)
//! - Validation thresholds (DPI, visibility fractions)
//! - Autosave debounce
//! - Export defaults
//! - Local storage location
//! - Template loading mode

use crate::error::{ConfigError, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How product templates reach the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Built-in demo templates
    #[default]
    Demo,
    /// A single template handed over by the embedding host
    Embedded,
    /// Templates fetched from an API endpoint
    Standalone,
}

impl std::fmt::Display for EditorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Demo => write!(f, "demo"),
            Self::Embedded => write!(f, "embedded"),
            Self::Standalone => write!(f, "standalone"),
        }
    }
}

/// Raster export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless PNG with alpha
    #[default]
    Png,
    /// JPEG flattened onto white
    Jpeg,
}

impl ExportFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// MIME type used for data URLs
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpeg"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Canvas editing preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Grid spacing in view pixels
    pub grid_size: f64,
    /// Draw grid lines over the printable area
    pub show_grid: bool,
    /// Snap dragged layers to the grid
    pub snap_to_grid: bool,
    /// Draw the dashed printable-area outline
    pub show_printable_area: bool,
    /// Canvas color shown while the mockup loads
    pub canvas_background: String,
    /// Canvas color used when the mockup fails to load
    pub fallback_background: String,
    /// Lower zoom bound
    pub min_zoom: f64,
    /// Upper zoom bound
    pub max_zoom: f64,
    /// Undo depth
    pub history_capacity: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            show_grid: false,
            snap_to_grid: false,
            show_printable_area: true,
            canvas_background: "#f0f0f0".to_string(),
            fallback_background: "#ffffff".to_string(),
            min_zoom: 0.1,
            max_zoom: 5.0,
            history_capacity: 50,
        }
    }
}

impl EditorSettings {
    /// Clamp a zoom factor into the configured bounds
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

/// Print-quality thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Effective DPI at or above which an image is rated good
    pub good_dpi: f64,
    /// Overlap ratio below which a layer is mostly outside
    pub mostly_outside_ratio: f64,
    /// Fraction of a dragged object that must stay inside per axis
    pub min_visible_fraction: f64,
    /// Skip locked layers when scoring
    pub skip_locked_layers: bool,
    /// Minimum DPI assumed when a template omits one
    pub default_min_dpi: f64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            good_dpi: 300.0,
            mostly_outside_ratio: 0.1,
            min_visible_fraction: 0.2,
            skip_locked_layers: true,
            default_min_dpi: 150.0,
        }
    }
}

/// Debounced autosave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveSettings {
    /// Save automatically after edits
    pub enabled: bool,
    /// Quiet period before a write, in milliseconds
    pub delay_ms: u64,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 1000,
        }
    }
}

/// Export defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Output format
    pub format: ExportFormat,
    /// Pixel multiplier applied to the printable area
    pub multiplier: f64,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            multiplier: 2.0,
            jpeg_quality: 92,
        }
    }
}

/// Local design storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding saved designs
    pub directory: PathBuf,
    /// Prefix for design keys
    pub key_prefix: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            directory: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("printkit")
                .join("designs"),
            key_prefix: "printkit_design_".to_string(),
        }
    }
}

/// Template loading
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Loader mode
    pub mode: EditorMode,
    /// Template list location for standalone mode (path or URL)
    pub api_endpoint: Option<String>,
    /// Template id selected on startup
    pub initial_template: Option<String>,
}

/// Complete editor configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Canvas editing preferences
    pub editor: EditorSettings,
    /// Print-quality thresholds
    pub validation: ValidationSettings,
    /// Autosave behaviour
    pub autosave: AutosaveSettings,
    /// Export defaults
    pub export: ExportSettings,
    /// Local storage
    pub storage: StorageSettings,
    /// Template loading
    pub templates: TemplateSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform config file location (`<config dir>/printkit/config.toml`)
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("printkit").join("config.toml"))
            .ok_or_else(|| {
                ConfigError::DirectoryUnavailable("no platform config directory".to_string())
                    .into()
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match Self::format_of(path)? {
            FileFormat::Json => serde_json::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load config from file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Self::format_of(path)? {
            FileFormat::Json => serde_json::to_string_pretty(self)?,
            FileFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn out_of_range(key: &str, value: impl ToString) -> ConfigError {
            ConfigError::ValueOutOfRange {
                key: key.to_string(),
                value: value.to_string(),
            }
        }

        let editor = &self.editor;
        if !(editor.grid_size > 0.0) {
            return Err(out_of_range("editor.grid_size", editor.grid_size));
        }
        if !(editor.min_zoom > 0.0) || editor.min_zoom > editor.max_zoom {
            return Err(out_of_range("editor.min_zoom", editor.min_zoom));
        }
        if editor.history_capacity == 0 {
            return Err(out_of_range("editor.history_capacity", 0));
        }

        let validation = &self.validation;
        if !(validation.good_dpi > 0.0) {
            return Err(out_of_range("validation.good_dpi", validation.good_dpi));
        }
        if !(0.0..=1.0).contains(&validation.mostly_outside_ratio) {
            return Err(out_of_range(
                "validation.mostly_outside_ratio",
                validation.mostly_outside_ratio,
            ));
        }
        if !(0.0..=1.0).contains(&validation.min_visible_fraction) {
            return Err(out_of_range(
                "validation.min_visible_fraction",
                validation.min_visible_fraction,
            ));
        }
        if !(validation.default_min_dpi > 0.0) {
            return Err(out_of_range(
                "validation.default_min_dpi",
                validation.default_min_dpi,
            ));
        }

        if !(self.export.multiplier > 0.0) {
            return Err(out_of_range("export.multiplier", self.export.multiplier));
        }
        if !(1..=100).contains(&self.export.jpeg_quality) {
            return Err(out_of_range("export.jpeg_quality", self.export.jpeg_quality));
        }

        if self.storage.key_prefix.is_empty() {
            return Err(out_of_range("storage.key_prefix", "\"\""));
        }

        Ok(())
    }

    fn format_of(path: &Path) -> Result<FileFormat, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(FileFormat::Json),
            Some("toml") => Ok(FileFormat::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}

enum FileFormat {
    Json,
    Toml,
}

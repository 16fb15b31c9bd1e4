//! PrintKit Settings Crate
//!
//! Editor configuration (grid, validation thresholds, autosave, export,
//! storage and template loading) and the key-value backends used for local
//! design persistence.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{
    AutosaveSettings, Config, EditorMode, EditorSettings, ExportFormat, ExportSettings,
    StorageSettings, TemplateSettings, ValidationSettings,
};
pub use error::{
    ConfigError, ConfigResult, PersistenceError, PersistenceResult, SettingsError, SettingsResult,
};
pub use persistence::{FileStore, KeyValueStore, MemoryStore};

//! Error types for the settings crate.
//!
//! Structured error types for configuration management and local
//! persistence backends.

use std::io;
use thiserror::Error;

/// Errors that can occur during settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The configuration file could not be loaded.
    #[error("Failed to load settings: {0}")]
    LoadError(String),

    /// The configuration file could not be saved.
    #[error("Failed to save settings: {0}")]
    SaveError(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// A configuration validation error occurred.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A persistence error occurred.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Errors related to configuration validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The configuration file format is not supported.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A configuration value is out of valid range.
    #[error("Value out of range for '{key}': {value}")]
    ValueOutOfRange { key: String, value: String },

    /// The configuration directory could not be resolved.
    #[error("Config directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

/// Errors related to key-value persistence.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The key contains characters the backend cannot store.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Writing the value would exceed the backend's quota.
    #[error("Storage quota exceeded: {requested} bytes requested, {quota} allowed")]
    QuotaExceeded { requested: usize, quota: usize },

    /// The backend cannot be used at all.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// I/O error during persistence.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::UnsupportedFormat("yaml".to_string());
        assert_eq!(err.to_string(), "Unsupported config format: yaml");

        let err = ConfigError::ValueOutOfRange {
            key: "editor.grid_size".to_string(),
            value: "0".to_string(),
        };
        assert_eq!(err.to_string(), "Value out of range for 'editor.grid_size': 0");
    }

    #[test]
    fn test_persistence_error_display() {
        let err = PersistenceError::QuotaExceeded {
            requested: 120,
            quota: 100,
        };
        assert_eq!(
            err.to_string(),
            "Storage quota exceeded: 120 bytes requested, 100 allowed"
        );

        let err = PersistenceError::InvalidKey("../etc".to_string());
        assert_eq!(err.to_string(), "Invalid storage key: ../etc");
    }

    #[test]
    fn test_error_conversion() {
        let err: SettingsError = ConfigError::UnsupportedFormat("ini".to_string()).into();
        assert!(matches!(err, SettingsError::Config(_)));

        let err: SettingsError = PersistenceError::Unavailable("read-only".to_string()).into();
        assert!(matches!(err, SettingsError::Persistence(_)));
    }
}

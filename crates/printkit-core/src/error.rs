//! Error handling for PrintKit
//!
//! Provides the error types shared by every layer of the editor:
//! - Document errors (invariant violations on the layer document)
//! - Scene errors (rendering surface and image decoding)
//! - Template errors (product catalog loading and configuration)
//! - Export errors (validation gating and encoding)
//! - Background removal errors (single-flight image transform)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Document error type
///
/// Raised when a mutation would leave the design document inconsistent.
/// The document API rejects these instead of repairing them afterwards.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The document has not been initialized against a product template
    #[error("Document is not initialized for a product template")]
    NotInitialized,

    /// The view id is not part of the document
    #[error("Unknown view: {view_id}")]
    UnknownView {
        /// The view that was requested.
        view_id: String,
    },

    /// The layer id is not part of the view
    #[error("Unknown layer {layer_id} in view {view_id}")]
    UnknownLayer {
        /// The view that was searched.
        view_id: String,
        /// The layer that was requested.
        layer_id: String,
    },

    /// A layer with the same id already exists in the document
    #[error("Duplicate layer id: {layer_id}")]
    DuplicateLayerId {
        /// The conflicting layer id.
        layer_id: String,
    },

    /// Transform values are out of range
    #[error("Invalid transform for layer {layer_id}: {reason}")]
    InvalidTransform {
        /// The layer carrying the transform.
        layer_id: String,
        /// Why the transform was rejected.
        reason: String,
    },

    /// A reorder request was not a permutation of the view's layers
    #[error("Invalid layer order for view {view_id}: expected {expected} ids, got {actual}")]
    InvalidLayerOrder {
        /// The view being reordered.
        view_id: String,
        /// Number of layers in the view.
        expected: usize,
        /// Number of ids supplied.
        actual: usize,
    },

    /// A payload patch does not match the layer's kind
    #[error("Layer {layer_id} is a {actual} layer, not {expected}")]
    LayerKindMismatch {
        /// The layer being patched.
        layer_id: String,
        /// The kind the operation required.
        expected: String,
        /// The kind the layer actually has.
        actual: String,
    },
}

/// Scene error type
///
/// Represents failures of the rendering surface and of image decoding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The scene has not finished attaching to a view
    #[error("Scene is not ready")]
    NotReady,

    /// The requested view does not exist on the template
    #[error("Template {template_id} has no view {view_id}")]
    UnknownView {
        /// The template being attached.
        template_id: String,
        /// The requested view.
        view_id: String,
    },

    /// An image source could not be decoded
    #[error("Failed to decode image {src}: {reason}")]
    Decode {
        /// A shortened form of the image source.
        src: String,
        /// The decoder's message.
        reason: String,
    },

    /// The surface could not allocate or draw a raster
    #[error("Rasterization failed: {reason}")]
    Raster {
        /// The reason rasterization failed.
        reason: String,
    },
}

/// Template error type
///
/// Represents failures of the product catalog and template loading.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// A required setting for the loader mode is absent
    #[error("Missing configuration for {mode} mode: {field}")]
    MissingConfig {
        /// The loader mode.
        mode: String,
        /// The missing setting.
        field: String,
    },

    /// Every template in the payload failed validation
    #[error("No valid templates returned from API")]
    NoValidTemplates,

    /// The template source could not be read
    #[error("Failed to fetch templates: {reason}")]
    Fetch {
        /// The reason the fetch failed.
        reason: String,
    },

    /// A single supplied template failed validation
    #[error("Invalid template: {reason}")]
    Invalid {
        /// Why the template was rejected.
        reason: String,
    },

    /// The template id is not in the catalog
    #[error("Template not found: {template_id}")]
    NotFound {
        /// The requested template id.
        template_id: String,
    },
}

/// Export error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    /// Validation found errors and no override was given
    #[error("Export blocked by {error_count} validation error(s)")]
    Blocked {
        /// Number of error-severity issues.
        error_count: usize,
    },

    /// The raster could not be encoded
    #[error("Failed to encode {format}: {reason}")]
    Encode {
        /// The requested output format.
        format: String,
        /// The encoder's message.
        reason: String,
    },
}

/// Background removal error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackgroundRemovalError {
    /// A removal is already running
    #[error("Already processing")]
    AlreadyProcessing,

    /// The model failed to produce an image
    #[error("Background removal failed: {reason}")]
    Failed {
        /// The reason the model failed.
        reason: String,
    },
}

/// Main error type for PrintKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Document error
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Scene error
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// Template error
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Export error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Background removal error
    #[error(transparent)]
    BackgroundRemoval(#[from] BackgroundRemovalError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a document invariant error
    pub fn is_document_error(&self) -> bool {
        matches!(self, Error::Document(_))
    }

    /// Check if this error is an export blocked by validation
    pub fn is_export_blocked(&self) -> bool {
        matches!(self, Error::Export(ExportError::Blocked { .. }))
    }

    /// Check if this is a single-flight rejection
    pub fn is_already_processing(&self) -> bool {
        matches!(
            self,
            Error::BackgroundRemoval(BackgroundRemovalError::AlreadyProcessing)
        )
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_error_display() {
        let err = DocumentError::UnknownLayer {
            view_id: "front".to_string(),
            layer_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown layer abc in view front");
    }

    #[test]
    fn test_template_error_display() {
        assert_eq!(
            TemplateError::NoValidTemplates.to_string(),
            "No valid templates returned from API"
        );
    }

    #[test]
    fn test_error_conversion_and_predicates() {
        let err: Error = ExportError::Blocked { error_count: 2 }.into();
        assert!(err.is_export_blocked());
        assert_eq!(err.to_string(), "Export blocked by 2 validation error(s)");

        let err: Error = BackgroundRemovalError::AlreadyProcessing.into();
        assert!(err.is_already_processing());
        assert!(!err.is_document_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse.into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}

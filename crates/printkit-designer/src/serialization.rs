//! Document JSON import/export.
//!
//! Export is deterministic pretty-printed JSON. Import is forgiving at the
//! boundary: malformed input yields `None` (with a warning) and never
//! touches the caller's current document.

use anyhow::{Context, Result};
use printkit_core::DocumentError;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::model::{Document, DOCUMENT_VERSION};

/// Why a JSON payload was not accepted as a document
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unsupported document version {found}")]
    UnsupportedVersion { found: String },

    #[error(transparent)]
    Invalid(#[from] DocumentError),
}

/// Serialize a document as 2-space indented JSON
pub fn export_json(document: &Document) -> serde_json::Result<String> {
    serde_json::to_string_pretty(document)
}

/// Parse and check a document, reporting why it was rejected
pub fn parse_document(json: &str) -> std::result::Result<Document, ImportError> {
    let value: Value = serde_json::from_str(json)?;
    let Some(obj) = value.as_object() else {
        return Err(ImportError::MissingField("version"));
    };
    for field in ["version", "id", "views"] {
        let present = obj.get(field).is_some_and(|v| match v {
            Value::String(s) => !s.is_empty(),
            Value::Null => false,
            _ => true,
        });
        if !present {
            return Err(ImportError::MissingField(field));
        }
    }
    if let Some(found) = obj.get("version").and_then(Value::as_str) {
        if found != DOCUMENT_VERSION {
            return Err(ImportError::UnsupportedVersion {
                found: found.to_string(),
            });
        }
    }

    let document: Document = serde_json::from_value(value)?;
    document.check_invariants()?;
    Ok(document)
}

/// Import a document, or `None` if the payload is unusable
pub fn import_json(json: &str) -> Option<Document> {
    match parse_document(json) {
        Ok(document) => Some(document),
        Err(err) => {
            tracing::warn!("Rejected design import: {}", err);
            None
        }
    }
}

/// Write a document to `path` as JSON
pub fn save_to_file(document: &Document, path: impl AsRef<Path>) -> Result<()> {
    let json = export_json(document).context("Failed to serialize design")?;
    std::fs::write(path.as_ref(), json).context("Failed to write design file")?;
    tracing::info!("Saved design {} to {}", document.id, path.as_ref().display());
    Ok(())
}

/// Read a document from a JSON file
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Document> {
    let content = std::fs::read_to_string(path.as_ref()).context("Failed to read design file")?;
    let document = parse_document(&content).context("Failed to parse design file")?;
    tracing::info!("Loaded design {} from {}", document.id, path.as_ref().display());
    Ok(document)
}

/// Download file name for a design: non-alphanumerics become `_`
pub fn download_filename(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.json", stem)
}

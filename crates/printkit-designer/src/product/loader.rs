//! Template loading per editor mode.
//!
//! - demo: the built-in registry
//! - embedded: one template supplied by the host
//! - standalone: a template list fetched from a [`TemplateSource`]
//!
//! Missing configuration and empty results are terminal errors recorded on
//! the catalog.

use async_trait::async_trait;
use printkit_core::TemplateError;
use printkit_settings::{EditorMode, TemplateSettings};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use super::catalog::ProductCatalog;
use super::registry::TemplateRegistry;
use super::validator::{validate_template, validate_templates};

/// Where standalone-mode templates come from
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Fetch the raw template list published at `endpoint`
    async fn fetch(&self, endpoint: &str) -> Result<Value, TemplateError>;
}

/// Reads template lists from JSON files; the endpoint is a path, optionally
/// relative to a base directory.
#[derive(Debug, Clone, Default)]
pub struct FileTemplateSource {
    base_dir: Option<PathBuf>,
}

impl FileTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }
}

#[async_trait]
impl TemplateSource for FileTemplateSource {
    async fn fetch(&self, endpoint: &str) -> Result<Value, TemplateError> {
        let path = match &self.base_dir {
            Some(base) => base.join(endpoint),
            None => PathBuf::from(endpoint),
        };
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| TemplateError::Fetch {
                reason: format!("{}: {}", path.display(), e),
            })?;
        serde_json::from_str(&content).map_err(|e| TemplateError::Fetch {
            reason: format!("{}: {}", path.display(), e),
        })
    }
}

/// Fills a [`ProductCatalog`] according to [`TemplateSettings`]
pub struct TemplateLoader {
    settings: TemplateSettings,
    source: Arc<dyn TemplateSource>,
}

impl TemplateLoader {
    pub fn new(settings: TemplateSettings, source: Arc<dyn TemplateSource>) -> Self {
        Self { settings, source }
    }

    /// Load templates into `catalog`. `embedded` is the host-supplied
    /// template for embedded mode.
    ///
    /// On failure the catalog is left in the error state and the error is
    /// returned.
    pub async fn load(
        &self,
        catalog: &mut ProductCatalog,
        embedded: Option<&Value>,
    ) -> Result<(), TemplateError> {
        let result = self.load_inner(catalog, embedded).await;
        if let Err(err) = &result {
            tracing::error!("Template loading failed: {}", err);
            catalog.set_error(err.to_string());
        } else if let Some(initial) = &self.settings.initial_template {
            if let Err(err) = catalog.select_template(initial) {
                tracing::warn!("Initial template unavailable: {}", err);
            }
        }
        result
    }

    async fn load_inner(
        &self,
        catalog: &mut ProductCatalog,
        embedded: Option<&Value>,
    ) -> Result<(), TemplateError> {
        match self.settings.mode {
            EditorMode::Demo => {
                catalog.set_templates(TemplateRegistry::builtin().all());
                Ok(())
            }
            EditorMode::Embedded => {
                let raw = embedded.ok_or_else(|| TemplateError::MissingConfig {
                    mode: EditorMode::Embedded.to_string(),
                    field: "template".to_string(),
                })?;
                let template = validate_template(raw).ok_or_else(|| TemplateError::Invalid {
                    reason: "template provided to embedded editor failed validation".to_string(),
                })?;
                catalog.set_embedded_template(template);
                Ok(())
            }
            EditorMode::Standalone => {
                let endpoint = self.settings.api_endpoint.as_deref().ok_or_else(|| {
                    TemplateError::MissingConfig {
                        mode: EditorMode::Standalone.to_string(),
                        field: "api_endpoint".to_string(),
                    }
                })?;
                catalog.set_loading();
                let raw = self.source.fetch(endpoint).await?;
                let templates = validate_templates(&raw);
                if templates.is_empty() {
                    return Err(TemplateError::NoValidTemplates);
                }
                tracing::info!("Loaded {} templates from {}", templates.len(), endpoint);
                catalog.set_templates(templates);
                Ok(())
            }
        }
    }
}

//! Loaded templates, the selected product and its active view.

use printkit_core::TemplateError;

use super::template::{ProductTemplate, ProductView};

/// Template loading state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    /// Terminal; shown to the user, never retried automatically
    Error(String),
}

/// Templates available to the editor plus the current selection.
///
/// Selection and active view are editor state; they are never recorded in
/// document history.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    templates: Vec<ProductTemplate>,
    selected: Option<String>,
    active_view_id: String,
    status: LoadStatus,
}

impl ProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn templates(&self) -> &[ProductTemplate] {
        &self.templates
    }

    pub fn selected(&self) -> Option<&ProductTemplate> {
        let id = self.selected.as_deref()?;
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn active_view_id(&self) -> &str {
        &self.active_view_id
    }

    pub fn active_view(&self) -> Option<&ProductView> {
        self.selected()?.view(&self.active_view_id)
    }

    /// Select a template and jump to its default view
    pub fn select_template(&mut self, template_id: &str) -> Result<&ProductTemplate, TemplateError> {
        let template = self
            .templates
            .iter()
            .find(|t| t.id == template_id)
            .ok_or_else(|| TemplateError::NotFound {
                template_id: template_id.to_string(),
            })?;
        self.selected = Some(template.id.clone());
        self.active_view_id = template.default_view_id.clone();
        Ok(template)
    }

    /// Switch views within the selected template. Returns false when the
    /// view does not exist.
    pub fn set_active_view(&mut self, view_id: &str) -> bool {
        let exists = self
            .selected()
            .is_some_and(|t| t.view(view_id).is_some());
        if exists {
            self.active_view_id = view_id.to_string();
        }
        exists
    }

    /// Replace the template list and select its first entry
    pub fn set_templates(&mut self, templates: Vec<ProductTemplate>) {
        self.selected = templates.first().map(|t| t.id.clone());
        self.active_view_id = templates
            .first()
            .map(|t| t.default_view_id.clone())
            .unwrap_or_default();
        self.templates = templates;
        self.status = LoadStatus::Loaded;
    }

    /// Use a single host-provided template
    pub fn set_embedded_template(&mut self, template: ProductTemplate) {
        self.set_templates(vec![template]);
    }

    pub fn set_loading(&mut self) {
        self.status = LoadStatus::Loading;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status = LoadStatus::Error(message.into());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::TemplateRegistry;

    #[test]
    fn test_set_templates_selects_first() {
        let mut catalog = ProductCatalog::new();
        assert_eq!(catalog.status(), &LoadStatus::Idle);

        catalog.set_templates(TemplateRegistry::builtin().all());
        assert_eq!(catalog.status(), &LoadStatus::Loaded);
        let first = catalog.selected().unwrap().id.clone();
        assert_eq!(first, catalog.templates()[0].id);
        assert_eq!(
            catalog.active_view_id(),
            catalog.templates()[0].default_view_id
        );
    }

    #[test]
    fn test_select_and_switch_view() {
        let mut catalog = ProductCatalog::new();
        catalog.set_templates(TemplateRegistry::builtin().all());

        catalog.select_template("tshirt-classic").unwrap();
        assert_eq!(catalog.active_view_id(), "front");
        assert!(catalog.set_active_view("back"));
        assert_eq!(catalog.active_view().unwrap().label, "Back");
        assert!(!catalog.set_active_view("wrap"));
        assert_eq!(catalog.active_view_id(), "back");

        assert!(matches!(
            catalog.select_template("nope"),
            Err(TemplateError::NotFound { .. })
        ));
    }

    #[test]
    fn test_error_and_reset() {
        let mut catalog = ProductCatalog::new();
        catalog.set_loading();
        catalog.set_error("API returned 500");
        assert_eq!(
            catalog.status(),
            &LoadStatus::Error("API returned 500".to_string())
        );
        catalog.reset();
        assert_eq!(catalog.status(), &LoadStatus::Idle);
        assert!(catalog.selected().is_none());
    }
}

//! Design validation
//!
//! Checks a document against its product template before export: empty
//! views, image print quality and layers that sit mostly outside the
//! printable area. Issues are advisory; only error-severity issues gate an
//! export, and the caller may still override.

use printkit_core::ExportError;
use printkit_settings::ValidationSettings;
use serde::{Deserialize, Serialize};

use crate::geometry::{calculate_dpi_with, overlap_ratio, DpiStatus, GOOD_DPI};
use crate::model::Document;
use crate::product::ProductTemplate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_id: Option<String>,
}

impl ValidationIssue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            layer_id: None,
            view_id: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(message)
        }
    }

    pub fn in_view(mut self, view_id: impl Into<String>) -> Self {
        self.view_id = Some(view_id.into());
        self
    }

    pub fn on_layer(mut self, layer_id: impl Into<String>) -> Self {
        self.layer_id = Some(layer_id.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Outcome of a validation run; `valid` is false iff any issue is an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: !issues.iter().any(ValidationIssue::is_error),
            issues,
        }
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Thresholds used by the built-in checks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationConfig {
    pub good_dpi: f64,
    /// Overlap ratio below which a layer counts as mostly outside
    pub mostly_outside_ratio: f64,
    pub skip_locked_layers: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            good_dpi: GOOD_DPI,
            mostly_outside_ratio: 0.1,
            skip_locked_layers: true,
        }
    }
}

impl From<&ValidationSettings> for ValidationConfig {
    fn from(settings: &ValidationSettings) -> Self {
        Self {
            good_dpi: settings.good_dpi,
            mostly_outside_ratio: settings.mostly_outside_ratio,
            skip_locked_layers: settings.skip_locked_layers,
        }
    }
}

/// Additional check contributed by an integrator
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &str;

    fn check(
        &self,
        document: &Document,
        template: &ProductTemplate,
        config: &ValidationConfig,
    ) -> Vec<ValidationIssue>;
}

/// Runs the built-in checks followed by any registered rules
#[derive(Default)]
pub struct Validator {
    config: ValidationConfig,
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            rules: Vec::new(),
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn validate(&self, document: &Document, template: &ProductTemplate) -> ValidationResult {
        let mut issues = builtin_issues(document, template, &self.config);
        for rule in &self.rules {
            let found = rule.check(document, template, &self.config);
            if !found.is_empty() {
                tracing::debug!("Rule {} reported {} issue(s)", rule.name(), found.len());
            }
            issues.extend(found);
        }

        let result = ValidationResult::from_issues(issues);
        tracing::debug!(
            "Validated design {}: {} error(s), {} warning(s)",
            document.id,
            result.error_count(),
            result.warning_count()
        );
        result
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .field(
                "rules",
                &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Validate with the default thresholds and no extra rules
pub fn validate(document: &Document, template: &ProductTemplate) -> ValidationResult {
    Validator::default().validate(document, template)
}

fn builtin_issues(
    document: &Document,
    template: &ProductTemplate,
    config: &ValidationConfig,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for product_view in &template.views {
        let Some(view) = document.views.get(&product_view.id) else {
            continue;
        };

        if view.layers.is_empty() {
            issues.push(
                ValidationIssue::warning(format!("{} view has no layers.", product_view.label))
                    .in_view(&product_view.id),
            );
            continue;
        }

        let area = &product_view.printable_area;
        let bounds = area.bounds();
        for layer in &view.layers {
            if !layer.visible || (config.skip_locked_layers && layer.locked) {
                continue;
            }

            if let Some(dpi) = calculate_dpi_with(layer, area, config.good_dpi) {
                let message = match dpi.status {
                    DpiStatus::Low => Some(ValidationIssue::error(format!(
                        "\"{}\" is {} DPI (minimum: {}).",
                        layer.name, dpi.effective_dpi, dpi.min_dpi
                    ))),
                    DpiStatus::Warning => Some(ValidationIssue::warning(format!(
                        "\"{}\" is {} DPI. 300+ recommended.",
                        layer.name, dpi.effective_dpi
                    ))),
                    DpiStatus::Good => None,
                };
                if let Some(issue) = message {
                    issues.push(issue.on_layer(&layer.id).in_view(&product_view.id));
                }
            }

            if let Some(ratio) = overlap_ratio(&layer.transform, &bounds) {
                if ratio < config.mostly_outside_ratio {
                    issues.push(
                        ValidationIssue::warning(format!(
                            "\"{}\" is mostly outside the printable area.",
                            layer.name
                        ))
                        .on_layer(&layer.id)
                        .in_view(&product_view.id),
                    );
                }
            }
        }
    }

    issues
}

/// Decides whether an export may proceed after validation
pub struct ExportGate;

impl ExportGate {
    /// A result with errors blocks the export unless `allow_override` is set
    pub fn check(result: &ValidationResult, allow_override: bool) -> Result<(), ExportError> {
        if result.valid {
            return Ok(());
        }
        let error_count = result.error_count();
        if allow_override {
            tracing::warn!(
                "Exporting despite {} validation error(s) by user override",
                error_count
            );
            return Ok(());
        }
        Err(ExportError::Blocked { error_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageData, Layer, ShapeData, ShapeType, Transform};
    use crate::product::mug_template;

    fn document_with(layers: Vec<Layer>) -> (Document, ProductTemplate) {
        let template = mug_template();
        let mut document = Document::for_template(&template);
        if let Some(view) = document.views.get_mut("wrap") {
            view.layers = layers;
        }
        (document, template)
    }

    fn image(name: &str, original_width: u32) -> Layer {
        // Mug wrap area is 700x300 px over 8.5x3.5 in, starting at (100, 50)
        Layer::image(
            name,
            Transform::new(100.0, 50.0, 300.0, 120.0),
            ImageData::new("data:,", original_width, 480),
        )
    }

    #[test]
    fn test_empty_view_warns() {
        let (document, template) = document_with(Vec::new());
        let result = validate(&document, &template);
        assert!(result.valid);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].message, "Wrap view has no layers.");
        assert_eq!(result.issues[0].view_id.as_deref(), Some("wrap"));
    }

    #[test]
    fn test_low_dpi_is_single_error() {
        let (document, template) = document_with(vec![image("Logo", 300)]);
        let result = validate(&document, &template);
        assert!(!result.valid);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.error_count(), 1);
        assert_eq!(
            result.issues[0].message,
            "\"Logo\" is 82 DPI (minimum: 150)."
        );
    }

    #[test]
    fn test_warning_dpi() {
        let (document, template) = document_with(vec![image("Logo", 800)]);
        let result = validate(&document, &template);
        assert!(result.valid);
        assert_eq!(
            result.issues[0].message,
            "\"Logo\" is 220 DPI. 300+ recommended."
        );
        assert_eq!(result.issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_mostly_outside() {
        let shape = Layer::shape(
            "Star",
            Transform::new(0.0, 0.0, 100.0, 100.0),
            ShapeData::new(ShapeType::Rect, "#ff0000"),
        );
        let (document, template) = document_with(vec![shape]);
        let result = validate(&document, &template);
        // 100x100 at the origin overlaps the area by 0x50
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].message.contains("mostly outside"));
    }

    #[test]
    fn test_hidden_and_locked_layers_are_skipped() {
        let mut hidden = image("Hidden", 300);
        hidden.visible = false;
        let mut locked = image("Locked", 300);
        locked.locked = true;
        let (document, template) = document_with(vec![hidden, locked]);
        assert!(validate(&document, &template).is_clean());

        let validator = Validator::new(ValidationConfig {
            skip_locked_layers: false,
            ..ValidationConfig::default()
        });
        assert_eq!(validator.validate(&document, &template).error_count(), 1);
    }

    struct RequireName;

    impl ValidationRule for RequireName {
        fn name(&self) -> &str {
            "require-name"
        }

        fn check(
            &self,
            document: &Document,
            _template: &ProductTemplate,
            _config: &ValidationConfig,
        ) -> Vec<ValidationIssue> {
            if document.name.trim().is_empty() {
                vec![ValidationIssue::error("Design needs a name.")]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn test_extra_rules_run_after_builtins() {
        let (mut document, template) = document_with(Vec::new());
        document.name = " ".to_string();
        let mut validator = Validator::default();
        validator.add_rule(Box::new(RequireName));

        let result = validator.validate(&document, &template);
        assert!(!result.valid);
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[1].message, "Design needs a name.");
    }

    #[test]
    fn test_export_gate() {
        let (document, template) = document_with(vec![image("Logo", 300)]);
        let result = validate(&document, &template);
        assert_eq!(
            ExportGate::check(&result, false),
            Err(ExportError::Blocked { error_count: 1 })
        );
        assert!(ExportGate::check(&result, true).is_ok());

        let (document, template) = document_with(vec![image("Logo", 1200)]);
        assert!(ExportGate::check(&validate(&document, &template), false).is_ok());
    }
}

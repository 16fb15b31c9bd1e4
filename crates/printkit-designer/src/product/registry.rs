//! Built-in demo templates.

use std::collections::BTreeMap;

use super::template::{PrintableArea, PrintableShape, ProductTemplate, ProductType, ProductView};

/// In-memory template lookup keyed by id
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, ProductTemplate>,
}

impl TemplateRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the demo t-shirt, mug and phone case
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(tshirt_template());
        registry.register(mug_template());
        registry.register(phonecase_template());
        registry
    }

    /// Add or replace a template
    pub fn register(&mut self, template: ProductTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn get(&self, id: &str) -> Option<&ProductTemplate> {
        self.templates.get(id)
    }

    pub fn by_type(&self, kind: ProductType) -> impl Iterator<Item = &ProductTemplate> + '_ {
        self.templates
            .values()
            .filter(move |t| t.kind() == Some(kind))
    }

    /// All templates, ordered by id
    pub fn all(&self) -> Vec<ProductTemplate> {
        self.templates.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn view(
    id: &str,
    label: &str,
    mockup: &str,
    mockup_size: (f64, f64),
    printable_area: PrintableArea,
) -> ProductView {
    ProductView {
        id: id.to_string(),
        label: label.to_string(),
        mockup_image_url: mockup.to_string(),
        mockup_width: mockup_size.0,
        mockup_height: mockup_size.1,
        printable_area,
    }
}

/// Crew neck t-shirt with front and back areas
pub fn tshirt_template() -> ProductTemplate {
    let area = || PrintableArea::rect(250.0, 200.0, 300.0, 400.0, 12.0, 16.0);
    ProductTemplate {
        id: "tshirt-classic".to_string(),
        product_type: ProductType::Tshirt.to_string(),
        name: "Classic T-Shirt".to_string(),
        description: "Standard crew neck t-shirt with front and back print areas".to_string(),
        views: vec![
            view("front", "Front", "/templates/tshirt-front.svg", (800.0, 1000.0), area()),
            view("back", "Back", "/templates/tshirt-back.svg", (800.0, 1000.0), area()),
        ],
        default_view_id: "front".to_string(),
        metadata: Default::default(),
    }
}

/// 11oz mug with a wrap-around area
pub fn mug_template() -> ProductTemplate {
    ProductTemplate {
        id: "mug-classic".to_string(),
        product_type: ProductType::Mug.to_string(),
        name: "Classic Mug".to_string(),
        description: "11oz ceramic mug with wrap-around print area".to_string(),
        views: vec![view(
            "wrap",
            "Wrap",
            "/templates/mug-wrap.svg",
            (900.0, 400.0),
            PrintableArea::rect(100.0, 50.0, 700.0, 300.0, 8.5, 3.5),
        )],
        default_view_id: "wrap".to_string(),
        metadata: Default::default(),
    }
}

/// Slim phone case with a rounded back area
pub fn phonecase_template() -> ProductTemplate {
    ProductTemplate {
        id: "phonecase-classic".to_string(),
        product_type: ProductType::Phonecase.to_string(),
        name: "Phone Case".to_string(),
        description: "Slim phone case with back print area".to_string(),
        views: vec![view(
            "back",
            "Back",
            "/templates/phonecase-back.svg",
            (400.0, 800.0),
            PrintableArea::rect(50.0, 80.0, 300.0, 600.0, 2.75, 5.5)
                .with_shape(PrintableShape::Rect {
                    border_radius: Some(20.0),
                })
                .with_min_dpi(200.0),
        )],
        default_view_id: "back".to_string(),
        metadata: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::validate_template;

    #[test]
    fn test_builtin_templates() {
        let registry = TemplateRegistry::builtin();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("tshirt-classic").unwrap().views.len(), 2);
        assert_eq!(
            registry.get("phonecase-classic").unwrap().views[0]
                .printable_area
                .min_dpi,
            200.0
        );
        assert_eq!(registry.by_type(ProductType::Mug).count(), 1);
    }

    #[test]
    fn test_builtins_pass_runtime_validation() {
        for template in TemplateRegistry::builtin().all() {
            let value = serde_json::to_value(&template).unwrap();
            assert_eq!(validate_template(&value), Some(template));
        }
    }
}

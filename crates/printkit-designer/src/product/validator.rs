//! Runtime validation of untrusted template JSON.
//!
//! Templates arriving from an API or an embedding host are checked field by
//! field. Invalid views are skipped; a template with no valid views is
//! rejected. Nothing here panics or errors: rejection is `None`.

use serde_json::{Map, Value};

use super::template::{PrintableArea, PrintableShape, ProductTemplate, ProductView};

/// Minimum DPI assumed when an area does not specify a positive one
pub const DEFAULT_MIN_DPI: f64 = 150.0;

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn finite(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64).filter(|v| v.is_finite())
}

fn positive(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    finite(obj, key).filter(|v| *v > 0.0)
}

fn validate_printable_area(raw: &Value) -> Option<PrintableArea> {
    let obj = raw.as_object()?;

    let x = finite(obj, "x")?;
    let y = finite(obj, "y")?;
    let width = positive(obj, "width")?;
    let height = positive(obj, "height")?;
    let physical_width_inches = positive(obj, "physicalWidthInches")?;
    let physical_height_inches = positive(obj, "physicalHeightInches")?;

    let shape_obj = obj.get("shape")?.as_object()?;
    match non_empty_str(shape_obj, "type")? {
        "rect" | "ellipse" | "polygon" => {}
        _ => return None,
    }
    let shape: PrintableShape = serde_json::from_value(Value::Object(shape_obj.clone())).ok()?;

    Some(PrintableArea {
        shape,
        x,
        y,
        width,
        height,
        physical_width_inches,
        physical_height_inches,
        min_dpi: positive(obj, "minDPI").unwrap_or(DEFAULT_MIN_DPI),
    })
}

fn validate_view(raw: &Value) -> Option<ProductView> {
    let obj = raw.as_object()?;

    let id = non_empty_str(obj, "id")?;
    let label = non_empty_str(obj, "label")?;
    let mockup_image_url = non_empty_str(obj, "mockupImageUrl")?;
    let mockup_width = positive(obj, "mockupWidth")?;
    let mockup_height = positive(obj, "mockupHeight")?;
    let printable_area = validate_printable_area(obj.get("printableArea")?)?;

    Some(ProductView {
        id: id.to_string(),
        label: label.to_string(),
        mockup_image_url: mockup_image_url.to_string(),
        mockup_width,
        mockup_height,
        printable_area,
    })
}

/// Validate a single template. Returns `None` if it is unusable.
pub fn validate_template(raw: &Value) -> Option<ProductTemplate> {
    let Some(obj) = raw.as_object() else {
        tracing::warn!("Template is not an object");
        return None;
    };

    let Some(id) = non_empty_str(obj, "id") else {
        tracing::warn!("Template has a missing or invalid id");
        return None;
    };
    let Some(product_type) = non_empty_str(obj, "type") else {
        tracing::warn!("Missing or invalid type for template \"{}\"", id);
        return None;
    };
    let Some(name) = non_empty_str(obj, "name") else {
        tracing::warn!("Missing or invalid name for template \"{}\"", id);
        return None;
    };
    let raw_views = match obj.get("views").and_then(Value::as_array) {
        Some(views) if !views.is_empty() => views,
        _ => {
            tracing::warn!("Missing or empty views for template \"{}\"", id);
            return None;
        }
    };

    let views: Vec<ProductView> = raw_views
        .iter()
        .filter_map(|v| {
            let view = validate_view(v);
            if view.is_none() {
                tracing::warn!("Invalid view in template \"{}\", skipping", id);
            }
            view
        })
        .collect();

    if views.is_empty() {
        tracing::warn!("No valid views for template \"{}\"", id);
        return None;
    }

    let default_view_id = non_empty_str(obj, "defaultViewId")
        .filter(|wanted| views.iter().any(|v| v.id == *wanted))
        .unwrap_or(&views[0].id)
        .to_string();

    Some(ProductTemplate {
        id: id.to_string(),
        product_type: product_type.to_string(),
        name: name.to_string(),
        description: non_empty_str(obj, "description")
            .unwrap_or_default()
            .to_string(),
        views,
        default_view_id,
        metadata: obj
            .get("metadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
    })
}

/// Validate a template list, dropping invalid entries. Non-arrays yield an
/// empty list.
pub fn validate_templates(raw: &Value) -> Vec<ProductTemplate> {
    raw.as_array()
        .map(|items| items.iter().filter_map(validate_template).collect())
        .unwrap_or_default()
}

//! Product template types.
//!
//! Templates are read-only inputs: each view pairs a mockup image with the
//! printable area that maps view pixels onto physical inches.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// A 2D point in view pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Outline of the printable area, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PrintableShape {
    Rect {
        #[serde(
            rename = "borderRadius",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        border_radius: Option<f64>,
    },
    Ellipse,
    /// Points are absolute view coordinates
    Polygon { points: Vec<Point> },
}

impl PrintableShape {
    pub fn rect() -> Self {
        PrintableShape::Rect {
            border_radius: None,
        }
    }
}

/// Region of a view where print content is legal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintableArea {
    pub shape: PrintableShape,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub physical_width_inches: f64,
    pub physical_height_inches: f64,
    #[serde(rename = "minDPI")]
    pub min_dpi: f64,
}

impl PrintableArea {
    /// Rectangular area with the default 150 DPI minimum
    pub fn rect(x: f64, y: f64, width: f64, height: f64, inches_w: f64, inches_h: f64) -> Self {
        Self {
            shape: PrintableShape::rect(),
            x,
            y,
            width,
            height,
            physical_width_inches: inches_w,
            physical_height_inches: inches_h,
            min_dpi: 150.0,
        }
    }

    pub fn with_shape(mut self, shape: PrintableShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_min_dpi(mut self, min_dpi: f64) -> Self {
        self.min_dpi = min_dpi;
        self
    }

    /// Bounding rectangle in view pixels
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// View pixels per physical inch, horizontally
    pub fn pixels_per_inch_x(&self) -> f64 {
        self.width / self.physical_width_inches
    }

    /// View pixels per physical inch, vertically
    pub fn pixels_per_inch_y(&self) -> f64 {
        self.height / self.physical_height_inches
    }
}

/// Known product families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Tshirt,
    Mug,
    Phonecase,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Tshirt => "tshirt",
            ProductType::Mug => "mug",
            ProductType::Phonecase => "phonecase",
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tshirt" => Ok(ProductType::Tshirt),
            "mug" => Ok(ProductType::Mug),
            "phonecase" => Ok(ProductType::Phonecase),
            other => Err(format!("unknown product type: {}", other)),
        }
    }
}

/// One face of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub label: String,
    pub mockup_image_url: String,
    pub mockup_width: f64,
    pub mockup_height: f64,
    pub printable_area: PrintableArea,
}

/// A printable product and its views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTemplate {
    pub id: String,
    /// Product family; API templates may carry families beyond [`ProductType`]
    #[serde(rename = "type")]
    pub product_type: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub views: Vec<ProductView>,
    pub default_view_id: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ProductTemplate {
    pub fn view(&self, view_id: &str) -> Option<&ProductView> {
        self.views.iter().find(|v| v.id == view_id)
    }

    /// The default view, falling back to the first one
    pub fn default_view(&self) -> Option<&ProductView> {
        self.view(&self.default_view_id).or_else(|| self.views.first())
    }

    pub fn view_ids(&self) -> impl Iterator<Item = &str> {
        self.views.iter().map(|v| v.id.as_str())
    }

    /// The product family, when it is one of the known ones
    pub fn kind(&self) -> Option<ProductType> {
        self.product_type.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_wire_format() {
        let rounded = PrintableShape::Rect {
            border_radius: Some(20.0),
        };
        assert_eq!(
            serde_json::to_value(&rounded).unwrap(),
            json!({ "type": "rect", "borderRadius": 20.0 })
        );
        assert_eq!(
            serde_json::to_value(PrintableShape::rect()).unwrap(),
            json!({ "type": "rect" })
        );

        let polygon: PrintableShape = serde_json::from_value(json!({
            "type": "polygon",
            "points": [{ "x": 0, "y": 0 }, { "x": 10, "y": 0 }, { "x": 5, "y": 8 }]
        }))
        .unwrap();
        assert!(matches!(polygon, PrintableShape::Polygon { ref points } if points.len() == 3));
    }

    #[test]
    fn test_min_dpi_field_name() {
        let area = PrintableArea::rect(0.0, 0.0, 700.0, 300.0, 8.5, 3.5);
        let value = serde_json::to_value(&area).unwrap();
        assert_eq!(value["minDPI"], 150.0);
        assert_eq!(value["physicalWidthInches"], 8.5);
    }

    #[test]
    fn test_product_type_round_trip() {
        let template = crate::product::mug_template();
        assert_eq!(template.kind(), Some(ProductType::Mug));
        assert_eq!(ProductType::Phonecase.to_string(), "phonecase");
        assert!("poster".parse::<ProductType>().is_err());
        assert_eq!(serde_json::to_value(ProductType::Tshirt).unwrap(), json!("tshirt"));
    }

    #[test]
    fn test_pixels_per_inch() {
        let area = PrintableArea::rect(0.0, 0.0, 700.0, 300.0, 8.5, 3.5);
        assert!((area.pixels_per_inch_x() - 82.352_941).abs() < 1e-5);
        assert!((area.pixels_per_inch_y() - 85.714_285).abs() < 1e-5);
    }
}

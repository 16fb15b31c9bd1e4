//! Layers and their typed payloads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::transform::{Transform, TransformPatch};

/// Identifier of a layer, unique within a document
pub type LayerId = String;

/// Fresh unique layer/document identifier
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Discriminant of [`LayerData`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Image,
    Text,
    Shape,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Text => write!(f, "text"),
            Self::Shape => write!(f, "shape"),
        }
    }
}

/// A named image filter with numeric parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFilter {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

/// Source-pixel crop rectangle of an image layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamp into a `width` x `height` source image, keeping at least one pixel
    pub fn clamped_to(&self, width: f64, height: f64) -> Self {
        let x = self.x.clamp(0.0, (width - 1.0).max(0.0));
        let y = self.y.clamp(0.0, (height - 1.0).max(0.0));
        Self {
            x,
            y,
            width: self.width.clamp(1.0, (width - x).max(1.0)),
            height: self.height.clamp(1.0, (height - y).max(1.0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    /// Data URL or path of the pixels
    pub src: String,
    /// Native pixel size of the source
    pub original_width: u32,
    pub original_height: u32,
    #[serde(default)]
    pub filters: Vec<ImageFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_height: Option<f64>,
}

impl ImageData {
    pub fn new(src: impl Into<String>, original_width: u32, original_height: u32) -> Self {
        Self {
            src: src.into(),
            original_width,
            original_height,
            filters: Vec::new(),
            crop_x: None,
            crop_y: None,
            crop_width: None,
            crop_height: None,
        }
    }

    /// The crop rectangle, when all four crop fields are set
    pub fn crop(&self) -> Option<CropRect> {
        Some(CropRect {
            x: self.crop_x?,
            y: self.crop_y?,
            width: self.crop_width?,
            height: self.crop_height?,
        })
    }

    pub fn set_crop(&mut self, crop: Option<CropRect>) {
        self.crop_x = crop.map(|c| c.x);
        self.crop_y = crop.map(|c| c.y);
        self.crop_width = crop.map(|c| c.width);
        self.crop_height = crop.map(|c| c.height);
    }
}

/// CSS font weight, either numeric (`700`) or a keyword (`"bold"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontWeight {
    Numeric(u16),
    Keyword(String),
}

impl Default for FontWeight {
    fn default() -> Self {
        FontWeight::Numeric(400)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub text_align: TextAlign,
    pub fill: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    pub line_height: f64,
    pub char_spacing: f64,
}

impl TextData {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_family: "Arial".to_string(),
            font_size: 32.0,
            font_weight: FontWeight::default(),
            font_style: FontStyle::Normal,
            text_align: TextAlign::Left,
            fill: "#000000".to_string(),
            stroke: None,
            stroke_width: None,
            line_height: 1.2,
            char_spacing: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rect,
    Circle,
    Ellipse,
    Triangle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeData {
    pub shape_type: ShapeType,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
}

impl ShapeData {
    pub fn new(shape_type: ShapeType, fill: impl Into<String>) -> Self {
        Self {
            shape_type,
            fill: fill.into(),
            stroke: "#000000".to_string(),
            stroke_width: 0.0,
            border_radius: None,
        }
    }
}

/// Payload of a layer, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerData {
    Image(ImageData),
    Text(TextData),
    Shape(ShapeData),
}

impl LayerData {
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerData::Image(_) => LayerKind::Image,
            LayerData::Text(_) => LayerKind::Text,
            LayerData::Shape(_) => LayerKind::Shape,
        }
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match self {
            LayerData::Image(image) => Some(image),
            _ => None,
        }
    }
}

/// One element of a view's z-ordered stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LayerRepr", into = "LayerRepr")]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    /// 0.0 (transparent) to 1.0 (opaque)
    pub opacity: f64,
    pub transform: Transform,
    pub data: LayerData,
}

impl Layer {
    /// Visible, unlocked, opaque layer with a fresh id
    pub fn new(name: impl Into<String>, transform: Transform, data: LayerData) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            visible: true,
            locked: false,
            opacity: 1.0,
            transform,
            data,
        }
    }

    pub fn image(name: impl Into<String>, transform: Transform, image: ImageData) -> Self {
        Self::new(name, transform, LayerData::Image(image))
    }

    pub fn text(name: impl Into<String>, transform: Transform, text: TextData) -> Self {
        Self::new(name, transform, LayerData::Text(text))
    }

    pub fn shape(name: impl Into<String>, transform: Transform, shape: ShapeData) -> Self {
        Self::new(name, transform, LayerData::Shape(shape))
    }

    /// Replace the generated id
    pub fn with_id(mut self, id: impl Into<LayerId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn kind(&self) -> LayerKind {
        self.data.kind()
    }

    pub fn is_image(&self) -> bool {
        self.kind() == LayerKind::Image
    }
}

/// Shallow patch of a layer's fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerPatch {
    pub name: Option<String>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub opacity: Option<f64>,
    pub transform: Option<TransformPatch>,
    /// Replacement payload; must be of the same kind as the layer
    pub data: Option<LayerData>,
}

impl LayerPatch {
    pub fn visible(visible: bool) -> Self {
        Self {
            visible: Some(visible),
            ..Self::default()
        }
    }

    pub fn locked(locked: bool) -> Self {
        Self {
            locked: Some(locked),
            ..Self::default()
        }
    }

    pub fn opacity(opacity: f64) -> Self {
        Self {
            opacity: Some(opacity),
            ..Self::default()
        }
    }

    pub fn transform(patch: TransformPatch) -> Self {
        Self {
            transform: Some(patch),
            ..Self::default()
        }
    }

    pub fn data(data: LayerData) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }
}

/// Wire form of [`Layer`], carrying the redundant top-level `type`.
#[derive(Serialize, Deserialize)]
struct LayerRepr {
    id: LayerId,
    #[serde(rename = "type")]
    kind: LayerKind,
    name: String,
    visible: bool,
    locked: bool,
    opacity: f64,
    transform: Transform,
    data: LayerData,
}

impl TryFrom<LayerRepr> for Layer {
    type Error = String;

    fn try_from(repr: LayerRepr) -> Result<Self, Self::Error> {
        if repr.kind != repr.data.kind() {
            return Err(format!(
                "layer {} has type {} but {} data",
                repr.id,
                repr.kind,
                repr.data.kind()
            ));
        }
        Ok(Layer {
            id: repr.id,
            name: repr.name,
            visible: repr.visible,
            locked: repr.locked,
            opacity: repr.opacity,
            transform: repr.transform,
            data: repr.data,
        })
    }
}

impl From<Layer> for LayerRepr {
    fn from(layer: Layer) -> Self {
        LayerRepr {
            id: layer.id,
            kind: layer.data.kind(),
            name: layer.name,
            visible: layer.visible,
            locked: layer.locked,
            opacity: layer.opacity,
            transform: layer.transform,
            data: layer.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layer_wire_format() {
        let layer = Layer::shape(
            "Box",
            Transform::new(1.0, 2.0, 30.0, 40.0),
            ShapeData::new(ShapeType::Rect, "#ff0000"),
        )
        .with_id("l1");

        let value = serde_json::to_value(&layer).unwrap();
        assert_eq!(value["type"], "shape");
        assert_eq!(value["data"]["type"], "shape");
        assert_eq!(value["data"]["shapeType"], "rect");
        assert_eq!(value["transform"]["scaleX"], 1.0);
        assert!(value["data"].get("borderRadius").is_none());
    }

    #[test]
    fn test_mismatched_type_is_rejected() {
        let value = json!({
            "id": "l1",
            "type": "image",
            "name": "Oops",
            "visible": true,
            "locked": false,
            "opacity": 1.0,
            "transform": {
                "x": 0, "y": 0, "width": 10, "height": 10, "rotation": 0,
                "scaleX": 1, "scaleY": 1, "flipX": false, "flipY": false
            },
            "data": {
                "type": "shape", "shapeType": "circle", "fill": "#000",
                "stroke": "#000", "strokeWidth": 0
            }
        });
        let err = serde_json::from_value::<Layer>(value).unwrap_err();
        assert!(err.to_string().contains("has type image but shape data"));
    }

    #[test]
    fn test_font_weight_accepts_number_or_keyword() {
        let numeric: FontWeight = serde_json::from_value(json!(700)).unwrap();
        assert_eq!(numeric, FontWeight::Numeric(700));
        let keyword: FontWeight = serde_json::from_value(json!("bold")).unwrap();
        assert_eq!(keyword, FontWeight::Keyword("bold".to_string()));
    }

    #[test]
    fn test_image_crop_requires_all_fields() {
        let mut image = ImageData::new("data:,", 100, 80);
        assert_eq!(image.crop(), None);

        image.set_crop(Some(CropRect::new(10.0, 5.0, 50.0, 40.0)));
        assert_eq!(image.crop(), Some(CropRect::new(10.0, 5.0, 50.0, 40.0)));

        image.crop_height = None;
        assert_eq!(image.crop(), None);
    }

    #[test]
    fn test_crop_clamping() {
        let crop = CropRect::new(-5.0, 90.0, 500.0, 30.0).clamped_to(100.0, 100.0);
        assert_eq!(crop, CropRect::new(0.0, 90.0, 100.0, 10.0));
    }
}

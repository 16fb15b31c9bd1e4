//! Design document model
//!
//! The canonical, serializable representation of a design:
//! views of z-ordered layers, each with a transform and a typed payload.
//! The scene is only ever a projection of this model.

pub mod document;
pub mod layer;
pub mod transform;

pub use document::{Document, View, ViewId, DEFAULT_DOCUMENT_NAME, DOCUMENT_VERSION};
pub use layer::{
    generate_id, CropRect, FontStyle, FontWeight, ImageData, ImageFilter, Layer, LayerData,
    LayerId, LayerKind, LayerPatch, ShapeData, ShapeType, TextAlign, TextData,
};
pub use transform::{Transform, TransformPatch};

//! Scene layer
//!
//! Projects one view of the design document onto a render surface:
//! - `surface`: the [`RenderSurface`] abstraction and export encoding
//! - `memory`: a headless surface rasterized with tiny-skia
//! - `decode`: asynchronous image decoding
//! - `synchronizer`: keeps surface nodes in step with the document
//! - `command`: the [`SceneCommand`] contract

pub mod clip;
pub mod command;
pub mod decode;
pub mod memory;
pub mod node;
pub mod surface;
pub mod synchronizer;

pub use clip::ClipRegion;
pub use command::{FlipDirection, InteractionKind, SceneCommand};
pub use decode::{DataUrlDecoder, ImageDecoder};
pub use memory::{parse_color, MemorySurface};
pub use node::{Bitmap, NodeContent, NodeHandle, NodeProps, NodeRole, SceneNode};
pub use surface::{encode_raster, ExportedImage, RenderSurface};
pub use synchronizer::{
    CropApplied, CropSession, Interaction, ObjectModified, SceneCallbacks, SceneConfig,
    SceneState, SceneSynchronizer,
};

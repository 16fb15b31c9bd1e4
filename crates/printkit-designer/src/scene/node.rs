//! Scene nodes: what a render surface holds.

use std::sync::Arc;

use super::clip::ClipRegion;
use crate::model::{CropRect, ShapeData, TextData};
use crate::product::PrintableShape;

/// Opaque handle of a node inside a [`RenderSurface`](super::RenderSurface)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub u64);

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Decoded RGBA8 pixels (straight alpha)
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<Vec<u8>>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba: Arc::new(rgba),
        }
    }

    /// Uniformly colored bitmap
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat((width * height) as usize);
        Self::new(width, height, pixels)
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bitmap({}x{})", self.width, self.height)
    }
}

/// Role of a node within the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Mockup image or fallback fill
    Background,
    /// Printable-area outline
    Overlay,
    GridLine,
    /// Projection of a document layer
    Layer,
}

impl NodeRole {
    /// Fixed nodes always sit below every layer node
    pub fn is_fixed(&self) -> bool {
        !matches!(self, NodeRole::Layer)
    }
}

/// What a node draws, in its local (unscaled) coordinate space
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Image {
        bitmap: Bitmap,
        /// Source-pixel crop; the node shows only this part
        crop: Option<CropRect>,
    },
    Text(TextData),
    Shape(ShapeData),
    /// Solid color over the node box
    Fill { color: String },
    /// Printable-area outline; coordinates are local to the node
    Outline {
        shape: PrintableShape,
        color: String,
        dashed: bool,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: String,
        width: f64,
    },
}

/// Placement and interaction flags of a node.
///
/// The node occupies `width * scale_x` by `height * scale_y`, rotated by
/// `rotation` degrees about (`left`, `top`).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeProps {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub opacity: f64,
    pub visible: bool,
    pub selectable: bool,
    pub evented: bool,
    /// Included in exports
    pub exportable: bool,
    /// Clip in scene coordinates; owned by this node alone
    pub clip: Option<ClipRegion>,
}

impl NodeProps {
    /// Unscaled box at (`left`, `top`), visible and interactive
    pub fn at(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            opacity: 1.0,
            visible: true,
            selectable: true,
            evented: true,
            exportable: true,
            clip: None,
        }
    }

    /// Presentation-only: not selectable, not evented, not exported
    pub fn decoration(mut self) -> Self {
        self.selectable = false;
        self.evented = false;
        self.exportable = false;
        self
    }

    pub fn display_width(&self) -> f64 {
        self.width * self.scale_x
    }

    pub fn display_height(&self) -> f64 {
        self.height * self.scale_y
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub role: NodeRole,
    pub content: NodeContent,
    pub props: NodeProps,
}

impl SceneNode {
    pub fn new(role: NodeRole, content: NodeContent, props: NodeProps) -> Self {
        Self {
            role,
            content,
            props,
        }
    }

    /// Pixel size of the shown part of an image node
    pub fn intrinsic_size(&self) -> Option<(f64, f64)> {
        match &self.content {
            NodeContent::Image { bitmap, crop } => Some(match crop {
                Some(c) => (c.width, c.height),
                None => (f64::from(bitmap.width), f64::from(bitmap.height)),
            }),
            _ => None,
        }
    }
}

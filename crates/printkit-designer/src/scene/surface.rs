//! The render surface abstraction and export encoding.

use base64::Engine;
use image::{ImageFormat, RgbaImage};
use printkit_core::{ExportError, SceneError};
use printkit_settings::ExportFormat;
use std::io::Cursor;

use super::node::{NodeHandle, SceneNode};
use crate::geometry::Rect;

/// A mutable 2D scene of addressable, z-ordered nodes.
///
/// Index 0 is painted first. Handles stay valid until the node is removed
/// or the surface is cleared.
pub trait RenderSurface: Send {
    /// Canvas size in scene pixels
    fn set_size(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    /// Color painted behind every node
    fn set_background_color(&mut self, color: &str);

    fn background_color(&self) -> &str;

    /// Insert at `index` (clamped to the node count)
    fn insert(&mut self, index: usize, node: SceneNode) -> NodeHandle;

    fn remove(&mut self, handle: NodeHandle) -> Option<SceneNode>;

    fn node(&self, handle: NodeHandle) -> Option<&SceneNode>;

    fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut SceneNode>;

    fn index_of(&self, handle: NodeHandle) -> Option<usize>;

    /// Move an existing node to `index` (clamped). Returns false for unknown
    /// handles.
    fn move_to(&mut self, handle: NodeHandle, index: usize) -> bool;

    /// Node handles bottom to top
    fn order(&self) -> Vec<NodeHandle>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every node and reset the background color
    fn clear(&mut self);

    /// Schedule a repaint
    fn request_render(&mut self);

    /// Rasterize exportable nodes inside `region` at `multiplier` times the
    /// scene resolution. Uncovered pixels are transparent.
    fn rasterize(&self, region: Rect, multiplier: f64) -> Result<RgbaImage, SceneError>;
}

/// An encoded export of the printable area
#[derive(Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl ExportedImage {
    /// `data:` URL of the encoded bytes
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

impl std::fmt::Debug for ExportedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportedImage")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Encode a raster. PNG keeps transparency; JPEG is flattened onto white.
pub fn encode_raster(
    raster: &RgbaImage,
    format: ExportFormat,
    jpeg_quality: u8,
) -> Result<ExportedImage, ExportError> {
    let encode_err = |e: image::ImageError| ExportError::Encode {
        format: format.to_string(),
        reason: e.to_string(),
    };

    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => {
            raster
                .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                .map_err(encode_err)?;
        }
        ExportFormat::Jpeg => {
            let flattened = image::RgbImage::from_fn(raster.width(), raster.height(), |x, y| {
                let [r, g, b, a] = raster.get_pixel(x, y).0;
                let alpha = u16::from(a);
                let over_white = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
                image::Rgb([over_white(r), over_white(g), over_white(b)])
            });
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, jpeg_quality.clamp(1, 100))
                .encode_image(&flattened)
                .map_err(encode_err)?;
        }
    }

    Ok(ExportedImage {
        format,
        width: raster.width(),
        height: raster.height(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_keeps_alpha() {
        let raster = RgbaImage::from_pixel(4, 3, image::Rgba([255, 0, 0, 0]));
        let export = encode_raster(&raster, ExportFormat::Png, 90).unwrap();
        assert_eq!((export.width, export.height), (4, 3));

        let decoded = image::load_from_memory(&export.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
        assert!(export.data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_jpeg_flattens_onto_white() {
        let raster = RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 0, 0]));
        let export = encode_raster(&raster, ExportFormat::Jpeg, 95).unwrap();
        let decoded = image::load_from_memory(&export.bytes).unwrap().to_rgb8();
        assert!(decoded.get_pixel(4, 4).0.iter().all(|c| *c > 240));
    }
}

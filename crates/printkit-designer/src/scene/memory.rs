//! In-memory render surface rasterized with tiny-skia.
//!
//! Nodes live in an arena keyed by handle; a separate vector holds their
//! paint order. Nothing is drawn until [`RenderSurface::rasterize`] or
//! [`MemorySurface::render_preview`] is called.

use image::RgbaImage;
use printkit_core::SceneError;
use std::collections::HashMap;
use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, IntRect, Mask, Paint, Path, PathBuilder, Pixmap,
    PixmapPaint, Stroke, StrokeDash, Transform,
};

use super::clip::ClipRegion;
use super::node::{Bitmap, NodeContent, NodeHandle, SceneNode};
use super::surface::RenderSurface;
use crate::geometry::Rect;
use crate::model::{CropRect, ShapeType};
use crate::product::PrintableShape;

const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or `transparent`
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("transparent") || value.eq_ignore_ascii_case("none") {
        return Some(Color::TRANSPARENT);
    }
    let hex = value.strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    let (r, g, b, a) = match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            (digits.next()??, digits.next()??, digits.next()??, 255)
        }
        6 => (
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255,
        ),
        8 => (
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            channel(&hex[6..8])?,
        ),
        _ => return None,
    };
    Some(Color::from_rgba8(r, g, b, a))
}

fn paint_for(color: &str, opacity: f64) -> Option<Paint<'static>> {
    let mut color = parse_color(color)?;
    color.set_alpha(color.alpha() * opacity.clamp(0.0, 1.0) as f32);
    if color.alpha() <= 0.0 {
        return None;
    }
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    Some(paint)
}

fn rounded_rect(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Option<Path> {
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    if r <= 0.0 {
        return Some(PathBuilder::from_rect(tiny_skia::Rect::from_xywh(x, y, w, h)?));
    }
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

fn polygon(points: impl IntoIterator<Item = (f32, f32)>) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for (i, (x, y)) in points.into_iter().enumerate() {
        if i == 0 {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }
    pb.close();
    pb.finish()
}

fn clip_path(clip: &ClipRegion) -> Option<Path> {
    match clip {
        ClipRegion::Rect {
            x,
            y,
            width,
            height,
            radius,
        } => rounded_rect(*x as f32, *y as f32, *width as f32, *height as f32, *radius as f32),
        ClipRegion::Ellipse { cx, cy, rx, ry } => PathBuilder::from_oval(tiny_skia::Rect::from_xywh(
            (cx - rx) as f32,
            (cy - ry) as f32,
            (rx * 2.0) as f32,
            (ry * 2.0) as f32,
        )?),
        ClipRegion::Polygon { points } => polygon(points.iter().map(|p| (p.x as f32, p.y as f32))),
    }
}

fn shape_path(shape: ShapeType, w: f32, h: f32, radius: f32) -> Option<Path> {
    match shape {
        ShapeType::Rect => rounded_rect(0.0, 0.0, w, h, radius),
        ShapeType::Circle => PathBuilder::from_circle(w / 2.0, h / 2.0, w.min(h) / 2.0),
        ShapeType::Ellipse => PathBuilder::from_oval(tiny_skia::Rect::from_xywh(0.0, 0.0, w, h)?),
        ShapeType::Triangle => polygon([(w / 2.0, 0.0), (w, h), (0.0, h)]),
    }
}

fn bitmap_pixmap(bitmap: &Bitmap, crop: Option<CropRect>) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(bitmap.width, bitmap.height)?;
    for (dst, src) in pixmap
        .pixels_mut()
        .iter_mut()
        .zip(bitmap.rgba.chunks_exact(4))
    {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    match crop {
        Some(c) => {
            let c = c.clamped_to(f64::from(bitmap.width), f64::from(bitmap.height));
            pixmap.clone_rect(IntRect::from_xywh(
                c.x.round() as i32,
                c.y.round() as i32,
                c.width.round().max(1.0) as u32,
                c.height.round().max(1.0) as u32,
            )?)
        }
        None => Some(pixmap),
    }
}

/// Local-to-scene transform of a node: anchor, rotation, scale, then flips
fn node_transform(base: Transform, node: &SceneNode) -> Transform {
    let p = &node.props;
    let mut t = base
        .pre_translate(p.left as f32, p.top as f32)
        .pre_concat(Transform::from_rotate(p.rotation as f32))
        .pre_scale(p.scale_x as f32, p.scale_y as f32);
    if p.flip_x {
        t = t.pre_translate(p.width as f32, 0.0).pre_scale(-1.0, 1.0);
    }
    if p.flip_y {
        t = t.pre_translate(0.0, p.height as f32).pre_scale(1.0, -1.0);
    }
    t
}

fn draw_node(pixmap: &mut Pixmap, base: Transform, node: &SceneNode) {
    let props = &node.props;
    let mask = props.clip.as_ref().and_then(|clip| {
        let path = clip_path(clip)?;
        let mut mask = Mask::new(pixmap.width(), pixmap.height())?;
        mask.fill_path(&path, FillRule::Winding, true, base);
        Some(mask)
    });
    let mask = mask.as_ref();
    let transform = node_transform(base, node);
    let (w, h) = (props.width as f32, props.height as f32);

    match &node.content {
        NodeContent::Image { bitmap, crop } => {
            let Some(source) = bitmap_pixmap(bitmap, *crop) else {
                tracing::warn!("Skipping unrenderable {:?}", bitmap);
                return;
            };
            let paint = PixmapPaint {
                opacity: props.opacity.clamp(0.0, 1.0) as f32,
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            };
            let sx = if source.width() > 0 { w / source.width() as f32 } else { 1.0 };
            let sy = if source.height() > 0 { h / source.height() as f32 } else { 1.0 };
            pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform.pre_scale(sx, sy), mask);
        }
        NodeContent::Shape(shape) => {
            let Some(path) = shape_path(shape.shape_type, w, h, shape.border_radius.unwrap_or(0.0) as f32)
            else {
                return;
            };
            if let Some(paint) = paint_for(&shape.fill, props.opacity) {
                pixmap.fill_path(&path, &paint, FillRule::Winding, transform, mask);
            }
            if shape.stroke_width > 0.0 {
                if let Some(paint) = paint_for(&shape.stroke, props.opacity) {
                    let stroke = Stroke {
                        width: shape.stroke_width as f32,
                        ..Stroke::default()
                    };
                    pixmap.stroke_path(&path, &paint, &stroke, transform, mask);
                }
            }
        }
        NodeContent::Fill { color } => {
            let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, w, h) else {
                return;
            };
            if let Some(paint) = paint_for(color, props.opacity) {
                pixmap.fill_path(&PathBuilder::from_rect(rect), &paint, FillRule::Winding, transform, mask);
            }
        }
        NodeContent::Outline {
            shape,
            color,
            dashed,
        } => {
            let path = match shape {
                PrintableShape::Rect { border_radius } => {
                    rounded_rect(0.0, 0.0, w, h, border_radius.unwrap_or(0.0) as f32)
                }
                PrintableShape::Ellipse => {
                    tiny_skia::Rect::from_xywh(0.0, 0.0, w, h).and_then(PathBuilder::from_oval)
                }
                PrintableShape::Polygon { points } => polygon(
                    points
                        .iter()
                        .map(|p| ((p.x - props.left) as f32, (p.y - props.top) as f32)),
                ),
            };
            let (Some(path), Some(paint)) = (path, paint_for(color, props.opacity)) else {
                return;
            };
            let stroke = Stroke {
                width: 1.5,
                dash: if *dashed { StrokeDash::new(vec![8.0, 4.0], 0.0) } else { None },
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, transform, mask);
        }
        NodeContent::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            width,
        } => {
            let mut pb = PathBuilder::new();
            pb.move_to(*x1 as f32, *y1 as f32);
            pb.line_to(*x2 as f32, *y2 as f32);
            let (Some(path), Some(paint)) = (pb.finish(), paint_for(color, props.opacity)) else {
                return;
            };
            let stroke = Stroke {
                width: *width as f32,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, transform, mask);
        }
        // Glyph rasterization is left to the host surface.
        NodeContent::Text(_) => {}
    }
}

fn into_image(pixmap: Pixmap) -> Result<RgbaImage, SceneError> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut raw = Vec::with_capacity((width * height * 4) as usize);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        raw.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(width, height, raw).ok_or_else(|| SceneError::Raster {
        reason: "pixel buffer size mismatch".to_string(),
    })
}

/// Headless [`RenderSurface`]
#[derive(Debug)]
pub struct MemorySurface {
    nodes: HashMap<NodeHandle, SceneNode>,
    order: Vec<NodeHandle>,
    next_handle: u64,
    size: (u32, u32),
    background: String,
    render_count: u64,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            next_handle: 1,
            size: (0, 0),
            background: DEFAULT_BACKGROUND.to_string(),
            render_count: 0,
        }
    }

    /// Number of repaints requested so far
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Nodes bottom to top
    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.order.iter().filter_map(|h| self.nodes.get(h))
    }

    fn paint(&self, region: Rect, multiplier: f64, everything: bool) -> Result<RgbaImage, SceneError> {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(SceneError::Raster {
                reason: format!("invalid multiplier {}", multiplier),
            });
        }
        let width = (region.width * multiplier).round().max(1.0) as u32;
        let height = (region.height * multiplier).round().max(1.0) as u32;
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| SceneError::Raster {
            reason: format!("cannot allocate {}x{} raster", width, height),
        })?;

        if everything {
            if let Some(color) = parse_color(&self.background) {
                pixmap.fill(color);
            }
        }

        let base = Transform::from_scale(multiplier as f32, multiplier as f32)
            .pre_translate(-region.x as f32, -region.y as f32);

        for node in self.nodes() {
            if !node.props.visible || !(everything || node.props.exportable) {
                continue;
            }
            draw_node(&mut pixmap, base, node);
        }
        into_image(pixmap)
    }

    /// Everything visible, decorations and background included
    pub fn render_preview(&self) -> Result<RgbaImage, SceneError> {
        let (w, h) = self.size;
        self.paint(Rect::new(0.0, 0.0, f64::from(w), f64::from(h)), 1.0, true)
    }
}

impl RenderSurface for MemorySurface {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_background_color(&mut self, color: &str) {
        self.background = color.to_string();
    }

    fn background_color(&self) -> &str {
        &self.background
    }

    fn insert(&mut self, index: usize, node: SceneNode) -> NodeHandle {
        let handle = NodeHandle(self.next_handle);
        self.next_handle += 1;
        self.nodes.insert(handle, node);
        let index = index.min(self.order.len());
        self.order.insert(index, handle);
        handle
    }

    fn remove(&mut self, handle: NodeHandle) -> Option<SceneNode> {
        let node = self.nodes.remove(&handle)?;
        self.order.retain(|h| *h != handle);
        Some(node)
    }

    fn node(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.nodes.get(&handle)
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&handle)
    }

    fn index_of(&self, handle: NodeHandle) -> Option<usize> {
        self.order.iter().position(|h| *h == handle)
    }

    fn move_to(&mut self, handle: NodeHandle, index: usize) -> bool {
        let Some(current) = self.index_of(handle) else {
            return false;
        };
        self.order.remove(current);
        let index = index.min(self.order.len());
        self.order.insert(index, handle);
        true
    }

    fn order(&self) -> Vec<NodeHandle> {
        self.order.clone()
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
        self.background = DEFAULT_BACKGROUND.to_string();
    }

    fn request_render(&mut self) {
        self.render_count += 1;
    }

    fn rasterize(&self, region: Rect, multiplier: f64) -> Result<RgbaImage, SceneError> {
        self.paint(region, multiplier, false)
    }
}

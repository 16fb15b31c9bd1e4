//! Editing tools layered on the scene: crop sessions, grid and snapping,
//! selection and pointer interactions.

use super::*;
use super::layers::layer_props;
use crate::geometry::{constrain_to_area, snap_point, Position};
use crate::model::LayerData;
use crate::scene::command::InteractionKind;

/// Smallest scale a pointer drag may produce
const MIN_INTERACTIVE_SCALE: f64 = 0.01;

/// An image layer whose crop is being edited
#[derive(Debug, Clone, PartialEq)]
pub struct CropSession {
    pub layer_id: LayerId,
    /// Crop in effect when the session started
    pub original: Option<CropRect>,
    pub current: CropRect,
}

/// A pointer gesture in progress
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub layer_id: LayerId,
    pub kind: InteractionKind,
    start: Transform,
    origin: (f64, f64),
}

/// Placement of an image after its crop changes from `from` to `to`, keeping
/// the remaining pixels where they were on the canvas.
fn cropped_transform(transform: &Transform, from: CropRect, to: CropRect) -> Transform {
    let sx = transform.effective_width() / from.width;
    let sy = transform.effective_height() / from.height;

    let ox = if transform.flip_x {
        (from.x + from.width) - (to.x + to.width)
    } else {
        to.x - from.x
    };
    let oy = if transform.flip_y {
        (from.y + from.height) - (to.y + to.height)
    } else {
        to.y - from.y
    };
    let (dx, dy) = (ox * sx, oy * sy);
    let (sin, cos) = transform.rotation.to_radians().sin_cos();

    Transform {
        x: transform.x + dx * cos - dy * sin,
        y: transform.y + dx * sin + dy * cos,
        width: transform.width * to.width / from.width,
        height: transform.height * to.height / from.height,
        ..*transform
    }
}

impl<S: RenderSurface> SceneSynchronizer<S> {
    fn bitmap_size(&self, layer_id: &str) -> Option<(f64, f64)> {
        let node = self.layer_node(layer_id)?;
        match &node.content {
            NodeContent::Image { bitmap, .. } => {
                Some((f64::from(bitmap.width), f64::from(bitmap.height)))
            }
            _ => None,
        }
    }

    /// Crop currently applied to the layer, or the whole bitmap
    fn effective_crop(&self, layer_id: &str) -> Option<CropRect> {
        let (w, h) = self.bitmap_size(layer_id)?;
        let layer = self.layers.get(layer_id)?;
        Some(
            layer
                .data
                .as_image()
                .and_then(|image| image.crop())
                .unwrap_or(CropRect::new(0.0, 0.0, w, h)),
        )
    }

    pub fn crop_session(&self) -> Option<&CropSession> {
        self.crop.as_ref()
    }

    /// Start editing the crop of a shown image layer
    pub fn enter_crop(&mut self, layer_id: &str) -> bool {
        if !self.require_ready("enter_crop") {
            return false;
        }
        let Some(current) = self.effective_crop(layer_id) else {
            tracing::debug!("Layer {} cannot be cropped", layer_id);
            return false;
        };
        if self.crop.is_some() {
            self.cancel_crop();
        }
        let original = self
            .layers
            .get(layer_id)
            .and_then(|l| l.data.as_image())
            .and_then(|image| image.crop());
        self.crop = Some(CropSession {
            layer_id: layer_id.to_string(),
            original,
            current,
        });
        true
    }

    /// Preview a crop rectangle in source pixels. Returns the rectangle
    /// after clamping to the image.
    pub fn set_crop_rect(&mut self, rect: CropRect) -> Option<CropRect> {
        let layer_id = self.crop.as_ref()?.layer_id.clone();
        let (w, h) = self.bitmap_size(&layer_id)?;
        let from = self.effective_crop(&layer_id)?;
        let to = rect.clamped_to(w, h);

        let mut preview = self.layers.get(&layer_id)?.clone();
        preview.transform = cropped_transform(&preview.transform, from, to);
        if let LayerData::Image(image) = &mut preview.data {
            image.set_crop(Some(to));
        }

        let handle = self.nodes.get(&layer_id).copied()?;
        let clip = self.attachment.as_ref()?.clip.clone();
        let node = self.surface.node_mut(handle)?;
        if let NodeContent::Image { crop, .. } = &mut node.content {
            *crop = Some(to);
        }
        node.props = layer_props(&preview, node.intrinsic_size(), &clip);
        self.surface.request_render();

        if let Some(session) = self.crop.as_mut() {
            session.current = to;
        }
        Some(to)
    }

    /// Commit the session's rectangle and report it through the
    /// crop-applied callback
    pub fn apply_crop(&mut self) -> Option<CropApplied> {
        let session = self.crop.take()?;
        let from = self.effective_crop(&session.layer_id)?;
        let layer = self.layers.get_mut(&session.layer_id)?;
        layer.transform = cropped_transform(&layer.transform, from, session.current);
        if let LayerData::Image(image) = &mut layer.data {
            image.set_crop(Some(session.current));
        }
        let applied = CropApplied {
            layer_id: session.layer_id.clone(),
            crop: session.current,
            transform: layer.transform,
        };
        self.refresh_node(&session.layer_id);

        tracing::debug!("Crop applied to {}: {:?}", applied.layer_id, applied.crop);
        if let Some(callback) = &self.callbacks.on_crop_applied {
            callback(applied.clone());
        }
        Some(applied)
    }

    /// Abandon the session, restoring the previous crop
    pub fn cancel_crop(&mut self) {
        if let Some(session) = self.crop.take() {
            self.refresh_node(&session.layer_id);
        }
    }

    pub fn grid_enabled(&self) -> bool {
        self.grid_enabled
    }

    pub fn snap_enabled(&self) -> bool {
        self.snap_enabled
    }

    /// Show or hide grid lines over the printable area; returns the new flag
    pub fn toggle_grid(&mut self) -> bool {
        self.grid_enabled = !self.grid_enabled;
        if self.is_ready() {
            self.clear_grid();
            if self.grid_enabled {
                self.build_grid();
            }
            self.surface.request_render();
        }
        self.grid_enabled
    }

    /// Turn drag snapping on or off; returns the new flag
    pub fn toggle_snap(&mut self) -> bool {
        self.snap_enabled = !self.snap_enabled;
        self.snap_enabled
    }

    /// Position a dragged node: snap to the grid when enabled, then keep
    /// enough of it inside the printable area.
    pub fn constrain_during_drag(&mut self, layer_id: &str, left: f64, top: f64) -> Option<Position> {
        if !self.require_ready("constrain_during_drag") {
            return None;
        }
        let area = self.attachment.as_ref()?.view.printable_area.clone();
        let layer = self.layers.get_mut(layer_id)?;

        let target = if self.snap_enabled {
            snap_point(left, top, &area, self.config.grid_size)
        } else {
            Position { x: left, y: top }
        };
        let mut moved = layer.transform;
        moved.x = target.x;
        moved.y = target.y;
        let position = constrain_to_area(&moved, &area.bounds(), self.config.min_visible_fraction);

        layer.transform.x = position.x;
        layer.transform.y = position.y;
        self.refresh_node(layer_id);
        Some(position)
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Select a shown, unlocked layer
    pub fn select(&mut self, layer_id: &str) -> bool {
        if !self.require_ready("select") {
            return false;
        }
        let selectable = self
            .layer_node(layer_id)
            .is_some_and(|node| node.props.selectable);
        if selectable {
            self.set_selection(Some(layer_id.to_string()));
        }
        selectable
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(None);
    }

    pub(super) fn set_selection(&mut self, next: Option<LayerId>) {
        if self.selection == next {
            return;
        }
        self.selection = next.clone();
        if let Some(callback) = &self.callbacks.on_selection_changed {
            callback(next);
        }
    }

    /// Start a pointer gesture at (`x`, `y`) on a selectable layer
    pub fn begin_interaction(&mut self, layer_id: &str, kind: InteractionKind, x: f64, y: f64) -> bool {
        if !self.select(layer_id) {
            return false;
        }
        let Some(layer) = self.layers.get(layer_id) else {
            return false;
        };
        self.interaction = Some(Interaction {
            layer_id: layer_id.to_string(),
            kind,
            start: layer.transform,
            origin: (x, y),
        });
        true
    }

    /// Pointer moved to (`x`, `y`); returns the layer's live transform
    pub fn interact(&mut self, x: f64, y: f64) -> Option<Transform> {
        let interaction = self.interaction.clone()?;
        let start = interaction.start;
        let (ox, oy) = interaction.origin;
        let id = interaction.layer_id.as_str();

        match interaction.kind {
            InteractionKind::Move => {
                self.constrain_during_drag(id, start.x + (x - ox), start.y + (y - oy))?;
            }
            InteractionKind::Scale => {
                let before = (ox - start.x).hypot(oy - start.y);
                if before <= f64::EPSILON {
                    return None;
                }
                let factor = (x - start.x).hypot(y - start.y) / before;
                let layer = self.layers.get_mut(id)?;
                layer.transform.scale_x = (start.scale_x * factor).max(MIN_INTERACTIVE_SCALE);
                layer.transform.scale_y = (start.scale_y * factor).max(MIN_INTERACTIVE_SCALE);
                self.refresh_node(id);
            }
            InteractionKind::Rotate => {
                let from = (oy - start.y).atan2(ox - start.x);
                let to = (y - start.y).atan2(x - start.x);
                let layer = self.layers.get_mut(id)?;
                layer.transform.rotation = (start.rotation + (to - from).to_degrees()).rem_euclid(360.0);
                self.refresh_node(id);
            }
        }
        self.layers.get(id).map(|l| l.transform)
    }

    /// End the gesture and report the resulting transform through the
    /// object-modified callback
    pub fn finish_interaction(&mut self) -> Option<ObjectModified> {
        let interaction = self.interaction.take()?;
        let transform = self.layers.get(&interaction.layer_id)?.transform;
        let modified = ObjectModified {
            layer_id: interaction.layer_id,
            transform,
        };
        if let Some(callback) = &self.callbacks.on_object_modified {
            callback(modified.clone());
        }
        Some(modified)
    }
}

//! Layer operations (add, patch, duplicate, remove) for design state.

use printkit_core::DocumentError;

use super::DesignState;
use crate::geometry::{align, AlignAction};
use crate::model::{generate_id, CropRect, Layer, LayerData, LayerId, LayerPatch, TransformPatch};
use crate::product::PrintableArea;

/// Offset applied to duplicated layers
const DUPLICATE_OFFSET: f64 = 10.0;

fn checked_transform(layer: &Layer) -> Result<(), DocumentError> {
    layer
        .transform
        .check()
        .map_err(|reason| DocumentError::InvalidTransform {
            layer_id: layer.id.clone(),
            reason,
        })
}

impl DesignState {
    /// Append `layer` on top of the view's stack
    pub fn add_layer(&mut self, view_id: &str, mut layer: Layer) -> Result<LayerId, DocumentError> {
        if self.document.contains_layer(&layer.id) {
            return Err(DocumentError::DuplicateLayerId { layer_id: layer.id });
        }
        checked_transform(&layer)?;
        layer.opacity = layer.opacity.clamp(0.0, 1.0);

        let id = layer.id.clone();
        self.edit("add_layer", |doc| {
            doc.view_mut(view_id)?.layers.push(layer);
            Ok(())
        })?;
        Ok(id)
    }

    /// Shallow-merge `patch` into a layer
    pub fn update_layer(
        &mut self,
        view_id: &str,
        layer_id: &str,
        patch: LayerPatch,
    ) -> Result<(), DocumentError> {
        self.edit("update_layer", |doc| {
            let layer = doc.layer_mut(view_id, layer_id)?;
            if let Some(data) = &patch.data {
                if data.kind() != layer.kind() {
                    return Err(DocumentError::LayerKindMismatch {
                        layer_id: layer_id.to_string(),
                        expected: data.kind().to_string(),
                        actual: layer.kind().to_string(),
                    });
                }
            }

            if let Some(name) = patch.name {
                layer.name = name;
            }
            if let Some(visible) = patch.visible {
                layer.visible = visible;
            }
            if let Some(locked) = patch.locked {
                layer.locked = locked;
            }
            if let Some(opacity) = patch.opacity {
                layer.opacity = opacity.clamp(0.0, 1.0);
            }
            if let Some(transform) = &patch.transform {
                layer.transform.apply(transform);
                checked_transform(layer)?;
            }
            if let Some(data) = patch.data {
                layer.data = data;
            }
            Ok(())
        })
    }

    /// Merge the provided transform fields
    pub fn update_transform(
        &mut self,
        view_id: &str,
        layer_id: &str,
        patch: TransformPatch,
    ) -> Result<(), DocumentError> {
        self.update_layer(view_id, layer_id, LayerPatch::transform(patch))
    }

    /// Remove a layer, returning it
    pub fn remove_layer(&mut self, view_id: &str, layer_id: &str) -> Result<Layer, DocumentError> {
        self.edit("remove_layer", |doc| {
            let view = doc.view_mut(view_id)?;
            let index = view
                .index_of(layer_id)
                .ok_or_else(|| DocumentError::UnknownLayer {
                    view_id: view_id.to_string(),
                    layer_id: layer_id.to_string(),
                })?;
            Ok(view.layers.remove(index))
        })
    }

    pub fn rename_layer(
        &mut self,
        view_id: &str,
        layer_id: &str,
        name: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let name = name.into();
        self.edit("rename_layer", |doc| {
            doc.layer_mut(view_id, layer_id)?.name = name;
            Ok(())
        })
    }

    /// Copy a layer directly above itself, offset by 10 px, returning the
    /// new id.
    pub fn duplicate_layer(&mut self, view_id: &str, layer_id: &str) -> Result<LayerId, DocumentError> {
        self.edit("duplicate_layer", |doc| {
            let view = doc.view_mut(view_id)?;
            let index = view
                .index_of(layer_id)
                .ok_or_else(|| DocumentError::UnknownLayer {
                    view_id: view_id.to_string(),
                    layer_id: layer_id.to_string(),
                })?;

            let mut copy = view.layers[index].clone();
            copy.id = generate_id();
            copy.name = format!("{} (copy)", copy.name);
            copy.transform.x += DUPLICATE_OFFSET;
            copy.transform.y += DUPLICATE_OFFSET;
            let id = copy.id.clone();
            view.layers.insert(index + 1, copy);
            Ok(id)
        })
    }

    pub fn set_visibility(
        &mut self,
        view_id: &str,
        layer_id: &str,
        visible: bool,
    ) -> Result<(), DocumentError> {
        self.update_layer(view_id, layer_id, LayerPatch::visible(visible))
    }

    pub fn set_locked(&mut self, view_id: &str, layer_id: &str, locked: bool) -> Result<(), DocumentError> {
        self.update_layer(view_id, layer_id, LayerPatch::locked(locked))
    }

    /// Set opacity, clamped to `0.0..=1.0`
    pub fn set_opacity(&mut self, view_id: &str, layer_id: &str, opacity: f64) -> Result<(), DocumentError> {
        self.update_layer(view_id, layer_id, LayerPatch::opacity(opacity))
    }

    /// Toggle the horizontal flip
    pub fn flip_horizontal(&mut self, view_id: &str, layer_id: &str) -> Result<bool, DocumentError> {
        let flipped = !self.document.layer(view_id, layer_id)?.transform.flip_x;
        self.update_transform(
            view_id,
            layer_id,
            TransformPatch {
                flip_x: Some(flipped),
                ..TransformPatch::default()
            },
        )?;
        Ok(flipped)
    }

    /// Toggle the vertical flip
    pub fn flip_vertical(&mut self, view_id: &str, layer_id: &str) -> Result<bool, DocumentError> {
        let flipped = !self.document.layer(view_id, layer_id)?.transform.flip_y;
        self.update_transform(
            view_id,
            layer_id,
            TransformPatch {
                flip_y: Some(flipped),
                ..TransformPatch::default()
            },
        )?;
        Ok(flipped)
    }

    /// Align a layer within `area`, returning the new anchor
    pub fn align_layer(
        &mut self,
        view_id: &str,
        layer_id: &str,
        action: AlignAction,
        area: &PrintableArea,
    ) -> Result<(f64, f64), DocumentError> {
        let position = align(action, &self.document.layer(view_id, layer_id)?.transform, area);
        self.update_transform(view_id, layer_id, TransformPatch::position(position.x, position.y))?;
        Ok((position.x, position.y))
    }

    /// Store (or clear) the crop rectangle of an image layer
    pub fn apply_crop(
        &mut self,
        view_id: &str,
        layer_id: &str,
        crop: Option<CropRect>,
    ) -> Result<(), DocumentError> {
        self.edit("apply_crop", |doc| {
            let layer = doc.layer_mut(view_id, layer_id)?;
            match &mut layer.data {
                LayerData::Image(image) => {
                    image.set_crop(crop);
                    Ok(())
                }
                other => Err(DocumentError::LayerKindMismatch {
                    layer_id: layer_id.to_string(),
                    expected: "image".to_string(),
                    actual: other.kind().to_string(),
                }),
            }
        })
    }

    /// Point an image layer at new pixels of the same native size
    pub fn update_image_source(
        &mut self,
        view_id: &str,
        layer_id: &str,
        src: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let src = src.into();
        self.edit("update_image_source", |doc| {
            let layer = doc.layer_mut(view_id, layer_id)?;
            match &mut layer.data {
                LayerData::Image(image) => {
                    image.src = src;
                    Ok(())
                }
                other => Err(DocumentError::LayerKindMismatch {
                    layer_id: layer_id.to_string(),
                    expected: "image".to_string(),
                    actual: other.kind().to_string(),
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageData, ShapeData, ShapeType, TextData, Transform};
    use crate::product::{mug_template, tshirt_template};

    fn state() -> DesignState {
        let mut state = DesignState::new();
        state.initialize(&tshirt_template());
        state
    }

    fn text(id: &str) -> Layer {
        Layer::text(id, Transform::new(10.0, 20.0, 100.0, 40.0), TextData::new("Hi")).with_id(id)
    }

    #[test]
    fn test_duplicate_layer() {
        let mut state = state();
        state.add_layer("front", text("A")).unwrap();
        state.add_layer("front", text("B")).unwrap();

        let copy_id = state.duplicate_layer("front", "A").unwrap();
        let view = &state.document().views["front"];
        assert_eq!(view.layer_ids(), ["A", copy_id.as_str(), "B"]);
        let copy = view.layer(&copy_id).unwrap();
        assert_eq!(copy.name, "A (copy)");
        assert_eq!((copy.transform.x, copy.transform.y), (20.0, 30.0));
    }

    #[test]
    fn test_update_layer_rejects_kind_change() {
        let mut state = state();
        state.add_layer("front", text("A")).unwrap();
        let err = state
            .update_layer(
                "front",
                "A",
                LayerPatch::data(LayerData::Shape(ShapeData::new(ShapeType::Rect, "#fff"))),
            )
            .unwrap_err();
        assert!(matches!(err, DocumentError::LayerKindMismatch { .. }));
    }

    #[test]
    fn test_transform_patch_is_validated() {
        let mut state = state();
        state.add_layer("front", text("A")).unwrap();
        state
            .update_transform("front", "A", TransformPatch::position(5.0, 6.0))
            .unwrap();
        let err = state
            .update_transform(
                "front",
                "A",
                TransformPatch {
                    scale_x: Some(0.0),
                    ..TransformPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidTransform { .. }));
        let t = state.document().layer("front", "A").unwrap().transform;
        assert_eq!((t.x, t.y, t.scale_x), (5.0, 6.0, 1.0));
    }

    #[test]
    fn test_unknown_ids() {
        let mut state = state();
        assert!(matches!(
            state.remove_layer("front", "nope"),
            Err(DocumentError::UnknownLayer { .. })
        ));
        assert!(matches!(
            state.add_layer("side", text("A")),
            Err(DocumentError::UnknownView { .. })
        ));
    }

    #[test]
    fn test_flip_toggles_and_opacity_clamps() {
        let mut state = state();
        state.add_layer("front", text("A")).unwrap();
        assert!(state.flip_horizontal("front", "A").unwrap());
        assert!(!state.flip_horizontal("front", "A").unwrap());
        assert!(state.flip_vertical("front", "A").unwrap());

        state.set_opacity("front", "A", 1.7).unwrap();
        assert_eq!(state.document().layer("front", "A").unwrap().opacity, 1.0);
    }

    #[test]
    fn test_align_layer() {
        let mut state = DesignState::new();
        let template = mug_template();
        state.initialize(&template);
        state.add_layer("wrap", text("A")).unwrap();

        let area = &template.views[0].printable_area;
        let (x, _) = state
            .align_layer("wrap", "A", AlignAction::Right, area)
            .unwrap();
        assert_eq!(x, 700.0);
    }

    #[test]
    fn test_crop_only_on_images() {
        let mut state = state();
        let image = Layer::image(
            "Photo",
            Transform::default(),
            ImageData::new("data:,", 400, 300),
        )
        .with_id("img");
        state.add_layer("front", image).unwrap();
        state.add_layer("front", text("T")).unwrap();

        let crop = CropRect::new(10.0, 10.0, 100.0, 80.0);
        state.apply_crop("front", "img", Some(crop)).unwrap();
        let layer = state.document().layer("front", "img").unwrap();
        assert_eq!(layer.data.as_image().unwrap().crop(), Some(crop));
        assert!(state.apply_crop("front", "T", Some(crop)).is_err());

        state.update_image_source("front", "img", "data:image/png;base64,AAAA").unwrap();
        let image = state.document().layer("front", "img").unwrap().data.as_image().cloned();
        assert_eq!(image.map(|i| i.src), Some("data:image/png;base64,AAAA".to_string()));
    }
}

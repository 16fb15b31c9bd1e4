//! Layer nodes: insertion, property sync, ordering and reconciliation.

use super::*;
use crate::model::{LayerData, TransformPatch, View};

/// Node placement for `layer`; image nodes are scaled from their intrinsic
/// pixel size to the layer's displayed size.
pub(super) fn layer_props(layer: &Layer, intrinsic: Option<(f64, f64)>, clip: &ClipRegion) -> NodeProps {
    let t = &layer.transform;
    let mut props = NodeProps::at(t.x, t.y, t.width, t.height);
    match intrinsic {
        Some((w, h)) if w > 0.0 && h > 0.0 => {
            props.width = w;
            props.height = h;
            props.scale_x = t.effective_width() / w;
            props.scale_y = t.effective_height() / h;
        }
        _ => {
            props.scale_x = t.scale_x;
            props.scale_y = t.scale_y;
        }
    }
    props.rotation = t.rotation;
    props.flip_x = t.flip_x;
    props.flip_y = t.flip_y;
    props.opacity = layer.opacity;
    props.visible = layer.visible;
    props.selectable = !layer.locked;
    props.evented = !layer.locked;
    props.clip = Some(clip.clone());
    props
}

impl<S: RenderSurface> SceneSynchronizer<S> {
    /// Show `layer` and select it. Image layers appear once their source
    /// has decoded.
    pub fn add_layer(&mut self, layer: &Layer) {
        if self.require_ready("add_layer") {
            self.insert_layer(layer, true);
        }
    }

    pub(super) fn insert_layer(&mut self, layer: &Layer, select: bool) {
        if self.nodes.contains_key(&layer.id) || self.pending.contains_key(&layer.id) {
            tracing::debug!("Layer {} already in scene", layer.id);
            return;
        }
        self.layers.insert(layer.id.clone(), layer.clone());
        if !self.desired_order.contains(&layer.id) {
            self.desired_order.push(layer.id.clone());
        }

        match &layer.data {
            LayerData::Image(image) => {
                let ticket = self.take_ticket();
                self.pending
                    .insert(layer.id.clone(), PendingDecode { ticket, select });
                self.spawn_decode(
                    image.src.clone(),
                    DecodeTarget::Layer {
                        layer_id: layer.id.clone(),
                        ticket,
                    },
                );
            }
            LayerData::Text(text) => {
                self.insert_node(layer, NodeContent::Text(text.clone()), select)
            }
            LayerData::Shape(shape) => {
                self.insert_node(layer, NodeContent::Shape(shape.clone()), select)
            }
        }
    }

    pub(super) fn insert_image_node(&mut self, layer_id: &str, bitmap: Bitmap, select: bool) {
        let Some(layer) = self.layers.get(layer_id).cloned() else {
            return;
        };
        if self.nodes.contains_key(layer_id) {
            return;
        }
        let crop = layer.data.as_image().and_then(|image| image.crop());
        self.insert_node(&layer, NodeContent::Image { bitmap, crop }, select);
    }

    fn insert_node(&mut self, layer: &Layer, content: NodeContent, select: bool) {
        let Some(attachment) = &self.attachment else {
            return;
        };
        let mut node = SceneNode::new(
            NodeRole::Layer,
            content,
            NodeProps::at(0.0, 0.0, 0.0, 0.0),
        );
        node.props = layer_props(layer, node.intrinsic_size(), &attachment.clip);

        let index = self.insertion_index(&layer.id);
        let handle = self.surface.insert(index, node);
        self.nodes.insert(layer.id.clone(), handle);
        self.owners.insert(handle, layer.id.clone());
        tracing::debug!("Layer {} shown as {} at {}", layer.id, handle, index);

        if select && !layer.locked {
            self.set_selection(Some(layer.id.clone()));
        }
        self.surface.request_render();
    }

    /// Surface index for a new node: just above every shown layer that
    /// precedes it in the desired order.
    fn insertion_index(&self, layer_id: &str) -> usize {
        let below = self
            .desired_order
            .iter()
            .take_while(|id| id.as_str() != layer_id)
            .filter(|id| self.nodes.contains_key(id.as_str()))
            .count();
        self.fixed.count() + below
    }

    pub(super) fn swap_bitmap(&mut self, layer_id: &str, bitmap: Bitmap) {
        let Some(handle) = self.nodes.get(layer_id).copied() else {
            return;
        };
        if let Some(node) = self.surface.node_mut(handle) {
            if let NodeContent::Image { bitmap: current, .. } = &mut node.content {
                *current = bitmap;
            }
        }
        self.refresh_node(layer_id);
    }

    /// Re-derive a node's content flags and placement from the mirrored layer
    pub(super) fn refresh_node(&mut self, layer_id: &str) {
        let (Some(layer), Some(handle), Some(attachment)) = (
            self.layers.get(layer_id),
            self.nodes.get(layer_id).copied(),
            &self.attachment,
        ) else {
            return;
        };
        let Some(node) = self.surface.node_mut(handle) else {
            return;
        };

        match (&mut node.content, &layer.data) {
            (NodeContent::Image { crop, .. }, LayerData::Image(image)) => *crop = image.crop(),
            (NodeContent::Text(current), LayerData::Text(text)) => *current = text.clone(),
            (NodeContent::Shape(current), LayerData::Shape(shape)) => *current = shape.clone(),
            _ => {}
        }
        node.props = layer_props(layer, node.intrinsic_size(), &attachment.clip);
        self.surface.request_render();
    }

    /// Drop a layer's node and discard any decode still running for it
    pub fn remove_layer(&mut self, layer_id: &str) -> bool {
        if !self.require_ready("remove_layer") {
            return false;
        }
        self.drop_layer(layer_id)
    }

    fn drop_layer(&mut self, layer_id: &str) -> bool {
        let was_pending = self.pending.remove(layer_id).is_some();
        let known = self.layers.remove(layer_id).is_some();
        self.desired_order.retain(|id| id != layer_id);

        if let Some(handle) = self.nodes.remove(layer_id) {
            self.owners.remove(&handle);
            self.surface.remove(handle);
            self.surface.request_render();
        }
        if self.selection.as_deref() == Some(layer_id) {
            self.set_selection(None);
        }
        if self.crop.as_ref().is_some_and(|c| c.layer_id == layer_id) {
            self.crop = None;
        }
        if self.interaction.as_ref().is_some_and(|i| i.layer_id == layer_id) {
            self.interaction = None;
        }
        known || was_pending
    }

    /// Merge `patch` into the layer's placement. Unknown layers are ignored.
    pub fn update_transform(&mut self, layer_id: &str, patch: &TransformPatch) {
        if !self.require_ready("update_transform") {
            return;
        }
        let Some(layer) = self.layers.get_mut(layer_id) else {
            return;
        };
        layer.transform.apply(patch);
        self.refresh_node(layer_id);
    }

    /// Restack layer nodes directly above the fixed nodes in exactly the
    /// order of `ids`
    pub fn reorder(&mut self, ids: &[LayerId]) {
        if !self.require_ready("reorder") {
            return;
        }
        let mut order: Vec<LayerId> = ids
            .iter()
            .filter(|id| self.layers.contains_key(id.as_str()))
            .cloned()
            .collect();
        for id in &self.desired_order {
            if !order.contains(id) {
                order.push(id.clone());
            }
        }
        self.desired_order = order;

        let base = self.fixed.count();
        let shown: Vec<NodeHandle> = self
            .desired_order
            .iter()
            .filter_map(|id| self.nodes.get(id).copied())
            .collect();
        for (offset, handle) in shown.into_iter().enumerate() {
            self.surface.move_to(handle, base + offset);
        }
        self.surface.request_render();
    }

    fn update_layer(&mut self, operation: &str, layer_id: &str, f: impl FnOnce(&mut Layer)) -> bool {
        if !self.require_ready(operation) {
            return false;
        }
        let Some(layer) = self.layers.get_mut(layer_id) else {
            return false;
        };
        f(layer);
        self.refresh_node(layer_id);
        true
    }

    pub fn set_visibility(&mut self, layer_id: &str, visible: bool) {
        self.update_layer("set_visibility", layer_id, |l| l.visible = visible);
    }

    /// Locked nodes can be neither selected nor interacted with
    pub fn set_locked(&mut self, layer_id: &str, locked: bool) {
        if self.update_layer("set_locked", layer_id, |l| l.locked = locked)
            && locked
            && self.selection.as_deref() == Some(layer_id)
        {
            self.set_selection(None);
        }
    }

    pub fn set_opacity(&mut self, layer_id: &str, opacity: f64) {
        let opacity = opacity.clamp(0.0, 1.0);
        self.update_layer("set_opacity", layer_id, |l| l.opacity = opacity);
    }

    /// Toggle the horizontal flip; returns the new flag
    pub fn flip_horizontal(&mut self, layer_id: &str) -> Option<bool> {
        self.update_layer("flip_horizontal", layer_id, |l| {
            l.transform.flip_x = !l.transform.flip_x
        });
        self.layers.get(layer_id).map(|l| l.transform.flip_x)
    }

    /// Toggle the vertical flip; returns the new flag
    pub fn flip_vertical(&mut self, layer_id: &str) -> Option<bool> {
        self.update_layer("flip_vertical", layer_id, |l| {
            l.transform.flip_y = !l.transform.flip_y
        });
        self.layers.get(layer_id).map(|l| l.transform.flip_y)
    }

    /// Decode `src` and swap it into the layer's node, keeping its
    /// displayed size
    pub fn update_image_source(&mut self, layer_id: &str, src: &str) {
        if !self.require_ready("update_image_source") {
            return;
        }
        let Some(layer) = self.layers.get_mut(layer_id) else {
            return;
        };
        let LayerData::Image(image) = &mut layer.data else {
            tracing::warn!("Layer {} has no image source", layer_id);
            return;
        };
        image.src = src.to_string();

        let shown = self.nodes.contains_key(layer_id);
        let select = self.pending.get(layer_id).is_some_and(|p| p.select);
        let ticket = self.take_ticket();
        self.pending
            .insert(layer_id.to_string(), PendingDecode { ticket, select });
        let target = if shown {
            DecodeTarget::Source {
                layer_id: layer_id.to_string(),
                ticket,
            }
        } else {
            DecodeTarget::Layer {
                layer_id: layer_id.to_string(),
                ticket,
            }
        };
        self.spawn_decode(src.to_string(), target);
    }

    /// Make the scene match `view`: the document wins
    pub fn reconcile(&mut self, view: &View) {
        if !self.require_ready("reconcile") {
            return;
        }
        let stale: Vec<LayerId> = self
            .layers
            .keys()
            .filter(|id| view.layer(id).is_none())
            .cloned()
            .collect();
        for id in stale {
            self.drop_layer(&id);
        }

        self.desired_order = view.layer_ids();
        for layer in &view.layers {
            let Some(known) = self.layers.get(&layer.id) else {
                self.insert_layer(layer, false);
                continue;
            };
            if known == layer {
                continue;
            }
            let old_src = known.data.as_image().map(|i| i.src.clone());
            let new_src = layer.data.as_image().map(|i| i.src.clone());
            let kind_changed = known.kind() != layer.kind();

            if kind_changed {
                self.drop_layer(&layer.id);
                self.desired_order = view.layer_ids();
                self.insert_layer(layer, false);
                continue;
            }
            self.layers.insert(layer.id.clone(), layer.clone());
            match (old_src, new_src) {
                (Some(old), Some(new)) if old != new => self.update_image_source(&layer.id, &new),
                _ => self.refresh_node(&layer.id),
            }
        }
        self.reorder(&view.layer_ids());
        tracing::debug!("Scene reconciled with view {}", view.view_id);
    }

    /// Replace every layer node with the layers of `view`
    pub fn load_view(&mut self, view: &View) {
        if !self.require_ready("load_view") {
            return;
        }
        let ids: Vec<LayerId> = self.layers.keys().cloned().collect();
        for id in ids {
            self.drop_layer(&id);
        }
        self.desired_order = view.layer_ids();
        for layer in &view.layers {
            self.insert_layer(layer, false);
        }
        tracing::debug!(
            "Loaded {} layers of view {} into scene",
            view.layers.len(),
            view.view_id
        );
    }

    /// Node showing `layer_id`, if it has been inserted
    pub fn layer_node(&self, layer_id: &str) -> Option<&SceneNode> {
        self.nodes
            .get(layer_id)
            .and_then(|handle| self.surface.node(*handle))
    }

    /// Shown layers, bottom to top
    pub fn layer_order(&self) -> Vec<LayerId> {
        self.surface
            .order()
            .into_iter()
            .filter_map(|handle| self.owners.get(&handle).cloned())
            .collect()
    }

    /// Whether an image decode for the layer is still outstanding
    pub fn is_pending(&self, layer_id: &str) -> bool {
        self.pending.contains_key(layer_id)
    }

    /// The scene's copy of a layer
    pub fn layer(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.get(layer_id)
    }
}

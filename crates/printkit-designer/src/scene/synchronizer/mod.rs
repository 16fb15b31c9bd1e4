//! Keeps a render surface in step with one view of the document.
//!
//! The synchronizer owns the surface. Document changes arrive as method
//! calls or [`SceneCommand`]s; user interactions leave through
//! [`SceneCallbacks`]. Image decoding runs on tokio tasks whose completions
//! are applied on the owning thread by [`SceneSynchronizer::pump`] or
//! [`SceneSynchronizer::settle`].
//!
//! This module is split into submodules:
//! - `layers`: layer nodes, reorders and reconciliation
//! - `tools`: crop sessions, grid, snapping, selection and interactions

mod layers;
mod tools;

use printkit_core::{DataCallback, SceneError};
use printkit_settings::{Config, ExportFormat};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::clip::ClipRegion;
use super::command::{FlipDirection, SceneCommand};
use super::decode::{describe_src, ImageDecoder};
use super::node::{Bitmap, NodeContent, NodeHandle, NodeProps, NodeRole, SceneNode};
use super::surface::{encode_raster, ExportedImage, RenderSurface};
use crate::model::{CropRect, Layer, LayerId, Transform};
use crate::product::{PrintableShape, ProductTemplate, ProductView};

pub use tools::{CropSession, Interaction};

const OVERLAY_COLOR: &str = "#3b82f6";
const GRID_COLOR: &str = "#d1d5db";
const GRID_LINE_WIDTH: f64 = 0.5;

/// Lifecycle of the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneState {
    #[default]
    Uninitialized,
    /// Attached; the mockup is still decoding
    Loading,
    Ready,
}

impl std::fmt::Display for SceneState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Loading => write!(f, "loading"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

/// Display tuning for the scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub grid_size: f64,
    pub show_grid: bool,
    pub snap_to_grid: bool,
    pub show_printable_area: bool,
    pub canvas_background: String,
    pub fallback_background: String,
    /// Fraction of a dragged node that stays inside the printable area
    pub min_visible_fraction: f64,
    pub jpeg_quality: u8,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SceneConfig {
    fn from(config: &Config) -> Self {
        Self {
            grid_size: config.editor.grid_size,
            show_grid: config.editor.show_grid,
            snap_to_grid: config.editor.snap_to_grid,
            show_printable_area: config.editor.show_printable_area,
            canvas_background: config.editor.canvas_background.clone(),
            fallback_background: config.editor.fallback_background.clone(),
            min_visible_fraction: config.validation.min_visible_fraction,
            jpeg_quality: config.export.jpeg_quality,
        }
    }
}

/// A node was moved, scaled or rotated by the user
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectModified {
    pub layer_id: LayerId,
    pub transform: Transform,
}

/// A crop session was committed
#[derive(Debug, Clone, PartialEq)]
pub struct CropApplied {
    pub layer_id: LayerId,
    pub crop: CropRect,
    /// Placement that keeps the remaining pixels where they were
    pub transform: Transform,
}

/// Outbound notifications
#[derive(Default)]
pub struct SceneCallbacks {
    pub on_object_modified: Option<DataCallback<ObjectModified>>,
    pub on_selection_changed: Option<DataCallback<Option<LayerId>>>,
    pub on_crop_applied: Option<DataCallback<CropApplied>>,
}

impl SceneCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_object_modified(mut self, f: impl Fn(ObjectModified) + Send + Sync + 'static) -> Self {
        self.on_object_modified = Some(Box::new(f));
        self
    }

    pub fn on_selection_changed(
        mut self,
        f: impl Fn(Option<LayerId>) + Send + Sync + 'static,
    ) -> Self {
        self.on_selection_changed = Some(Box::new(f));
        self
    }

    pub fn on_crop_applied(mut self, f: impl Fn(CropApplied) + Send + Sync + 'static) -> Self {
        self.on_crop_applied = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for SceneCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneCallbacks")
            .field("on_object_modified", &self.on_object_modified.is_some())
            .field("on_selection_changed", &self.on_selection_changed.is_some())
            .field("on_crop_applied", &self.on_crop_applied.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum DecodeTarget {
    Mockup,
    /// First insertion of a layer node
    Layer { layer_id: LayerId, ticket: u64 },
    /// New pixels for an existing node
    Source { layer_id: LayerId, ticket: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingDecode {
    ticket: u64,
    /// Select the node once it is inserted
    select: bool,
}

#[derive(Debug)]
struct DecodeCompletion {
    generation: u64,
    target: DecodeTarget,
    result: Result<Bitmap, SceneError>,
}

#[derive(Debug, Default)]
struct FixedNodes {
    background: Option<NodeHandle>,
    overlay: Option<NodeHandle>,
    grid: Vec<NodeHandle>,
}

impl FixedNodes {
    fn count(&self) -> usize {
        usize::from(self.background.is_some()) + usize::from(self.overlay.is_some()) + self.grid.len()
    }
}

/// The view a scene is attached to
#[derive(Debug, Clone)]
struct Attachment {
    template_id: String,
    view: ProductView,
    clip: ClipRegion,
}

/// Projection of one document view onto a [`RenderSurface`]
pub struct SceneSynchronizer<S: RenderSurface> {
    surface: S,
    decoder: Arc<dyn ImageDecoder>,
    config: SceneConfig,
    state: SceneState,
    attachment: Option<Attachment>,
    callbacks: SceneCallbacks,

    generation: u64,
    next_ticket: u64,
    completions_tx: mpsc::UnboundedSender<DecodeCompletion>,
    completions_rx: mpsc::UnboundedReceiver<DecodeCompletion>,
    in_flight: usize,
    tasks: Vec<JoinHandle<()>>,

    /// Last known state of every layer shown or pending
    layers: HashMap<LayerId, Layer>,
    nodes: HashMap<LayerId, NodeHandle>,
    owners: HashMap<NodeHandle, LayerId>,
    pending: HashMap<LayerId, PendingDecode>,
    desired_order: Vec<LayerId>,
    fixed: FixedNodes,

    grid_enabled: bool,
    snap_enabled: bool,
    selection: Option<LayerId>,
    crop: Option<CropSession>,
    interaction: Option<Interaction>,
}

impl<S: RenderSurface> SceneSynchronizer<S> {
    pub fn new(surface: S, decoder: Arc<dyn ImageDecoder>, config: SceneConfig) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            surface,
            decoder,
            grid_enabled: config.show_grid,
            snap_enabled: config.snap_to_grid,
            config,
            state: SceneState::Uninitialized,
            attachment: None,
            callbacks: SceneCallbacks::default(),
            generation: 0,
            next_ticket: 0,
            completions_tx,
            completions_rx,
            in_flight: 0,
            tasks: Vec::new(),
            layers: HashMap::new(),
            nodes: HashMap::new(),
            owners: HashMap::new(),
            pending: HashMap::new(),
            desired_order: Vec::new(),
            fixed: FixedNodes::default(),
            selection: None,
            crop: None,
            interaction: None,
        }
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SceneState::Ready
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Template and view ids of the current attachment
    pub fn attached_to(&self) -> Option<(&str, &str)> {
        self.attachment
            .as_ref()
            .map(|a| (a.template_id.as_str(), a.view.id.as_str()))
    }

    /// Decodes started and not yet applied
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Attach to `view_id` of `template`, tearing down any previous scene.
    ///
    /// Must be called inside a tokio runtime. The scene stays `Loading`
    /// until the mockup decode completes and is applied.
    pub fn attach(
        &mut self,
        template: &ProductTemplate,
        view_id: &str,
        callbacks: SceneCallbacks,
    ) -> Result<(), SceneError> {
        let view = template
            .view(view_id)
            .ok_or_else(|| SceneError::UnknownView {
                template_id: template.id.clone(),
                view_id: view_id.to_string(),
            })?
            .clone();

        self.detach();
        self.generation += 1;
        self.callbacks = callbacks;
        self.state = SceneState::Loading;

        self.surface
            .set_size(view.mockup_width.round() as u32, view.mockup_height.round() as u32);
        self.surface.set_background_color(&self.config.canvas_background);

        tracing::debug!(
            "Attaching scene to {}/{} (generation {})",
            template.id,
            view.id,
            self.generation
        );
        let src = view.mockup_image_url.clone();
        self.attachment = Some(Attachment {
            template_id: template.id.clone(),
            clip: ClipRegion::from_area(&view.printable_area),
            view,
        });
        self.spawn_decode(src, DecodeTarget::Mockup);
        self.surface.request_render();
        Ok(())
    }

    /// Release every node and pending task. Safe to call in any state.
    pub fn detach(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.completions_tx = tx;
        self.completions_rx = rx;
        self.in_flight = 0;

        self.surface.clear();
        self.layers.clear();
        self.nodes.clear();
        self.owners.clear();
        self.pending.clear();
        self.desired_order.clear();
        self.fixed = FixedNodes::default();
        self.selection = None;
        self.crop = None;
        self.interaction = None;
        self.attachment = None;
        self.callbacks = SceneCallbacks::default();
        if self.state != SceneState::Uninitialized {
            tracing::debug!("Scene detached");
        }
        self.state = SceneState::Uninitialized;
    }

    /// Apply decode completions that have already arrived. Returns how many
    /// were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.apply_completion(completion);
            applied += 1;
        }
        self.tasks.retain(|t| !t.is_finished());
        applied
    }

    /// Wait for every outstanding decode and apply it
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.completions_rx.recv().await {
                Some(completion) => {
                    self.in_flight -= 1;
                    self.apply_completion(completion);
                }
                None => break,
            }
        }
        self.tasks.retain(|t| !t.is_finished());
    }

    /// Apply one command. Only `ExportRequested` produces output.
    pub fn dispatch(&mut self, command: SceneCommand) -> printkit_core::Result<Option<ExportedImage>> {
        tracing::debug!("Scene command {}", command.name());
        match command {
            SceneCommand::LayerAdded(layer) => self.add_layer(&layer),
            SceneCommand::LayersReordered(ids) => self.reorder(&ids),
            SceneCommand::LayerTransformChanged {
                layer_id,
                transform,
            } => self.update_transform(&layer_id, &transform),
            SceneCommand::LayerFlip {
                layer_id,
                direction,
            } => {
                match direction {
                    FlipDirection::Horizontal => self.flip_horizontal(&layer_id),
                    FlipDirection::Vertical => self.flip_vertical(&layer_id),
                };
            }
            SceneCommand::ImageSourceUpdated { layer_id, src } => {
                self.update_image_source(&layer_id, &src)
            }
            SceneCommand::EnterCrop { layer_id } => {
                self.enter_crop(&layer_id);
            }
            SceneCommand::ApplyCrop => {
                self.apply_crop();
            }
            SceneCommand::CancelCrop => self.cancel_crop(),
            SceneCommand::ToggleGrid => {
                self.toggle_grid();
            }
            SceneCommand::ToggleSnap => {
                self.toggle_snap();
            }
            SceneCommand::ExportRequested { format, multiplier } => {
                return self.export_region(format, multiplier).map(Some);
            }
        }
        Ok(None)
    }

    /// Rasterize the printable-area rectangle. Decorations (mockup, outline,
    /// grid) are left out.
    pub fn export_region(
        &self,
        format: ExportFormat,
        multiplier: f64,
    ) -> printkit_core::Result<ExportedImage> {
        let attachment = match (&self.attachment, self.state) {
            (Some(attachment), SceneState::Ready) => attachment,
            _ => return Err(SceneError::NotReady.into()),
        };
        let region = attachment.view.printable_area.bounds();
        let raster = self.surface.rasterize(region, multiplier)?;
        let image = encode_raster(&raster, format, self.config.jpeg_quality)?;
        tracing::info!(
            "Exported {} view as {} ({}x{})",
            attachment.view.id,
            format,
            image.width,
            image.height
        );
        Ok(image)
    }

    fn spawn_decode(&mut self, src: String, target: DecodeTarget) {
        let decoder = Arc::clone(&self.decoder);
        let tx = self.completions_tx.clone();
        let generation = self.generation;
        self.in_flight += 1;
        self.tasks.push(tokio::spawn(async move {
            let result = decoder.decode(&src).await;
            tx.send(DecodeCompletion {
                generation,
                target,
                result,
            })
            .ok();
        }));
    }

    fn take_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    fn apply_completion(&mut self, completion: DecodeCompletion) {
        if completion.generation != self.generation {
            tracing::debug!("Dropping decode from stale generation {}", completion.generation);
            return;
        }
        match completion.target {
            DecodeTarget::Mockup => self.finish_loading(completion.result),
            DecodeTarget::Layer { layer_id, ticket } => {
                let Some(pending) = self.pending.get(&layer_id).copied() else {
                    return;
                };
                if pending.ticket != ticket {
                    return;
                }
                self.pending.remove(&layer_id);
                match completion.result {
                    Ok(bitmap) => self.insert_image_node(&layer_id, bitmap, pending.select),
                    Err(err) => tracing::warn!("Layer {} not shown: {}", layer_id, err),
                }
            }
            DecodeTarget::Source { layer_id, ticket } => {
                if self.pending.get(&layer_id).map(|p| p.ticket) != Some(ticket) {
                    return;
                }
                self.pending.remove(&layer_id);
                match completion.result {
                    Ok(bitmap) => self.swap_bitmap(&layer_id, bitmap),
                    Err(err) => tracing::warn!("Keeping old pixels for {}: {}", layer_id, err),
                }
            }
        }
    }

    fn finish_loading(&mut self, result: Result<Bitmap, SceneError>) {
        let Some(attachment) = self.attachment.clone() else {
            return;
        };
        let view = &attachment.view;

        let background = match result {
            Ok(bitmap) => {
                let mut props = NodeProps::at(
                    0.0,
                    0.0,
                    f64::from(bitmap.width),
                    f64::from(bitmap.height),
                )
                .decoration();
                if bitmap.width > 0 && bitmap.height > 0 {
                    props.scale_x = view.mockup_width / f64::from(bitmap.width);
                    props.scale_y = view.mockup_height / f64::from(bitmap.height);
                }
                SceneNode::new(
                    NodeRole::Background,
                    NodeContent::Image { bitmap, crop: None },
                    props,
                )
            }
            Err(err) => {
                tracing::warn!(
                    "Mockup {} unavailable, using plain background: {}",
                    describe_src(&view.mockup_image_url),
                    err
                );
                self.surface
                    .set_background_color(&self.config.fallback_background);
                SceneNode::new(
                    NodeRole::Background,
                    NodeContent::Fill {
                        color: self.config.fallback_background.clone(),
                    },
                    NodeProps::at(0.0, 0.0, view.mockup_width, view.mockup_height).decoration(),
                )
            }
        };
        self.fixed.background = Some(self.surface.insert(0, background));

        let area = &view.printable_area;
        let outlined = matches!(
            area.shape,
            PrintableShape::Rect { .. } | PrintableShape::Ellipse
        );
        if self.config.show_printable_area && outlined {
            let overlay = SceneNode::new(
                NodeRole::Overlay,
                NodeContent::Outline {
                    shape: area.shape.clone(),
                    color: OVERLAY_COLOR.to_string(),
                    dashed: true,
                },
                NodeProps::at(area.x, area.y, area.width, area.height).decoration(),
            );
            self.fixed.overlay = Some(self.surface.insert(1, overlay));
        }

        self.state = SceneState::Ready;
        if self.grid_enabled {
            self.build_grid();
        }
        tracing::debug!("Scene ready for {}/{}", attachment.template_id, view.id);
        self.surface.request_render();
    }

    fn build_grid(&mut self) {
        let Some(attachment) = &self.attachment else {
            return;
        };
        let lines = crate::geometry::grid_lines(&attachment.view.printable_area, self.config.grid_size);
        let (w, h) = self.surface.size();
        let mut index = usize::from(self.fixed.background.is_some())
            + usize::from(self.fixed.overlay.is_some());
        for line in lines {
            let node = SceneNode::new(
                NodeRole::GridLine,
                NodeContent::Line {
                    x1: line.x1,
                    y1: line.y1,
                    x2: line.x2,
                    y2: line.y2,
                    color: GRID_COLOR.to_string(),
                    width: GRID_LINE_WIDTH,
                },
                NodeProps::at(0.0, 0.0, f64::from(w), f64::from(h)).decoration(),
            );
            self.fixed.grid.push(self.surface.insert(index, node));
            index += 1;
        }
    }

    fn clear_grid(&mut self) {
        for handle in std::mem::take(&mut self.fixed.grid) {
            self.surface.remove(handle);
        }
    }

    fn require_ready(&self, operation: &str) -> bool {
        if self.state != SceneState::Ready {
            tracing::debug!("Ignoring {} while scene is {}", operation, self.state);
            return false;
        }
        true
    }
}

impl<S: RenderSurface> std::fmt::Debug for SceneSynchronizer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneSynchronizer")
            .field("state", &self.state)
            .field("attached_to", &self.attached_to())
            .field("layers", &self.layers.len())
            .field("pending", &self.pending.len())
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

impl<S: RenderSurface> Drop for SceneSynchronizer<S> {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::scene::MemorySurface;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use tokio::sync::Notify;

    /// Decoder serving fixed bitmaps; sources listed in `gated` wait for
    /// `release`.
    #[derive(Default)]
    pub struct FakeDecoder {
        pub bitmaps: Mutex<HashMap<String, Bitmap>>,
        pub gated: Mutex<Vec<String>>,
        pub release: Notify,
    }

    impl FakeDecoder {
        pub fn with(entries: &[(&str, u32, u32)]) -> Arc<Self> {
            let decoder = Self::default();
            for (src, w, h) in entries {
                decoder
                    .bitmaps
                    .lock()
                    .insert(src.to_string(), Bitmap::filled(*w, *h, [200, 50, 50, 255]));
            }
            Arc::new(decoder)
        }

        pub fn gate(&self, src: &str) {
            self.gated.lock().push(src.to_string());
        }
    }

    #[async_trait]
    impl ImageDecoder for FakeDecoder {
        async fn decode(&self, src: &str) -> Result<Bitmap, SceneError> {
            let gated = self.gated.lock().iter().any(|g| g == src);
            if gated {
                self.release.notified().await;
            }
            self.bitmaps
                .lock()
                .get(src)
                .cloned()
                .ok_or_else(|| SceneError::Decode {
                    src: src.to_string(),
                    reason: "not found".to_string(),
                })
        }
    }

    pub const MOCKUP: &str = "/templates/mug-wrap.svg";

    /// Ready scene on the mug wrap view
    pub async fn ready_scene(decoder: Arc<FakeDecoder>) -> SceneSynchronizer<MemorySurface> {
        decoder
            .bitmaps
            .lock()
            .insert(MOCKUP.to_string(), Bitmap::filled(900, 400, [255, 255, 255, 255]));
        let mut scene = SceneSynchronizer::new(MemorySurface::new(), decoder, SceneConfig::default());
        scene
            .attach(&crate::product::mug_template(), "wrap", SceneCallbacks::new())
            .unwrap();
        scene.settle().await;
        assert!(scene.is_ready());
        scene
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::model::{ShapeData, ShapeType};
    use crate::scene::MemorySurface;

    #[tokio::test]
    async fn test_attach_builds_background_and_overlay() {
        let scene = ready_scene(FakeDecoder::with(&[])).await;
        let roles: Vec<NodeRole> = scene.surface().nodes().map(|n| n.role).collect();
        assert_eq!(roles, vec![NodeRole::Background, NodeRole::Overlay]);
        assert_eq!(scene.surface().size(), (900, 400));
        assert_eq!(scene.attached_to(), Some(("mug-classic", "wrap")));
    }

    #[tokio::test]
    async fn test_missing_mockup_falls_back_to_white() {
        let mut scene = SceneSynchronizer::new(
            MemorySurface::new(),
            FakeDecoder::with(&[]),
            SceneConfig::default(),
        );
        scene
            .attach(&crate::product::mug_template(), "wrap", SceneCallbacks::new())
            .unwrap();
        assert_eq!(scene.state(), SceneState::Loading);
        assert_eq!(scene.surface().background_color(), "#f0f0f0");

        scene.settle().await;
        assert!(scene.is_ready());
        assert_eq!(scene.surface().background_color(), "#ffffff");
        let background = scene.surface().nodes().next().unwrap();
        assert!(matches!(background.content, NodeContent::Fill { .. }));
    }

    #[tokio::test]
    async fn test_unknown_view_is_rejected() {
        let mut scene = SceneSynchronizer::new(
            MemorySurface::new(),
            FakeDecoder::with(&[]),
            SceneConfig::default(),
        );
        let err = scene
            .attach(&crate::product::mug_template(), "front", SceneCallbacks::new())
            .unwrap_err();
        assert!(matches!(err, SceneError::UnknownView { .. }));
        assert_eq!(scene.state(), SceneState::Uninitialized);
    }

    #[tokio::test]
    async fn test_mutations_before_ready_are_ignored() {
        let decoder = FakeDecoder::with(&[(MOCKUP, 900, 400)]);
        let mut scene = SceneSynchronizer::new(MemorySurface::new(), decoder, SceneConfig::default());
        scene
            .attach(&crate::product::mug_template(), "wrap", SceneCallbacks::new())
            .unwrap();

        let layer = Layer::shape(
            "Box",
            Transform::new(150.0, 100.0, 50.0, 50.0),
            ShapeData::new(ShapeType::Rect, "#ff0000"),
        );
        scene.add_layer(&layer);
        scene.settle().await;
        assert!(scene.is_ready());
        assert!(scene.layer_node(&layer.id).is_none());
    }

    #[tokio::test]
    async fn test_detach_is_idempotent_and_discards_work() {
        let decoder = FakeDecoder::with(&[(MOCKUP, 900, 400)]);
        decoder.gate(MOCKUP);
        let mut scene = SceneSynchronizer::new(MemorySurface::new(), decoder, SceneConfig::default());
        scene
            .attach(&crate::product::mug_template(), "wrap", SceneCallbacks::new())
            .unwrap();
        assert_eq!(scene.in_flight(), 1);

        scene.detach();
        scene.detach();
        assert_eq!(scene.state(), SceneState::Uninitialized);
        assert_eq!(scene.in_flight(), 0);
        assert!(scene.surface().is_empty());
        scene.settle().await;
        assert_eq!(scene.state(), SceneState::Uninitialized);
    }

    #[tokio::test]
    async fn test_reattach_ignores_stale_mockup() {
        let decoder = FakeDecoder::with(&[(MOCKUP, 900, 400)]);
        let mut scene = SceneSynchronizer::new(MemorySurface::new(), decoder, SceneConfig::default());
        let mug = crate::product::mug_template();
        scene.attach(&mug, "wrap", SceneCallbacks::new()).unwrap();
        scene.attach(&mug, "wrap", SceneCallbacks::new()).unwrap();
        scene.settle().await;

        let backgrounds = scene
            .surface()
            .nodes()
            .filter(|n| n.role == NodeRole::Background)
            .count();
        assert_eq!(backgrounds, 1);
    }

    #[tokio::test]
    async fn test_export_requires_ready_and_covers_printable_area() {
        let mut scene = SceneSynchronizer::new(
            MemorySurface::new(),
            FakeDecoder::with(&[]),
            SceneConfig::default(),
        );
        let err = scene.export_region(ExportFormat::Png, 1.0).unwrap_err();
        assert!(matches!(err, printkit_core::Error::Scene(SceneError::NotReady)));

        let mut scene = ready_scene(FakeDecoder::with(&[])).await;
        let layer = Layer::shape(
            "Box",
            Transform::new(100.0, 50.0, 100.0, 100.0),
            ShapeData::new(ShapeType::Rect, "#00ff00"),
        );
        scene.add_layer(&layer);

        let export = scene
            .dispatch(SceneCommand::ExportRequested {
                format: ExportFormat::Png,
                multiplier: 2.0,
            })
            .unwrap()
            .unwrap();
        assert_eq!((export.width, export.height), (1400, 600));

        let decoded = image::load_from_memory(&export.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(50, 50).0, [0, 255, 0, 255]);
        // The mockup is not part of the export.
        assert_eq!(decoded.get_pixel(1000, 500).0[3], 0);
    }
}

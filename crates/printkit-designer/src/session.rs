//! An editing session: catalog, document, scene and validation wired
//! together.
//!
//! Document edits go through [`DesignState`] first and are then mirrored on
//! the scene. Interactions that start on the scene (drags, crops, selection)
//! come back through a feedback channel drained by [`EditorSession::pump`]
//! and [`EditorSession::settle`].

use printkit_core::{Error, EventBus, ProgressCallback, Result, SceneError, TemplateError};
use printkit_settings::{Config, ExportFormat};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::autosave::AutosaveHandle;
use crate::background_removal::BackgroundRemover;
use crate::design_state::DesignState;
use crate::export_hooks::{DesignExport, ExportHook, ExportHooks};
use crate::geometry::{calculate_dpi_with, fit_within, AlignAction, DpiInfo, INITIAL_FIT_FRACTION};
use crate::model::{
    Document, ImageData, Layer, LayerData, LayerId, LayerPatch, ShapeData, ShapeType, TextData,
    TransformPatch,
};
use crate::product::{PrintableArea, ProductCatalog, ProductTemplate};
use crate::scene::{
    CropApplied, ExportedImage, FlipDirection, ImageDecoder, ObjectModified,
    RenderSurface, SceneCallbacks, SceneCommand, SceneConfig, SceneSynchronizer,
};
use crate::storage::LocalDesignStore;
use crate::validation::{ExportGate, ValidationConfig, ValidationResult, Validator};

/// Size given to new text and shape layers before fitting
const DEFAULT_TEXT_BOX: (f64, f64) = (200.0, 50.0);
const DEFAULT_SHAPE_BOX: (f64, f64) = (100.0, 100.0);

/// What the scene reported back
#[derive(Debug, Clone, PartialEq)]
enum SceneFeedback {
    Modified(ObjectModified),
    Selection(Option<LayerId>),
    Cropped(CropApplied),
}

/// The editor core for one user
pub struct EditorSession<S: RenderSurface> {
    config: Config,
    catalog: ProductCatalog,
    design: DesignState,
    scene: SceneSynchronizer<S>,
    validator: Validator,
    hooks: ExportHooks,
    feedback_tx: mpsc::UnboundedSender<SceneFeedback>,
    feedback_rx: mpsc::UnboundedReceiver<SceneFeedback>,
    view_loaded: bool,
    selection: Option<LayerId>,
    remover: Option<BackgroundRemover>,
    autosave: Option<AutosaveHandle>,
}

impl<S: RenderSurface> EditorSession<S> {
    pub fn new(
        config: Config,
        catalog: ProductCatalog,
        surface: S,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Self {
        let bus = Arc::new(EventBus::new());
        let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();
        Self {
            design: DesignState::with_bus(bus, config.editor.history_capacity),
            scene: SceneSynchronizer::new(surface, decoder, SceneConfig::from(&config)),
            validator: Validator::new(ValidationConfig::from(&config.validation)),
            hooks: ExportHooks::new(),
            config,
            catalog,
            feedback_tx,
            feedback_rx,
            view_loaded: false,
            selection: None,
            remover: None,
            autosave: None,
        }
    }

    pub fn with_background_remover(mut self, remover: BackgroundRemover) -> Self {
        self.remover = Some(remover);
        self
    }

    /// Start debounced saving into `store` when the settings enable it.
    /// Must be called inside a tokio runtime.
    pub fn start_autosave(&mut self, store: LocalDesignStore) -> bool {
        self.autosave =
            AutosaveHandle::from_settings(&self.config.autosave, Arc::clone(self.design.bus()), store);
        self.autosave.is_some()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn design(&self) -> &DesignState {
        &self.design
    }

    pub fn document(&self) -> &Document {
        self.design.document()
    }

    pub fn scene(&self) -> &SceneSynchronizer<S> {
        &self.scene
    }

    /// Direct scene access for pointer interactions; their results come
    /// back through the next [`pump`](Self::pump).
    pub fn scene_mut(&mut self) -> &mut SceneSynchronizer<S> {
        &mut self.scene
    }

    pub fn validator_mut(&mut self) -> &mut Validator {
        &mut self.validator
    }

    /// Register a hook around [`export`](Self::export). Returns false for a
    /// duplicate name.
    pub fn add_export_hook(&mut self, hook: Box<dyn ExportHook>) -> bool {
        self.hooks.register(hook)
    }

    pub fn remove_export_hook(&mut self, name: &str) -> bool {
        self.hooks.unregister(name)
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn active_view_id(&self) -> &str {
        self.catalog.active_view_id()
    }

    fn template(&self) -> Result<&ProductTemplate> {
        self.catalog.selected().ok_or_else(|| {
            TemplateError::NotFound {
                template_id: self.document().product_template_id.clone(),
            }
            .into()
        })
    }

    fn active_area(&self) -> Result<PrintableArea> {
        let view_id = self.catalog.active_view_id();
        self.template()?
            .view(view_id)
            .map(|view| view.printable_area.clone())
            .ok_or_else(|| {
                Error::from(SceneError::UnknownView {
                    template_id: self.document().product_template_id.clone(),
                    view_id: view_id.to_string(),
                })
            })
    }

    /// Start a new design on `template_id` and show its default view
    pub fn select_product(&mut self, template_id: &str) -> Result<()> {
        let template = self.catalog.select_template(template_id)?.clone();
        self.design.initialize(&template);
        self.attach()
    }

    /// Switch the scene to another view of the current product
    pub fn open_view(&mut self, view_id: &str) -> Result<()> {
        if !self.catalog.set_active_view(view_id) {
            return Err(SceneError::UnknownView {
                template_id: self.document().product_template_id.clone(),
                view_id: view_id.to_string(),
            }
            .into());
        }
        self.attach()
    }

    fn attach(&mut self) -> Result<()> {
        let template = self.template()?.clone();
        let view_id = self.catalog.active_view_id().to_string();

        let modified = self.feedback_tx.clone();
        let selected = self.feedback_tx.clone();
        let cropped = self.feedback_tx.clone();
        let callbacks = SceneCallbacks::new()
            .on_object_modified(move |m| {
                modified.send(SceneFeedback::Modified(m)).ok();
            })
            .on_selection_changed(move |id| {
                selected.send(SceneFeedback::Selection(id)).ok();
            })
            .on_crop_applied(move |c| {
                cropped.send(SceneFeedback::Cropped(c)).ok();
            });

        self.selection = None;
        self.view_loaded = false;
        self.scene.attach(&template, &view_id, callbacks)?;
        Ok(())
    }

    /// Apply finished scene work and scene feedback without waiting
    pub fn pump(&mut self) {
        self.scene.pump();
        if self.load_view_when_ready() {
            self.scene.pump();
        }
        self.drain_feedback();
    }

    /// Wait for all scene work, then apply feedback
    pub async fn settle(&mut self) {
        loop {
            self.scene.settle().await;
            if !self.load_view_when_ready() {
                break;
            }
        }
        self.drain_feedback();
    }

    fn load_view_when_ready(&mut self) -> bool {
        if self.view_loaded || !self.scene.is_ready() {
            return false;
        }
        self.view_loaded = true;
        if let Ok(view) = self.design.document().view(self.catalog.active_view_id()) {
            self.scene.load_view(view);
        }
        true
    }

    fn drain_feedback(&mut self) {
        while let Ok(feedback) = self.feedback_rx.try_recv() {
            let view_id = self.catalog.active_view_id().to_string();
            let outcome = match feedback {
                SceneFeedback::Selection(id) => {
                    self.selection = id;
                    Ok(())
                }
                SceneFeedback::Modified(m) => self.design.update_transform(
                    &view_id,
                    &m.layer_id,
                    TransformPatch::full(&m.transform),
                ),
                SceneFeedback::Cropped(c) => self.commit_crop(&view_id, &c),
            };
            if let Err(err) = outcome {
                tracing::warn!("Scene feedback not applied: {}", err);
            }
        }
    }

    fn commit_crop(&mut self, view_id: &str, applied: &CropApplied) -> std::result::Result<(), printkit_core::DocumentError> {
        let layer = self.design.document().layer(view_id, &applied.layer_id)?;
        let mut data = layer.data.clone();
        if let LayerData::Image(image) = &mut data {
            image.set_crop(Some(applied.crop));
        }
        self.design.update_layer(
            view_id,
            &applied.layer_id,
            LayerPatch {
                transform: Some(TransformPatch::full(&applied.transform)),
                data: Some(data),
                ..LayerPatch::default()
            },
        )
    }

    /// Make the scene match the document after a wholesale change
    fn reconcile(&mut self) {
        if let Ok(view) = self.design.document().view(self.catalog.active_view_id()) {
            self.scene.reconcile(view);
        }
    }

    fn insert(&mut self, layer: Layer) -> Result<LayerId> {
        let view_id = self.catalog.active_view_id().to_string();
        let id = self.design.add_layer(&view_id, layer.clone())?;
        self.scene.add_layer(&layer);
        Ok(id)
    }

    /// Add an image scaled down to fit the printable area
    pub fn add_image(
        &mut self,
        name: impl Into<String>,
        src: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Result<LayerId> {
        let area = self.active_area()?;
        let transform = fit_within(&area, f64::from(width), f64::from(height), INITIAL_FIT_FRACTION);
        self.insert(Layer::image(name, transform, ImageData::new(src, width, height)))
    }

    /// Add a text layer centered in the printable area
    pub fn add_text(&mut self, content: impl Into<String>) -> Result<LayerId> {
        let area = self.active_area()?;
        let text = TextData::new(content);
        let transform = fit_within(&area, DEFAULT_TEXT_BOX.0, DEFAULT_TEXT_BOX.1, 1.0);
        let name = text.content.chars().take(20).collect::<String>();
        self.insert(Layer::text(name, transform, text))
    }

    /// Add a shape centered in the printable area
    pub fn add_shape(&mut self, shape_type: ShapeType, fill: impl Into<String>) -> Result<LayerId> {
        let area = self.active_area()?;
        let transform = fit_within(&area, DEFAULT_SHAPE_BOX.0, DEFAULT_SHAPE_BOX.1, 1.0);
        let name = format!("{:?}", shape_type);
        self.insert(Layer::shape(name, transform, ShapeData::new(shape_type, fill)))
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Result<Layer> {
        let view_id = self.catalog.active_view_id().to_string();
        let layer = self.design.remove_layer(&view_id, layer_id)?;
        self.scene.remove_layer(layer_id);
        Ok(layer)
    }

    pub fn duplicate_layer(&mut self, layer_id: &str) -> Result<LayerId> {
        let view_id = self.catalog.active_view_id().to_string();
        let id = self.design.duplicate_layer(&view_id, layer_id)?;
        self.reconcile();
        Ok(id)
    }

    pub fn update_transform(&mut self, layer_id: &str, patch: TransformPatch) -> Result<()> {
        let view_id = self.catalog.active_view_id().to_string();
        self.design.update_transform(&view_id, layer_id, patch)?;
        self.scene.dispatch(SceneCommand::LayerTransformChanged {
            layer_id: layer_id.to_string(),
            transform: patch,
        })?;
        Ok(())
    }

    pub fn set_visibility(&mut self, layer_id: &str, visible: bool) -> Result<()> {
        let view_id = self.catalog.active_view_id().to_string();
        self.design.set_visibility(&view_id, layer_id, visible)?;
        self.scene.set_visibility(layer_id, visible);
        Ok(())
    }

    pub fn set_locked(&mut self, layer_id: &str, locked: bool) -> Result<()> {
        let view_id = self.catalog.active_view_id().to_string();
        self.design.set_locked(&view_id, layer_id, locked)?;
        self.scene.set_locked(layer_id, locked);
        Ok(())
    }

    pub fn set_opacity(&mut self, layer_id: &str, opacity: f64) -> Result<()> {
        let view_id = self.catalog.active_view_id().to_string();
        self.design.set_opacity(&view_id, layer_id, opacity)?;
        self.scene.set_opacity(layer_id, opacity);
        Ok(())
    }

    /// Toggle a flip; returns the new flag
    pub fn flip(&mut self, layer_id: &str, direction: FlipDirection) -> Result<bool> {
        let view_id = self.catalog.active_view_id().to_string();
        let flipped = match direction {
            FlipDirection::Horizontal => self.design.flip_horizontal(&view_id, layer_id)?,
            FlipDirection::Vertical => self.design.flip_vertical(&view_id, layer_id)?,
        };
        self.scene.dispatch(SceneCommand::LayerFlip {
            layer_id: layer_id.to_string(),
            direction,
        })?;
        Ok(flipped)
    }

    pub fn align(&mut self, layer_id: &str, action: AlignAction) -> Result<(f64, f64)> {
        let view_id = self.catalog.active_view_id().to_string();
        let area = self.active_area()?;
        let (x, y) = self.design.align_layer(&view_id, layer_id, action, &area)?;
        self.scene
            .update_transform(layer_id, &TransformPatch::position(x, y));
        Ok((x, y))
    }

    fn restack(&mut self, moved: bool) -> Result<bool> {
        if moved {
            let ids = self
                .design
                .document()
                .view(self.catalog.active_view_id())?
                .layer_ids();
            self.scene.dispatch(SceneCommand::LayersReordered(ids))?;
        }
        Ok(moved)
    }

    pub fn reorder_layers(&mut self, ordered_ids: &[LayerId]) -> Result<()> {
        let view_id = self.catalog.active_view_id().to_string();
        self.design.reorder_layers(&view_id, ordered_ids)?;
        self.restack(true)?;
        Ok(())
    }

    pub fn move_layer_forward(&mut self, layer_id: &str) -> Result<bool> {
        let view_id = self.catalog.active_view_id().to_string();
        let moved = self.design.move_layer_forward(&view_id, layer_id)?;
        self.restack(moved)
    }

    pub fn move_layer_backward(&mut self, layer_id: &str) -> Result<bool> {
        let view_id = self.catalog.active_view_id().to_string();
        let moved = self.design.move_layer_backward(&view_id, layer_id)?;
        self.restack(moved)
    }

    pub fn move_layer_to_front(&mut self, layer_id: &str) -> Result<bool> {
        let view_id = self.catalog.active_view_id().to_string();
        let moved = self.design.move_layer_to_front(&view_id, layer_id)?;
        self.restack(moved)
    }

    pub fn move_layer_to_back(&mut self, layer_id: &str) -> Result<bool> {
        let view_id = self.catalog.active_view_id().to_string();
        let moved = self.design.move_layer_to_back(&view_id, layer_id)?;
        self.restack(moved)
    }

    /// Undo the last edit. Stepping back across a product switch also
    /// switches the catalog and scene back.
    pub fn undo(&mut self) -> bool {
        let undone = self.design.undo();
        if undone {
            self.follow_document();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.design.redo();
        if redone {
            self.follow_document();
        }
        redone
    }

    /// Replace the design from JSON; false leaves everything untouched.
    ///
    /// A design made for another catalog product switches the scene to
    /// that product.
    pub fn import_json(&mut self, json: &str) -> bool {
        if !self.design.import_json(json) {
            return false;
        }
        self.follow_document();
        true
    }

    /// Bring catalog and scene in line with the document's product: the
    /// scene is rebuilt when the product changed, reconciled otherwise.
    fn follow_document(&mut self) {
        let template_id = self.document().product_template_id.clone();
        let same_product = self.catalog.selected().is_some_and(|t| t.id == template_id);
        if same_product {
            self.reconcile();
        } else if self.catalog.select_template(&template_id).is_ok() {
            if let Err(err) = self.attach() {
                tracing::warn!("Design {} could not be shown: {}", self.document().id, err);
            }
        } else {
            tracing::warn!("Design uses unknown template {}", template_id);
        }
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(self.design.export_json()?)
    }

    pub fn validate(&self) -> Result<ValidationResult> {
        Ok(self.validator.validate(self.document(), self.template()?))
    }

    /// DPI badge of an image layer in the active view
    pub fn dpi(&self, layer_id: &str) -> Option<DpiInfo> {
        let area = self.active_area().ok()?;
        let layer = self
            .document()
            .layer(self.catalog.active_view_id(), layer_id)
            .ok()?;
        calculate_dpi_with(layer, &area, self.config.validation.good_dpi)
    }

    /// Validate, then rasterize the active view's printable area.
    ///
    /// Validation errors block the export unless `allow_override` is set.
    pub fn export(
        &mut self,
        format: ExportFormat,
        multiplier: f64,
        allow_override: bool,
    ) -> Result<ExportedImage> {
        self.export_design(format, multiplier, allow_override)
            .map(|export| export.image)
    }

    /// Like [`export`](Self::export), also returning the design as rewritten
    /// by the registered export hooks. The live document is not changed.
    pub fn export_design(
        &mut self,
        format: ExportFormat,
        multiplier: f64,
        allow_override: bool,
    ) -> Result<DesignExport> {
        let result = self.validate()?;
        ExportGate::check(&result, allow_override)?;
        let design = self.hooks.run_before(self.document().clone())?;

        self.scene.clear_selection();
        self.drain_feedback();
        let image = self
            .scene
            .dispatch(SceneCommand::ExportRequested { format, multiplier })?
            .ok_or_else(|| Error::other("export produced no image"))?;

        let export = DesignExport { design, image };
        self.hooks.run_after(&export);
        Ok(export)
    }

    /// Export with the configured format and multiplier
    pub fn export_default(&mut self, allow_override: bool) -> Result<ExportedImage> {
        let (format, multiplier) = (self.config.export.format, self.config.export.multiplier);
        self.export(format, multiplier, allow_override)
    }

    /// Replace an image layer's pixels with a background-free version
    pub async fn remove_background(
        &mut self,
        layer_id: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        let remover = self
            .remover
            .clone()
            .ok_or_else(|| Error::other("no background removal model configured"))?;
        let view_id = self.catalog.active_view_id().to_string();
        let src = self
            .document()
            .layer(&view_id, layer_id)?
            .data
            .as_image()
            .map(|image| image.src.clone())
            .ok_or_else(|| Error::other(format!("layer {} is not an image", layer_id)))?;

        let handle = remover.remove(src, progress)?;
        let new_src = handle
            .await
            .map_err(|e| Error::other(format!("background removal task failed: {}", e)))??;

        self.design.update_image_source(&view_id, layer_id, new_src.clone())?;
        self.scene.dispatch(SceneCommand::ImageSourceUpdated {
            layer_id: layer_id.to_string(),
            src: new_src,
        })?;
        Ok(())
    }

    pub fn enter_crop(&mut self, layer_id: &str) -> bool {
        self.scene.enter_crop(layer_id)
    }

    /// Commit the scene's crop session into the document
    pub fn apply_crop(&mut self) -> bool {
        let applied = self.scene.apply_crop().is_some();
        self.drain_feedback();
        applied
    }

    pub fn cancel_crop(&mut self) {
        self.scene.cancel_crop();
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.scene.toggle_grid()
    }

    pub fn toggle_snap(&mut self) -> bool {
        self.scene.toggle_snap()
    }

    /// Detach the scene and stop autosaving
    pub fn close(&mut self) {
        self.scene.detach();
        if let Some(autosave) = self.autosave.take() {
            autosave.cancel();
        }
        self.view_loaded = false;
        self.selection = None;
    }
}

impl<S: RenderSurface> std::fmt::Debug for EditorSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("template", &self.catalog.selected().map(|t| t.id.as_str()))
            .field("view", &self.catalog.active_view_id())
            .field("document", &self.document().id)
            .field("scene", &self.scene)
            .finish()
    }
}

//! # PrintKit Designer
//!
//! The editing core of the print-product designer: the layered design
//! document, the geometry it is checked against, and the scene that mirrors
//! it onto a render surface.
//!
//! ## Core Components
//!
//! ### Document
//! - **Model**: documents, views, layers and transforms with their JSON shape
//! - **Design State**: history-wrapped mutations with undo/redo
//! - **Serialization**: JSON import/export and file save/load
//! - **Storage**: named local saves and debounced autosave
//!
//! ### Products
//! - **Templates**: product views, mockups and printable areas
//! - **Loader**: demo, embedded and standalone template sources
//! - **Catalog**: the selected product and its active view
//!
//! ### Geometry and Validation
//! - **Alignment**, **bounds**, **DPI**, **grid snapping** and **placement**
//! - **Validation**: print-readiness checks and the export gate
//! - **Export Hooks**: integrator rewrites of the exported design
//!
//! ### Scene
//! - **Synchronizer**: mirrors one view onto a [`scene::RenderSurface`]
//! - **Memory Surface**: a `tiny-skia` raster surface used for export
//! - **Tools**: crop, grid, snapping and drag constraints
//!
//! ## Architecture
//!
//! ```text
//! EditorSession
//!   ├── ProductCatalog (templates, active view)
//!   ├── DesignState (document + history)
//!   │     └── EventBus<EditorEvent>
//!   ├── SceneSynchronizer (render surface mirror)
//!   ├── Validator / ExportGate / ExportHooks
//!   └── AutosaveHandle / BackgroundRemover
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use printkit_designer::{EditorSession, MemorySurface, DataUrlDecoder, ProductCatalog};
//!
//! let mut session = EditorSession::new(config, catalog, MemorySurface::new(), DataUrlDecoder::new());
//! session.select_product("mug-classic")?;
//! session.settle().await;
//! let id = session.add_text("Hello")?;
//! let png = session.export_default(false)?;
//! ```

pub mod autosave;
pub mod background_removal;
pub mod design_state;
pub mod events;
pub mod export_hooks;
pub mod geometry;
pub mod history;
pub mod model;
pub mod product;
pub mod scene;
pub mod serialization;
pub mod session;
pub mod storage;
pub mod validation;

pub use autosave::AutosaveHandle;
pub use background_removal::{BackgroundRemovalModel, BackgroundRemover};
pub use design_state::DesignState;
pub use events::{DocumentEvent, EditorEvent, HistoryEvent, PersistenceEvent};
pub use export_hooks::{DesignExport, ExportHook, ExportHooks};
pub use geometry::{
    align, bounding_box, calculate_dpi, constrain_box, fit_within, overlap_ratio, snap,
    AlignAction, DpiInfo, DpiStatus, Position, Rect,
};
pub use history::{History, DEFAULT_HISTORY_CAPACITY};
pub use model::{
    CropRect, Document, ImageData, Layer, LayerData, LayerId, LayerKind, LayerPatch, ShapeData,
    ShapeType, TextData, Transform, TransformPatch, View,
};
pub use product::{
    FileTemplateSource, LoadStatus, PrintableArea, PrintableShape, ProductCatalog,
    ProductTemplate, ProductType, ProductView, TemplateLoader, TemplateRegistry, TemplateSource,
};
pub use scene::{
    DataUrlDecoder, ExportedImage, FlipDirection, ImageDecoder, MemorySurface, RenderSurface,
    SceneCommand, SceneConfig, SceneState, SceneSynchronizer,
};
pub use serialization::{export_json, import_json, load_from_file, save_to_file, ImportError};
pub use session::EditorSession;
pub use storage::LocalDesignStore;
pub use validation::{
    validate, ExportGate, Severity, ValidationConfig, ValidationIssue, ValidationResult,
    Validator,
};

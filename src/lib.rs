//! # PrintKit
//!
//! The core of a print-product design editor: users place image, text and
//! shape layers onto per-view product mockups (t-shirts, mugs, phone cases)
//! inside a bounded printable area and export a print-ready composition.
//!
//! ## Architecture
//!
//! PrintKit is organized as a workspace with multiple crates:
//!
//! 1. **printkit-core** - Error taxonomy, typed event bus, callback aliases
//! 2. **printkit-settings** - Editor configuration and key-value persistence
//! 3. **printkit-designer** - Document model, geometry, validation, history,
//!    scene synchronization and the editor session
//! 4. **printkit** - This facade plus the `printkit` command-line tool
//!
//! ## Features
//!
//! - **Layered Documents**: image, text and shape layers per product view
//! - **Print Geometry**: alignment, bounds constraint, grid snap, DPI scoring
//! - **Validation**: print-readiness checks gating export
//! - **Undo/Redo**: bounded snapshot history of the document
//! - **Raster Export**: PNG/JPEG of the printable area at any multiplier

pub use printkit_core::{
    BackgroundRemovalError, DocumentError, Error, EventBus, ExportError, Result, SceneError,
    TemplateError,
};
pub use printkit_designer as designer;
pub use printkit_designer::{
    AlignAction, DataUrlDecoder, DesignState, Document, EditorSession, ExportGate, ImageDecoder,
    Layer, LayerData, LayerId, MemorySurface, ProductCatalog, ProductTemplate, RenderSurface,
    SceneSynchronizer, TemplateRegistry, Transform, ValidationResult, Validator,
};
pub use printkit_settings::{Config, EditorMode, ExportFormat};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, multi-line
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Pretty console output on stderr
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    init_logging_with(LogFormat::Pretty)
}

/// Initialize logging with an explicit output format
pub fn init_logging_with(format: LogFormat) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output, so logs go to stderr
    match format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_line_number(true)
                .pretty();
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .json();
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}

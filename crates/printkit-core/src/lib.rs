//! # PrintKit Core
//!
//! Core types shared by the PrintKit crates: the error taxonomy, the typed
//! event bus, and callback/lock aliases.

pub mod error;
pub mod event_bus;
pub mod types;

pub use error::{
    BackgroundRemovalError, DocumentError, Error, ExportError, Result, SceneError, TemplateError,
};

pub use event_bus::{EventBus, EventBusError, DEFAULT_CHANNEL_CAPACITY};

pub use types::{thread_safe, DataCallback, ProgressCallback, ThreadSafe};

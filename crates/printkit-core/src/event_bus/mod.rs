//! # Event Bus Module
//!
//! Typed broadcast channel used to decouple the design document from its
//! observers (autosave, status displays).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use printkit_core::EventBus;
//!
//! let bus: EventBus<EditorEvent> = EventBus::new();
//! let mut rx = bus.receiver();
//! bus.publish(event)?;
//! let received = rx.recv().await?;
//! ```

mod bus;

pub use bus::*;

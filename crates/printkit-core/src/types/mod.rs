//! Shared type aliases.
//!
//! - [`aliases`]: callback and shared-state aliases used across crates.

pub mod aliases;

pub use aliases::*;

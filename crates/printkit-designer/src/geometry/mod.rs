//! Geometry engine
//!
//! Pure functions over document transforms and printable areas:
//! alignment, DPI scoring, grid snapping, the soft bounds constraint used
//! while dragging, overlap testing and initial placement. Nothing in this
//! module performs I/O or mutates its inputs.

pub mod alignment;
pub mod bounds;
pub mod dpi;
pub mod grid;
pub mod placement;

pub use alignment::{align, AlignAction, Position};
pub use bounds::{
    bounding_box, constrain_box, constrain_to_area, object_rect, overlap_ratio, Rect,
};
pub use dpi::{calculate_dpi, calculate_dpi_with, DpiInfo, DpiStatus, GOOD_DPI};
pub use grid::{grid_lines, snap, snap_point, GridLine};
pub use placement::{fit_within, INITIAL_FIT_FRACTION};

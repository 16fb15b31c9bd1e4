//! Bounding boxes, overlap and the soft drag constraint.

use serde::{Deserialize, Serialize};

use super::alignment::Position;
use crate::model::Transform;

/// Axis-aligned rectangle in view pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Area shared with `other`; zero when disjoint
    pub fn overlap_area(&self, other: &Rect) -> f64 {
        let w = (self.right().min(other.right()) - self.x.max(other.x)).max(0.0);
        let h = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0);
        w * h
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

/// Unrotated on-canvas box of a transform (anchor plus scaled size)
pub fn object_rect(transform: &Transform) -> Rect {
    Rect::new(
        transform.x,
        transform.y,
        transform.effective_width(),
        transform.effective_height(),
    )
}

/// Axis-aligned box enclosing the transform after rotation about its anchor
pub fn bounding_box(transform: &Transform) -> Rect {
    let w = transform.effective_width();
    let h = transform.effective_height();
    if transform.rotation % 360.0 == 0.0 {
        return Rect::new(transform.x, transform.y, w, h);
    }

    let (sin, cos) = transform.rotation.to_radians().sin_cos();
    let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)].map(|(px, py)| {
        (
            transform.x + px * cos - py * sin,
            transform.y + px * sin + py * cos,
        )
    });

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (cx, cy) in corners {
        min_x = min_x.min(cx);
        min_y = min_y.min(cy);
        max_x = max_x.max(cx);
        max_y = max_y.max(cy);
    }
    Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
}

/// Fraction of the object's box lying inside `area`, `None` for empty
/// objects.
pub fn overlap_ratio(transform: &Transform, area: &Rect) -> Option<f64> {
    let obj = object_rect(transform);
    let obj_area = obj.area();
    if obj_area > 0.0 {
        Some(obj.overlap_area(area) / obj_area)
    } else {
        None
    }
}

/// Soft clamp of a `width` x `height` box at (`left`, `top`) so that at least
/// `min_fraction` of it stays inside `area` on each axis.
pub fn constrain_box(
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    area: &Rect,
    min_fraction: f64,
) -> Position {
    let clamp_axis = |start: f64, size: f64, area_start: f64, area_size: f64| {
        let keep = size * min_fraction;
        if start + size < area_start + keep {
            area_start + keep - size
        } else if start > area_start + area_size - keep {
            area_start + area_size - keep
        } else {
            start
        }
    };

    Position {
        x: clamp_axis(left, width, area.x, area.width),
        y: clamp_axis(top, height, area.y, area.height),
    }
}

/// Anchor for `transform` after applying [`constrain_box`] to its rotated
/// bounding box.
pub fn constrain_to_area(transform: &Transform, area: &Rect, min_fraction: f64) -> Position {
    let bounds = bounding_box(transform);
    let clamped = constrain_box(
        bounds.x,
        bounds.y,
        bounds.width,
        bounds.height,
        area,
        min_fraction,
    );
    Position {
        x: transform.x + (clamped.x - bounds.x),
        y: transform.y + (clamped.y - bounds.y),
    }
}

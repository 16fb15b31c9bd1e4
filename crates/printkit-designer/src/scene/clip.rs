//! Clip regions derived from a printable area.
//!
//! Every clipped node carries its own [`ClipRegion`] value; nothing is
//! shared between nodes.

use crate::geometry::Rect;
use crate::product::{Point, PrintableArea, PrintableShape};

/// Clip shape in scene coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum ClipRegion {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        radius: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    },
    Polygon {
        points: Vec<Point>,
    },
}

impl ClipRegion {
    /// Clip matching the shape of `area`
    pub fn from_area(area: &PrintableArea) -> Self {
        match &area.shape {
            PrintableShape::Rect { border_radius } => ClipRegion::Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height,
                radius: border_radius.unwrap_or(0.0).max(0.0),
            },
            PrintableShape::Ellipse => ClipRegion::Ellipse {
                cx: area.x + area.width / 2.0,
                cy: area.y + area.height / 2.0,
                rx: area.width / 2.0,
                ry: area.height / 2.0,
            },
            PrintableShape::Polygon { points } if points.len() >= 3 => ClipRegion::Polygon {
                points: points.clone(),
            },
            PrintableShape::Polygon { .. } => ClipRegion::Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height,
                radius: 0.0,
            },
        }
    }

    /// Axis-aligned bounds of the clip
    pub fn bounds(&self) -> Rect {
        match self {
            ClipRegion::Rect {
                x,
                y,
                width,
                height,
                ..
            } => Rect::new(*x, *y, *width, *height),
            ClipRegion::Ellipse { cx, cy, rx, ry } => Rect::new(cx - rx, cy - ry, rx * 2.0, ry * 2.0),
            ClipRegion::Polygon { points } => {
                let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
                let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
                let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
                let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
                Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
            }
        }
    }

    /// Whether a scene point lies inside the clip
    pub fn contains(&self, px: f64, py: f64) -> bool {
        match self {
            ClipRegion::Rect {
                x,
                y,
                width,
                height,
                radius,
            } => {
                if px < *x || py < *y || px > x + width || py > y + height {
                    return false;
                }
                let r = radius.min(width / 2.0).min(height / 2.0);
                if r <= 0.0 {
                    return true;
                }
                // Only the corner squares need the rounded test
                let cx = px.clamp(x + r, x + width - r);
                let cy = py.clamp(y + r, y + height - r);
                (px - cx).powi(2) + (py - cy).powi(2) <= r * r
            }
            ClipRegion::Ellipse { cx, cy, rx, ry } => {
                if *rx <= 0.0 || *ry <= 0.0 {
                    return false;
                }
                ((px - cx) / rx).powi(2) + ((py - cy) / ry).powi(2) <= 1.0
            }
            ClipRegion::Polygon { points } => {
                // Even-odd ray cast
                let mut inside = false;
                let mut j = points.len() - 1;
                for i in 0..points.len() {
                    let (a, b) = (points[i], points[j]);
                    if (a.y > py) != (b.y > py)
                        && px < (b.x - a.x) * (py - a.y) / (b.y - a.y) + a.x
                    {
                        inside = !inside;
                    }
                    j = i;
                }
                inside
            }
        }
    }
}

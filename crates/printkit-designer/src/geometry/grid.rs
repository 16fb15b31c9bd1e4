//! Grid snapping and grid line layout.

use super::alignment::Position;
use crate::product::PrintableArea;

/// Snap `value` to the nearest multiple of `grid_size` measured from `offset`
pub fn snap(value: f64, offset: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 {
        return value;
    }
    ((value - offset) / grid_size).round() * grid_size + offset
}

/// Snap a point to the grid anchored at the printable area's origin
pub fn snap_point(x: f64, y: f64, area: &PrintableArea, grid_size: f64) -> Position {
    Position {
        x: snap(x, area.x, grid_size),
        y: snap(y, area.y, grid_size),
    }
}

/// A grid line segment in view pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl GridLine {
    pub fn is_vertical(&self) -> bool {
        self.x1 == self.x2
    }
}

/// Interior grid lines of `area`, vertical lines first.
///
/// Lines sit at every `grid_size` step from the area's origin, excluding the
/// area's own edges.
pub fn grid_lines(area: &PrintableArea, grid_size: f64) -> Vec<GridLine> {
    let mut lines = Vec::new();
    if grid_size <= 0.0 {
        return lines;
    }

    let mut cx = area.x + grid_size;
    while cx < area.x + area.width {
        lines.push(GridLine {
            x1: cx,
            y1: area.y,
            x2: cx,
            y2: area.y + area.height,
        });
        cx += grid_size;
    }

    let mut cy = area.y + grid_size;
    while cy < area.y + area.height {
        lines.push(GridLine {
            x1: area.x,
            y1: cy,
            x2: area.x + area.width,
            y2: cy,
        });
        cy += grid_size;
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_relative_to_offset() {
        assert_eq!(snap(37.0, 10.0, 20.0), 30.0);
        assert_eq!(snap(41.0, 10.0, 20.0), 50.0);
        assert_eq!(snap(-12.0, 0.0, 20.0), -20.0);
        assert_eq!(snap(13.0, 0.0, 0.0), 13.0);
    }

    #[test]
    fn test_snap_point_uses_area_origin() {
        let area = PrintableArea::rect(250.0, 200.0, 300.0, 400.0, 12.0, 16.0);
        assert_eq!(
            snap_point(263.0, 228.0, &area, 20.0),
            Position { x: 270.0, y: 220.0 }
        );
    }

    #[test]
    fn test_grid_lines_exclude_edges() {
        let area = PrintableArea::rect(0.0, 0.0, 100.0, 60.0, 1.0, 1.0);
        let lines = grid_lines(&area, 20.0);
        let vertical: Vec<f64> = lines.iter().filter(|l| l.is_vertical()).map(|l| l.x1).collect();
        let horizontal: Vec<f64> = lines.iter().filter(|l| !l.is_vertical()).map(|l| l.y1).collect();
        assert_eq!(vertical, [20.0, 40.0, 60.0, 80.0]);
        assert_eq!(horizontal, [20.0, 40.0]);
        assert_eq!(lines[0], GridLine { x1: 20.0, y1: 0.0, x2: 20.0, y2: 60.0 });
    }
}

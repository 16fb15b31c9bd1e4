//! Alignment of a layer relative to the printable area.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::model::Transform;
use crate::product::PrintableArea;

/// Anchor position in view pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Alignment target; each action moves exactly one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignAction {
    Left,
    CenterH,
    Right,
    Top,
    CenterV,
    Bottom,
}

impl AlignAction {
    pub const ALL: [AlignAction; 6] = [
        AlignAction::Left,
        AlignAction::CenterH,
        AlignAction::Right,
        AlignAction::Top,
        AlignAction::CenterV,
        AlignAction::Bottom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlignAction::Left => "left",
            AlignAction::CenterH => "center-h",
            AlignAction::Right => "right",
            AlignAction::Top => "top",
            AlignAction::CenterV => "center-v",
            AlignAction::Bottom => "bottom",
        }
    }

    /// Whether the action moves the x coordinate
    pub fn is_horizontal(&self) -> bool {
        matches!(
            self,
            AlignAction::Left | AlignAction::CenterH | AlignAction::Right
        )
    }
}

impl std::fmt::Display for AlignAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlignAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlignAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown alignment: {}", s))
    }
}

/// New anchor for `transform` aligned inside `area`.
///
/// Uses the scaled size; the axis not named by `action` is passed through.
pub fn align(action: AlignAction, transform: &Transform, area: &PrintableArea) -> Position {
    let obj_w = transform.effective_width();
    let obj_h = transform.effective_height();
    let (mut x, mut y) = (transform.x, transform.y);

    match action {
        AlignAction::Left => x = area.x,
        AlignAction::CenterH => x = area.x + (area.width - obj_w) / 2.0,
        AlignAction::Right => x = area.x + area.width - obj_w,
        AlignAction::Top => y = area.y,
        AlignAction::CenterV => y = area.y + (area.height - obj_h) / 2.0,
        AlignAction::Bottom => y = area.y + area.height - obj_h,
    }

    Position { x, y }
}

//! Print-quality scoring of image layers.

use serde::{Deserialize, Serialize};

use crate::model::{Layer, LayerData};
use crate::product::PrintableArea;

/// Effective DPI at or above which an image is considered print-ready
pub const GOOD_DPI: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DpiStatus {
    Good,
    Warning,
    Low,
}

impl std::fmt::Display for DpiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DpiStatus::Good => write!(f, "good"),
            DpiStatus::Warning => write!(f, "warning"),
            DpiStatus::Low => write!(f, "low"),
        }
    }
}

/// DPI of an image layer as placed in a printable area.
///
/// The DPI figures are rounded for display; `status` was decided on the
/// unrounded effective value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DpiInfo {
    pub horizontal_dpi: u32,
    pub vertical_dpi: u32,
    pub effective_dpi: u32,
    pub status: DpiStatus,
    pub min_dpi: f64,
}

/// [`calculate_dpi_with`] using [`GOOD_DPI`]
pub fn calculate_dpi(layer: &Layer, area: &PrintableArea) -> Option<DpiInfo> {
    calculate_dpi_with(layer, area, GOOD_DPI)
}

/// Score an image layer against `area`.
///
/// Returns `None` for non-image layers, images without a native size and
/// degenerate physical sizes.
pub fn calculate_dpi_with(layer: &Layer, area: &PrintableArea, good_dpi: f64) -> Option<DpiInfo> {
    let LayerData::Image(image) = &layer.data else {
        return None;
    };
    if image.original_width == 0 || image.original_height == 0 {
        return None;
    }
    if area.physical_width_inches <= 0.0 || area.physical_height_inches <= 0.0 {
        return None;
    }

    let physical_w = layer.transform.effective_width() / area.pixels_per_inch_x();
    let physical_h = layer.transform.effective_height() / area.pixels_per_inch_y();
    if !(physical_w > 0.0 && physical_h > 0.0) {
        return None;
    }

    let horizontal = f64::from(image.original_width) / physical_w;
    let vertical = f64::from(image.original_height) / physical_h;
    let effective = horizontal.min(vertical);

    let status = if effective >= good_dpi {
        DpiStatus::Good
    } else if effective >= area.min_dpi {
        DpiStatus::Warning
    } else {
        DpiStatus::Low
    };

    Some(DpiInfo {
        horizontal_dpi: round_dpi(horizontal),
        vertical_dpi: round_dpi(vertical),
        effective_dpi: round_dpi(effective),
        status,
        min_dpi: area.min_dpi,
    })
}

fn round_dpi(value: f64) -> u32 {
    value.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

//! Initial placement of new content.

use crate::model::Transform;
use crate::product::PrintableArea;

/// Share of the printable area an uploaded image may initially cover
pub const INITIAL_FIT_FRACTION: f64 = 0.8;

/// Transform for `width` x `height` content scaled down (never up) to fit
/// inside `fraction` of `area`, centered.
pub fn fit_within(area: &PrintableArea, width: f64, height: f64, fraction: f64) -> Transform {
    let max_w = area.width * fraction;
    let max_h = area.height * fraction;
    let ratio = if width > 0.0 && height > 0.0 {
        (max_w / width).min(max_h / height).min(1.0)
    } else {
        1.0
    };

    let w = width * ratio;
    let h = height * ratio;
    Transform::new(
        area.x + (area.width - w) / 2.0,
        area.y + (area.height - h) / 2.0,
        w,
        h,
    )
}

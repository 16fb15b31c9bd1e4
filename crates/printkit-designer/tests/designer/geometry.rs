use printkit_designer::geometry::{
    align, bounding_box, calculate_dpi, constrain_box, fit_within, overlap_ratio, snap,
    AlignAction, DpiStatus, Rect, INITIAL_FIT_FRACTION,
};
use printkit_designer::model::{ImageData, Layer, Transform};
use printkit_designer::product::PrintableArea;
use proptest::prelude::*;

#[test]
fn test_align_center_and_bottom() {
    let transform = Transform::new(0.0, 0.0, 100.0, 50.0).with_scale(2.0, 1.0);
    let area = PrintableArea::rect(10.0, 10.0, 300.0, 200.0, 10.0, 10.0);

    let centered = align(AlignAction::CenterH, &transform, &area);
    assert_eq!((centered.x, centered.y), (60.0, 0.0));

    let bottom = align(AlignAction::Bottom, &transform, &area);
    assert_eq!((bottom.x, bottom.y), (0.0, 160.0));
}

#[test]
fn test_mug_image_dpi_is_good() {
    let area = PrintableArea::rect(0.0, 0.0, 700.0, 300.0, 8.5, 3.5);
    let layer = Layer::image(
        "Photo",
        Transform::new(0.0, 0.0, 300.0, 120.0),
        ImageData::new("photo.png", 1200, 480),
    );

    let info = calculate_dpi(&layer, &area).unwrap();
    assert_eq!(info.horizontal_dpi, 329);
    assert_eq!(info.status, DpiStatus::Good);
    assert_eq!(info.min_dpi, 150.0);
}

#[test]
fn test_constrain_keeps_a_fifth_visible() {
    let area = Rect::new(0.0, 0.0, 500.0, 500.0);
    let clamped = constrain_box(-90.0, 200.0, 100.0, 100.0, &area, 0.2);
    assert_eq!((clamped.x, clamped.y), (-80.0, 200.0));

    let clamped = constrain_box(490.0, -95.0, 100.0, 100.0, &area, 0.2);
    assert_eq!((clamped.x, clamped.y), (480.0, -80.0));
}

proptest! {
    #[test]
    fn align_only_moves_its_own_axis(
        x in -500.0f64..500.0,
        y in -500.0f64..500.0,
        w in 1.0f64..400.0,
        h in 1.0f64..400.0,
    ) {
        let transform = Transform::new(x, y, w, h);
        let area = PrintableArea::rect(20.0, 30.0, 600.0, 400.0, 6.0, 4.0);
        for action in AlignAction::ALL {
            let pos = align(action, &transform, &area);
            if action.is_horizontal() {
                prop_assert_eq!(pos.y, y);
            } else {
                prop_assert_eq!(pos.x, x);
            }
        }
    }

    #[test]
    fn constrained_box_keeps_min_fraction_inside(
        left in -2000.0f64..2000.0,
        top in -2000.0f64..2000.0,
        size in 1.0f64..300.0,
    ) {
        let area = Rect::new(0.0, 0.0, 500.0, 500.0);
        let pos = constrain_box(left, top, size, size, &area, 0.2);
        let visible_w = (pos.x + size).min(500.0) - pos.x.max(0.0);
        let visible_h = (pos.y + size).min(500.0) - pos.y.max(0.0);
        prop_assert!(visible_w >= size * 0.2 - 1e-9);
        prop_assert!(visible_h >= size * 0.2 - 1e-9);
    }

    #[test]
    fn fitted_content_stays_inside_the_area(
        w in 1.0f64..5000.0,
        h in 1.0f64..5000.0,
    ) {
        let area = PrintableArea::rect(100.0, 50.0, 700.0, 300.0, 8.5, 3.5);
        let t = fit_within(&area, w, h, INITIAL_FIT_FRACTION);
        prop_assert!(t.width <= w + 1e-9);
        prop_assert!(t.width <= 560.0 + 1e-9);
        prop_assert!(t.height <= 240.0 + 1e-9);
        let ratio = overlap_ratio(&t, &area.bounds()).unwrap();
        prop_assert!(ratio > 1.0 - 1e-9);
    }

    #[test]
    fn rotated_bounds_contain_the_anchor(
        rotation in -720.0f64..720.0,
        w in 1.0f64..300.0,
        h in 1.0f64..300.0,
    ) {
        let t = Transform::new(40.0, 60.0, w, h).with_rotation(rotation);
        let bounds = bounding_box(&t);
        prop_assert!(bounds.x <= 40.0 + 1e-9 && bounds.right() >= 40.0 - 1e-9);
        prop_assert!(bounds.y <= 60.0 + 1e-9 && bounds.bottom() >= 60.0 - 1e-9);
        let diagonal = (w * w + h * h).sqrt();
        prop_assert!(bounds.width <= 2.0 * diagonal);
    }

    #[test]
    fn snapped_values_sit_on_the_grid(value in -1000.0f64..1000.0, offset in 0.0f64..100.0) {
        let snapped = snap(value, offset, 20.0);
        let steps = (snapped - offset) / 20.0;
        prop_assert!((steps - steps.round()).abs() < 1e-9);
        prop_assert!((snapped - value).abs() <= 10.0 + 1e-9);
    }
}

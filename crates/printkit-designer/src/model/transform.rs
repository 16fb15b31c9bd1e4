//! Layer placement.

use serde::{Deserialize, Serialize};

/// Position, size, rotation and flips of a layer in view pixel space.
///
/// `x`/`y` is the unrotated top-left anchor. The on-canvas size is
/// `width * scale_x` by `height * scale_y`; flips are independent of scale,
/// which must stay strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees, clockwise
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            flip_x: false,
            flip_y: false,
        }
    }
}

impl Transform {
    /// Unscaled, unrotated box at (x, y)
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Rendered width (`width * scale_x`)
    pub fn effective_width(&self) -> f64 {
        self.width * self.scale_x
    }

    /// Rendered height (`height * scale_y`)
    pub fn effective_height(&self) -> f64 {
        self.height * self.scale_y
    }

    /// Check the numeric invariants, returning a description of the first
    /// violation.
    pub fn check(&self) -> Result<(), String> {
        let finite = [
            self.x,
            self.y,
            self.width,
            self.height,
            self.rotation,
            self.scale_x,
            self.scale_y,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err("non-finite value".to_string());
        }
        if self.scale_x <= 0.0 || self.scale_y <= 0.0 {
            return Err(format!(
                "scale must be positive (got {} x {})",
                self.scale_x, self.scale_y
            ));
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(format!(
                "size must not be negative (got {} x {})",
                self.width, self.height
            ));
        }
        Ok(())
    }

    /// Merge the fields present in `patch`
    pub fn apply(&mut self, patch: &TransformPatch) {
        if let Some(v) = patch.x {
            self.x = v;
        }
        if let Some(v) = patch.y {
            self.y = v;
        }
        if let Some(v) = patch.width {
            self.width = v;
        }
        if let Some(v) = patch.height {
            self.height = v;
        }
        if let Some(v) = patch.rotation {
            self.rotation = v;
        }
        if let Some(v) = patch.scale_x {
            self.scale_x = v;
        }
        if let Some(v) = patch.scale_y {
            self.scale_y = v;
        }
        if let Some(v) = patch.flip_x {
            self.flip_x = v;
        }
        if let Some(v) = patch.flip_y {
            self.flip_y = v;
        }
    }

    /// This transform with `patch` merged in
    pub fn patched(mut self, patch: &TransformPatch) -> Self {
        self.apply(patch);
        self
    }
}

/// Partial transform; absent fields are left untouched when applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_x: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_y: Option<bool>,
}

impl TransformPatch {
    /// Move only
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Every field taken from `transform`
    pub fn full(transform: &Transform) -> Self {
        Self {
            x: Some(transform.x),
            y: Some(transform.y),
            width: Some(transform.width),
            height: Some(transform.height),
            rotation: Some(transform.rotation),
            scale_x: Some(transform.scale_x),
            scale_y: Some(transform.scale_y),
            flip_x: Some(transform.flip_x),
            flip_y: Some(transform.flip_y),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_size() {
        let t = Transform::new(0.0, 0.0, 100.0, 50.0).with_scale(2.0, 1.0);
        assert_eq!(t.effective_width(), 200.0);
        assert_eq!(t.effective_height(), 50.0);
    }

    #[test]
    fn test_patch_only_touches_present_fields() {
        let mut t = Transform::new(5.0, 6.0, 100.0, 50.0).with_rotation(30.0);
        t.apply(&TransformPatch::position(10.0, 20.0));
        assert_eq!((t.x, t.y), (10.0, 20.0));
        assert_eq!(t.rotation, 30.0);
        assert_eq!(t.width, 100.0);
    }

    #[test]
    fn test_check_rejects_non_positive_scale() {
        assert!(Transform::default().check().is_ok());
        assert!(Transform::default().with_scale(0.0, 1.0).check().is_err());
        assert!(Transform::default().with_scale(1.0, -1.0).check().is_err());
        assert!(Transform::new(f64::NAN, 0.0, 1.0, 1.0).check().is_err());
    }

    #[test]
    fn test_patch_wire_format_omits_absent_fields() {
        let patch = TransformPatch {
            scale_x: Some(2.0),
            flip_y: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"scaleX":2.0,"flipY":true}"#);
        let back: TransformPatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patch);
    }
}

//! Rectangle shape.

use super::{ExtraAttrs, Placement, ShapeId, ShapeStyle, ShapeTrait, is_zero, new_shape_id};
use kurbo::{Rect, RoundedRect};
use serde::{Deserialize, Serialize};

/// A rectangle with optional rounded corners. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    #[serde(default = "new_shape_id")]
    pub(crate) id: ShapeId,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    /// Corner radius (0 = sharp corners).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub corner_radius: f64,
    #[serde(flatten)]
    pub style: ShapeStyle,
    #[serde(flatten)]
    pub extra: ExtraAttrs,
}

impl Rectangle {
    /// Create a new rectangle.
    pub fn new(placement: Placement, width: f64, height: f64) -> Self {
        Self {
            id: new_shape_id(),
            placement,
            width,
            height,
            corner_radius: 0.0,
            style: ShapeStyle::default(),
            extra: ExtraAttrs::new(),
        }
    }

    /// Local outline, clamped so the radius never exceeds half the short side.
    pub fn outline(&self) -> RoundedRect {
        let max_radius = self.width.abs().min(self.height.abs()) / 2.0;
        RoundedRect::from_rect(self.local_bounds(), self.corner_radius.min(max_radius))
    }
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> &str {
        &self.id
    }

    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }

    fn local_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height).abs()
    }
}

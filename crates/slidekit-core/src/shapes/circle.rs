//! Circle shape.

use super::{ExtraAttrs, Placement, ShapeId, ShapeStyle, ShapeTrait, new_shape_id};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A circle positioned by its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circle {
    #[serde(default = "new_shape_id")]
    pub(crate) id: ShapeId,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default)]
    pub radius: f64,
    #[serde(flatten)]
    pub style: ShapeStyle,
    #[serde(flatten)]
    pub extra: ExtraAttrs,
}

impl Circle {
    pub fn new(placement: Placement, radius: f64) -> Self {
        Self {
            id: new_shape_id(),
            placement,
            radius,
            style: ShapeStyle::default(),
            extra: ExtraAttrs::new(),
        }
    }
}

impl ShapeTrait for Circle {
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
        let r = self.radius.abs();
        Rect::from_center_size(Point::ZERO, (r * 2.0, r * 2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_bounds_centered() {
        let circle = Circle::new(Placement::at(50.0, 50.0), 20.0);
        let bounds = circle.local_bounds();
        assert!((bounds.x0 + 20.0).abs() < f64::EPSILON);
        assert!((bounds.width() - 40.0).abs() < f64::EPSILON);
    }
}

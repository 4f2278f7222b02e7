//! Arrow shape.

use super::line::{Endpoint, endpoint, points_bounds};
use super::{ExtraAttrs, Placement, ShapeId, ShapeStyle, ShapeTrait, new_shape_id};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

fn default_pointer() -> f64 {
    Arrow::DEFAULT_POINTER
}

/// A polyline with an arrowhead on its last point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrow {
    #[serde(default = "new_shape_id")]
    pub(crate) id: ShapeId,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default)]
    pub points: Vec<f64>,
    #[serde(default = "default_pointer")]
    pub pointer_length: f64,
    #[serde(default = "default_pointer")]
    pub pointer_width: f64,
    #[serde(flatten)]
    pub style: ShapeStyle,
    #[serde(flatten)]
    pub extra: ExtraAttrs,
}

impl Arrow {
    pub const DEFAULT_POINTER: f64 = 10.0;

    pub fn new(placement: Placement, points: Vec<f64>) -> Self {
        Self {
            id: new_shape_id(),
            placement,
            points,
            pointer_length: Self::DEFAULT_POINTER,
            pointer_width: Self::DEFAULT_POINTER,
            style: ShapeStyle::default(),
            extra: ExtraAttrs::new(),
        }
    }

    /// Unit direction of the final segment, `None` when degenerate.
    fn head_direction(&self) -> Option<Vec2> {
        let n = self.points.len();
        let tip = endpoint(&self.points, Endpoint::End)?;
        let prev = Point::new(self.points[n - 4], self.points[n - 3]);
        let d = tip - prev;
        let len = d.hypot();
        (len > f64::EPSILON).then(|| d / len)
    }

    /// Arrowhead triangle as (tip, left, right) in local coordinates.
    pub fn head(&self) -> Option<[Point; 3]> {
        let tip = endpoint(&self.points, Endpoint::End)?;
        let dir = self.head_direction()?;
        let perp = Vec2::new(-dir.y, dir.x);
        let back = tip - dir * self.pointer_length;
        let half = self.pointer_width / 2.0;
        Some([tip, back + perp * half, back - perp * half])
    }
}

impl ShapeTrait for Arrow {
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
        let half = (self.pointer_width / 2.0).max(self.style.stroke_width.unwrap_or(0.0) / 2.0);
        points_bounds(&self.points).inflate(half, half)
    }
}

//! Line shape and the flat point-list helpers shared with arrows.

use super::{ExtraAttrs, Placement, ShapeId, ShapeStyle, ShapeTrait, new_shape_id};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Which end of a line-like shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    End,
}

/// A flat `[x0, y0, x1, y1, ...]` list is usable when it has even length of at least 4.
pub fn points_well_formed(points: &[f64]) -> bool {
    points.len() >= 4 && points.len() % 2 == 0
}

/// Pair up a flat point list. A trailing odd coordinate is ignored.
pub fn point_pairs(points: &[f64]) -> Vec<Point> {
    points
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

/// Local bounding box of a flat point list.
pub fn points_bounds(points: &[f64]) -> Rect {
    let mut pairs = point_pairs(points).into_iter();
    let Some(first) = pairs.next() else {
        return Rect::ZERO;
    };
    pairs.fold(Rect::from_points(first, first), |acc, p| acc.union_pt(p))
}

/// Read one endpoint of a well-formed point list.
pub fn endpoint(points: &[f64], which: Endpoint) -> Option<Point> {
    if !points_well_formed(points) {
        return None;
    }
    let i = match which {
        Endpoint::Start => 0,
        Endpoint::End => points.len() - 2,
    };
    Some(Point::new(points[i], points[i + 1]))
}

/// Rewrite one endpoint in place; other coordinates are untouched.
pub fn set_endpoint(points: &mut [f64], which: Endpoint, p: Point) -> bool {
    if !points_well_formed(points) {
        return false;
    }
    let i = match which {
        Endpoint::Start => 0,
        Endpoint::End => points.len() - 2,
    };
    points[i] = p.x;
    points[i + 1] = p.y;
    true
}

/// A polyline, positioned by `x`/`y` with points relative to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    #[serde(default = "new_shape_id")]
    pub(crate) id: ShapeId,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default)]
    pub points: Vec<f64>,
    #[serde(flatten)]
    pub style: ShapeStyle,
    #[serde(flatten)]
    pub extra: ExtraAttrs,
}

impl Line {
    pub fn new(placement: Placement, points: Vec<f64>) -> Self {
        Self {
            id: new_shape_id(),
            placement,
            points,
            style: ShapeStyle::default(),
            extra: ExtraAttrs::new(),
        }
    }
}

impl ShapeTrait for Line {
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
        let half = self.style.stroke_width.unwrap_or(0.0) / 2.0;
        points_bounds(&self.points).inflate(half, half)
    }
}

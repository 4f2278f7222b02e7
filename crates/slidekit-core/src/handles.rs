//! Transformer handles around bound shapes.

use crate::shapes::{ScaleRule, Shape, ShapeKind};
use crate::transform::NodeState;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 10.0;
/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 12.0;
/// Distance from the top edge to the rotation handle.
pub const ROTATE_HANDLE_OFFSET: f64 = 50.0;

/// Type of transformer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Corner(Corner),
    Edge(Edge),
    Rotate,
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// A handle with its stage position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a stage point hits this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

const CORNERS: [Corner; 4] = [
    Corner::TopLeft,
    Corner::TopRight,
    Corner::BottomLeft,
    Corner::BottomRight,
];

const EDGES: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];

fn corner_point(b: Rect, corner: Corner) -> Point {
    match corner {
        Corner::TopLeft => Point::new(b.x0, b.y0),
        Corner::TopRight => Point::new(b.x1, b.y0),
        Corner::BottomLeft => Point::new(b.x0, b.y1),
        Corner::BottomRight => Point::new(b.x1, b.y1),
    }
}

fn edge_point(b: Rect, edge: Edge) -> Point {
    let c = b.center();
    match edge {
        Edge::Top => Point::new(c.x, b.y0),
        Edge::Right => Point::new(b.x1, c.y),
        Edge::Bottom => Point::new(c.x, b.y1),
        Edge::Left => Point::new(b.x0, c.y),
    }
}

/// Which handles a kind exposes.
pub fn handle_kinds(kind: ShapeKind) -> Vec<HandleKind> {
    let corners = CORNERS.iter().map(|c| HandleKind::Corner(*c));
    match kind {
        ShapeKind::Line | ShapeKind::Arrow => Vec::new(),
        ShapeKind::Circle | ShapeKind::Group => {
            corners.chain(std::iter::once(HandleKind::Rotate)).collect()
        }
        _ => corners
            .chain(EDGES.iter().map(|e| HandleKind::Edge(*e)))
            .chain(std::iter::once(HandleKind::Rotate))
            .collect(),
    }
}

/// Handles for a shape whose local space maps to the stage through `to_stage`.
pub fn handles_for(shape: &Shape, to_stage: Affine) -> Vec<Handle> {
    let local = shape.local_bounds();
    handle_kinds(shape.kind())
        .into_iter()
        .map(|kind| {
            let position = match kind {
                HandleKind::Corner(c) => to_stage * corner_point(local, c),
                HandleKind::Edge(e) => to_stage * edge_point(local, e),
                HandleKind::Rotate => rotate_handle_position(local, to_stage),
            };
            Handle::new(position, kind)
        })
        .collect()
}

fn rotate_handle_position(local: Rect, to_stage: Affine) -> Point {
    let top = to_stage * edge_point(local, Edge::Top);
    let center = to_stage * local.center();
    let up = top - center;
    let dir = if up.hypot() > f64::EPSILON {
        up.normalize()
    } else {
        Vec2::new(0.0, -1.0)
    };
    top + dir * ROTATE_HANDLE_OFFSET
}

/// Find which handle (if any) is hit at the given point.
pub fn hit_test_handles(handles: &[Handle], point: Point, tolerance: f64) -> Option<HandleKind> {
    handles
        .iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

/// Live node state produced by dragging `handle` of `original` to `pointer`.
///
/// `pointer` is in the shape's parent space. Corner drags on radius and
/// free-scale kinds keep the aspect ratio. Returns `None` for handles the
/// kind does not have.
pub fn drag_handle(original: &Shape, handle: HandleKind, pointer: Point) -> Option<NodeState> {
    if !handle_kinds(original.kind()).contains(&handle) {
        return None;
    }
    let p = original.placement();
    let frame = Affine::translate((p.x, p.y)) * Affine::rotate(p.rotation.to_radians());
    let local = original.local_bounds();
    let scaled = Rect::new(
        local.x0 * p.scale_x,
        local.y0 * p.scale_y,
        local.x1 * p.scale_x,
        local.y1 * p.scale_y,
    )
    .abs();

    if handle == HandleKind::Rotate {
        let center = frame * scaled.center();
        let d = pointer - center;
        let rotation = d.y.atan2(d.x).to_degrees() + 90.0;
        let offset = Affine::rotate(rotation.to_radians()) * scaled.center();
        let origin = center - offset.to_vec2();
        return Some(NodeState {
            x: origin.x,
            y: origin.y,
            rotation,
            scale_x: p.scale_x,
            scale_y: p.scale_y,
        });
    }

    if scaled.width() <= f64::EPSILON || scaled.height() <= f64::EPSILON {
        return None;
    }
    let q = frame.inverse() * pointer;
    let mut next = scaled;
    match handle {
        HandleKind::Corner(c) => {
            let anchor = match c {
                Corner::TopLeft => corner_point(scaled, Corner::BottomRight),
                Corner::TopRight => corner_point(scaled, Corner::BottomLeft),
                Corner::BottomLeft => corner_point(scaled, Corner::TopRight),
                Corner::BottomRight => corner_point(scaled, Corner::TopLeft),
            };
            next = Rect::from_points(anchor, q);
            if original.kind().scale_rule() != ScaleRule::BakeSize {
                let ratio = (next.width() / scaled.width()).max(next.height() / scaled.height());
                let w = scaled.width() * ratio;
                let h = scaled.height() * ratio;
                let x0 = if q.x < anchor.x { anchor.x - w } else { anchor.x };
                let y0 = if q.y < anchor.y { anchor.y - h } else { anchor.y };
                next = Rect::new(x0, y0, x0 + w, y0 + h);
            }
        }
        HandleKind::Edge(Edge::Top) => next.y0 = q.y.min(scaled.y1),
        HandleKind::Edge(Edge::Bottom) => next.y1 = q.y.max(scaled.y0),
        HandleKind::Edge(Edge::Left) => next.x0 = q.x.min(scaled.x1),
        HandleKind::Edge(Edge::Right) => next.x1 = q.x.max(scaled.x0),
        HandleKind::Rotate => {}
    }

    let rx = next.width() / scaled.width();
    let ry = next.height() / scaled.height();
    let origin_in_frame = Point::new(
        next.x0 - scaled.x0 * rx,
        next.y0 - scaled.y0 * ry,
    );
    let origin = frame * origin_in_frame;
    Some(NodeState {
        x: origin.x,
        y: origin.y,
        rotation: p.rotation,
        scale_x: p.scale_x * rx,
        scale_y: p.scale_y * ry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Arrow, Circle, Placement, Rectangle};

    fn rect_at(x: f64, y: f64, w: f64, h: f64) -> Shape {
        Shape::Rect(Rectangle::new(Placement::at(x, y), w, h))
    }

    #[test]
    fn test_handle_sets_per_kind() {
        assert_eq!(handle_kinds(ShapeKind::Rect).len(), 9);
        assert_eq!(handle_kinds(ShapeKind::Circle).len(), 5);
        assert!(handle_kinds(ShapeKind::Arrow).is_empty());
        let arrow = Shape::Arrow(Arrow::new(Placement::default(), vec![0.0, 0.0, 1.0, 1.0]));
        assert!(handles_for(&arrow, Affine::IDENTITY).is_empty());
    }

    #[test]
    fn test_rect_handles_positions() {
        let shape = rect_at(100.0, 100.0, 200.0, 100.0);
        let handles = handles_for(&shape, shape.local_transform());
        let br = handles
            .iter()
            .find(|h| h.kind == HandleKind::Corner(Corner::BottomRight))
            .unwrap();
        assert_eq!(br.position, Point::new(300.0, 200.0));
        let rotate = handles.iter().find(|h| h.kind == HandleKind::Rotate).unwrap();
        assert!((rotate.position.x - 200.0).abs() < 1e-9);
        assert!((rotate.position.y - (100.0 - ROTATE_HANDLE_OFFSET)).abs() < 1e-9);
        assert_eq!(
            hit_test_handles(&handles, Point::new(302.0, 199.0), HANDLE_HIT_TOLERANCE),
            Some(HandleKind::Corner(Corner::BottomRight))
        );
    }

    #[test]
    fn test_drag_bottom_right_doubles_width() {
        let shape = rect_at(100.0, 100.0, 200.0, 100.0);
        let state =
            drag_handle(&shape, HandleKind::Corner(Corner::BottomRight), Point::new(500.0, 200.0))
                .unwrap();
        assert!((state.scale_x - 2.0).abs() < 1e-9);
        assert!((state.scale_y - 1.0).abs() < 1e-9);
        assert!((state.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_left_edge_moves_origin() {
        let shape = rect_at(100.0, 100.0, 200.0, 100.0);
        let state =
            drag_handle(&shape, HandleKind::Edge(Edge::Left), Point::new(0.0, 150.0)).unwrap();
        assert!((state.x - 0.0).abs() < 1e-9);
        assert!((state.scale_x - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_circle_corner_is_uniform() {
        let shape = Shape::Circle(Circle::new(Placement::at(100.0, 100.0), 50.0));
        let state =
            drag_handle(&shape, HandleKind::Corner(Corner::BottomRight), Point::new(250.0, 160.0))
                .unwrap();
        assert!((state.scale_x - state.scale_y).abs() < 1e-9);
        assert!((state.scale_x - 2.0).abs() < 1e-9);
        // Anchor (top-left of the box) stays put: center moves by one radius.
        assert!((state.x - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_handle_to_the_right_is_90_degrees() {
        let shape = rect_at(0.0, 0.0, 100.0, 100.0);
        let state = drag_handle(&shape, HandleKind::Rotate, Point::new(200.0, 50.0)).unwrap();
        assert!((state.rotation - 90.0).abs() < 1e-9);
        // Rotation is about the center, so the origin swings to the top-right.
        assert!((state.x - 100.0).abs() < 1e-9);
        assert!((state.y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_edge_handles_on_circle() {
        let shape = Shape::Circle(Circle::new(Placement::at(0.0, 0.0), 5.0));
        assert!(drag_handle(&shape, HandleKind::Edge(Edge::Top), Point::ZERO).is_none());
    }
}

//! Snapping a dragged shape to stage and sibling alignment lines.

use crate::scene::SceneTree;
use kurbo::{Line, Point, Rect};

/// Distance in stage pixels under which an edge snaps.
pub const SNAP_THRESHOLD: f64 = 5.0;

/// Guide orientation. A vertical guide is an x position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Which edge of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Start,
    Center,
    End,
}

/// One edge of the dragged shape, relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DraggedEdge {
    pub kind: EdgeKind,
    /// Edge position minus anchor position.
    pub offset: f64,
}

/// Alignment candidates for one drag.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapGuides {
    /// Stage edges/center plus other shapes' left/center/right.
    pub vertical_stops: Vec<f64>,
    /// Stage edges/center plus other shapes' top/center/bottom.
    pub horizontal_stops: Vec<f64>,
    pub x_edges: [DraggedEdge; 3],
    pub y_edges: [DraggedEdge; 3],
    stage: Rect,
}

/// A guide line to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guide {
    pub axis: Axis,
    pub position: f64,
    /// Which dragged edge matched.
    pub edge: EdgeKind,
}

impl Guide {
    /// Full-span line across the stage.
    pub fn line(&self, stage: Rect) -> Line {
        match self.axis {
            Axis::Vertical => Line::new((self.position, stage.y0), (self.position, stage.y1)),
            Axis::Horizontal => Line::new((stage.x0, self.position), (stage.x1, self.position)),
        }
    }
}

/// Result of a snap operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// Adjusted anchor position.
    pub position: Point,
    pub vertical: Option<Guide>,
    pub horizontal: Option<Guide>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(position: Point) -> Self {
        Self {
            position,
            vertical: None,
            horizontal: None,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.vertical.is_some() || self.horizontal.is_some()
    }
}

fn stops(start: f64, end: f64) -> [f64; 3] {
    [start, (start + end) / 2.0, end]
}

fn edges(start: f64, end: f64, anchor: f64) -> [DraggedEdge; 3] {
    let [s, c, e] = stops(start, end);
    [
        DraggedEdge { kind: EdgeKind::Start, offset: s - anchor },
        DraggedEdge { kind: EdgeKind::Center, offset: c - anchor },
        DraggedEdge { kind: EdgeKind::End, offset: e - anchor },
    ]
}

/// Closest (stop, edge) pair within the threshold: returns (snapped anchor, guide position, edge).
fn best_match(
    anchor: f64,
    stops: &[f64],
    edges: &[DraggedEdge; 3],
    threshold: f64,
) -> Option<(f64, f64, EdgeKind)> {
    let mut best: Option<(f64, f64, f64, EdgeKind)> = None;
    for &stop in stops {
        for edge in edges {
            let diff = (stop - (anchor + edge.offset)).abs();
            if diff < threshold && best.is_none_or(|(d, ..)| diff < d) {
                best = Some((diff, stop - edge.offset, stop, edge.kind));
            }
        }
    }
    best.map(|(_, snapped, stop, kind)| (snapped, stop, kind))
}

/// Computes candidate lines and tracks the guides currently shown.
#[derive(Debug, Clone)]
pub struct SnappingEngine {
    threshold: f64,
    active: Vec<Guide>,
}

impl Default for SnappingEngine {
    fn default() -> Self {
        Self::new(SNAP_THRESHOLD)
    }
}

impl SnappingEngine {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            active: Vec::new(),
        }
    }

    /// Collect alignment candidates for dragging a top-level shape.
    ///
    /// Returns `None` when the id is not a top-level shape of the tree.
    pub fn compute_guides(&self, tree: &SceneTree, dragged_id: &str) -> Option<SnapGuides> {
        let dragged = tree.shapes().find(|s| s.id() == dragged_id)?;
        let stage = tree.stage_rect();
        let mut vertical_stops = stops(stage.x0, stage.x1).to_vec();
        let mut horizontal_stops = stops(stage.y0, stage.y1).to_vec();
        for other in tree.shapes().filter(|s| s.id() != dragged_id) {
            let b = other.bounds();
            vertical_stops.extend(stops(b.x0, b.x1));
            horizontal_stops.extend(stops(b.y0, b.y1));
        }
        let own = dragged.bounds();
        let anchor = dragged.placement();
        Some(SnapGuides {
            vertical_stops,
            horizontal_stops,
            x_edges: edges(own.x0, own.x1, anchor.x),
            y_edges: edges(own.y0, own.y1, anchor.y),
            stage,
        })
    }

    /// Snap an anchor position, per axis independently, and remember the guides.
    pub fn apply_snap(&mut self, position: Point, guides: &SnapGuides) -> SnapResult {
        let mut result = SnapResult::none(position);
        if let Some((x, stop, edge)) =
            best_match(position.x, &guides.vertical_stops, &guides.x_edges, self.threshold)
        {
            result.position.x = x;
            result.vertical = Some(Guide { axis: Axis::Vertical, position: stop, edge });
        }
        if let Some((y, stop, edge)) =
            best_match(position.y, &guides.horizontal_stops, &guides.y_edges, self.threshold)
        {
            result.position.y = y;
            result.horizontal = Some(Guide { axis: Axis::Horizontal, position: stop, edge });
        }
        self.active = result.vertical.into_iter().chain(result.horizontal).collect();
        result
    }

    /// Guides to draw right now.
    pub fn active_guides(&self) -> &[Guide] {
        &self.active
    }

    /// Full-span guide lines for the given stage.
    pub fn guide_lines(&self, guides: &SnapGuides) -> Vec<Line> {
        self.active.iter().map(|g| g.line(guides.stage)).collect()
    }

    pub fn clear_guides(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Placement, Rectangle, Shape};

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> Shape {
        let mut r = Rectangle::new(Placement::at(x, y), w, h);
        r.id = id.to_string();
        Shape::Rect(r)
    }

    fn tree() -> SceneTree {
        let mut tree = SceneTree::new(1000.0, 800.0, "#fff");
        tree.add_shape(rect("dragged", 300.0, 300.0, 100.0, 50.0));
        tree.add_shape(rect("sibling", 200.0, 600.0, 80.0, 80.0));
        tree
    }

    #[test]
    fn test_left_edge_snaps_to_sibling() {
        let tree = tree();
        let mut engine = SnappingEngine::default();
        let guides = engine.compute_guides(&tree, "dragged").unwrap();
        let result = engine.apply_snap(Point::new(203.0, 120.0), &guides);
        assert!((result.position.x - 200.0).abs() < f64::EPSILON);
        let guide = result.vertical.unwrap();
        assert_eq!(guide.edge, EdgeKind::Start);
        assert!((guide.position - 200.0).abs() < f64::EPSILON);
        assert!(result.horizontal.is_none());
        assert_eq!(engine.active_guides().len(), 1);
    }

    #[test]
    fn test_center_snaps_to_stage_center() {
        let tree = tree();
        let mut engine = SnappingEngine::default();
        let guides = engine.compute_guides(&tree, "dragged").unwrap();
        // Center of a 100px box at x=448 is 498, two pixels from the stage center.
        let result = engine.apply_snap(Point::new(448.0, 120.0), &guides);
        assert!((result.position.x - 450.0).abs() < f64::EPSILON);
        assert_eq!(result.vertical.unwrap().edge, EdgeKind::Center);
    }

    #[test]
    fn test_far_position_untouched() {
        let tree = tree();
        let mut engine = SnappingEngine::default();
        let guides = engine.compute_guides(&tree, "dragged").unwrap();
        let p = Point::new(130.0, 130.0);
        let result = engine.apply_snap(p, &guides);
        assert_eq!(result.position, p);
        assert!(!result.is_snapped());
        assert!(engine.active_guides().is_empty());
    }

    #[test]
    fn test_dragged_shape_excluded_from_stops() {
        let tree = tree();
        let engine = SnappingEngine::default();
        let guides = engine.compute_guides(&tree, "dragged").unwrap();
        // Stage (3) plus one sibling (3).
        assert_eq!(guides.vertical_stops.len(), 6);
        assert!(!guides.vertical_stops.contains(&300.0));
    }

    #[test]
    fn test_circle_offsets_from_center_anchor() {
        let mut tree = SceneTree::new(1000.0, 800.0, "#fff");
        let mut circle = Circle::new(Placement::at(100.0, 100.0), 20.0);
        circle.id = "c".to_string();
        tree.add_shape(Shape::Circle(circle));
        let mut engine = SnappingEngine::default();
        let guides = engine.compute_guides(&tree, "c").unwrap();
        // Left edge at anchor - 20 lands on the stage edge.
        let result = engine.apply_snap(Point::new(22.0, 400.0), &guides);
        assert!((result.position.x - 20.0).abs() < f64::EPSILON);
        assert!((result.position.y - 400.0).abs() < f64::EPSILON);
        engine.clear_guides();
        assert!(engine.active_guides().is_empty());
    }
}

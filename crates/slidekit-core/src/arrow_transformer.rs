//! Endpoint handles for a single selected arrow.

use crate::attrs::AttrPatch;
use crate::scene::SceneTree;
use crate::shapes::{Endpoint, Shape, ShapeId, endpoint, set_endpoint};
use kurbo::Point;

/// Two draggable anchors bound to the first and last point of an arrow.
///
/// Anchor positions are in stage coordinates. While an anchor is dragged
/// they follow the pointer; on release they are recomputed from the tree.
#[derive(Debug, Clone, Default)]
pub struct ArrowTransformer {
    target: Option<ShapeId>,
    anchors: Option<[Point; 2]>,
    dragging: Option<Endpoint>,
}

fn anchors_of(tree: &SceneTree, id: &str) -> Option<[Point; 2]> {
    let Some(Shape::Arrow(arrow)) = tree.find(id) else {
        return None;
    };
    let to_stage = tree.absolute_transform(id)?;
    let start = endpoint(&arrow.points, Endpoint::Start)?;
    let end = endpoint(&arrow.points, Endpoint::End)?;
    Some([to_stage * start, to_stage * end])
}

impl ArrowTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate when the selection is exactly one arrow, deactivate otherwise.
    pub fn bind(&mut self, tree: &SceneTree, selection: &[ShapeId]) -> bool {
        self.dragging = None;
        let target = match selection {
            [id] if matches!(tree.find(id), Some(Shape::Arrow(_))) => Some(id.clone()),
            _ => None,
        };
        self.anchors = target.as_deref().and_then(|id| anchors_of(tree, id));
        if self.anchors.is_none() {
            self.target = None;
            return false;
        }
        self.target = target;
        true
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    pub fn anchor(&self, which: Endpoint) -> Option<Point> {
        let [start, end] = self.anchors?;
        Some(match which {
            Endpoint::Start => start,
            Endpoint::End => end,
        })
    }

    /// Which anchor, if any, lies within `tolerance` of a stage point.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> Option<Endpoint> {
        [Endpoint::Start, Endpoint::End].into_iter().find(|which| {
            self.anchor(*which)
                .is_some_and(|a| (a - point).hypot2() <= tolerance * tolerance)
        })
    }

    /// Move one anchor to a stage point. Returns the points patch for the
    /// target arrow, with only that endpoint's coordinates changed.
    pub fn drag_to(&mut self, tree: &SceneTree, which: Endpoint, pointer: Point) -> Option<AttrPatch> {
        let id = self.target.as_deref()?;
        let Some(Shape::Arrow(arrow)) = tree.find(id) else {
            log::debug!("arrow {id} no longer in tree, ignoring anchor drag");
            return None;
        };
        let to_stage = tree.absolute_transform(id)?;
        if to_stage.determinant().abs() < f64::EPSILON {
            return None;
        }
        let local = to_stage.inverse() * pointer;
        let mut points = arrow.points.clone();
        if !set_endpoint(&mut points, which, local) {
            return None;
        }
        self.dragging = Some(which);
        if let Some(anchors) = &mut self.anchors {
            match which {
                Endpoint::Start => anchors[0] = pointer,
                Endpoint::End => anchors[1] = pointer,
            }
        }
        Some(AttrPatch {
            points: Some(points),
            ..AttrPatch::default()
        })
    }

    /// End an anchor drag and resync anchors with the tree.
    pub fn release(&mut self, tree: &SceneTree) {
        self.dragging = None;
        if let Some(id) = self.target.as_deref() {
            self.anchors = anchors_of(tree, id);
            if self.anchors.is_none() {
                self.target = None;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

//! Transform engine: turns live node states into normalized attribute updates.
//!
//! The rendering surface reports raw per-node states (position, rotation and
//! scale) while the user drags a shape body or a transformer handle. The
//! engine derives the persisted attributes from the session's original
//! shapes, folding scale into size for kinds that must not keep a standing
//! scale factor.

use crate::attrs::{AttrPatch, BatchUpdate};
use crate::handles::{Handle, handles_for};
use crate::scene::SceneTree;
use crate::shapes::{ScaleRule, Shape, ShapeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Live transform state of a node as reported by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeState {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "crate::shapes::one")]
    pub scale_x: f64,
    #[serde(default = "crate::shapes::one")]
    pub scale_y: f64,
}

impl NodeState {
    /// Current state of a shape.
    pub fn of(shape: &Shape) -> Self {
        let p = shape.placement();
        Self {
            x: p.x,
            y: p.y,
            rotation: p.rotation,
            scale_x: p.scale_x,
            scale_y: p.scale_y,
        }
    }

    /// Same state with the scale multiplied.
    pub fn scaled(self, sx: f64, sy: f64) -> Self {
        Self {
            scale_x: self.scale_x * sx,
            scale_y: self.scale_y * sy,
            ..self
        }
    }
}

/// Interaction phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformPhase {
    #[default]
    Idle,
    /// Shape bodies are being moved.
    Dragging,
    /// Handles are resizing or rotating the bound shapes.
    Transforming,
}

/// How a finished session is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// Pure translation: persisted without a history entry.
    Drag,
    /// Resize or rotate: persisted with a history entry.
    Transform,
}

/// Normalizes transform sessions over the bound shapes.
#[derive(Debug, Default)]
pub struct TransformEngine {
    phase: TransformPhase,
    bound: Vec<ShapeId>,
    handles_visible: bool,
    originals: HashMap<ShapeId, Shape>,
    last_accepted: HashMap<ShapeId, AttrPatch>,
    min_resize: f64,
}

impl TransformEngine {
    pub fn new(min_resize: f64) -> Self {
        Self {
            min_resize,
            handles_visible: true,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> TransformPhase {
        self.phase
    }

    /// Ids currently attached to the transformer.
    pub fn bound_ids(&self) -> &[ShapeId] {
        &self.bound
    }

    pub fn is_bound(&self, id: &str) -> bool {
        self.bound.iter().any(|b| b == id)
    }

    pub fn handles_visible(&self) -> bool {
        self.handles_visible
    }

    /// Rebind to the selection. Ids missing from the tree are not bound;
    /// handles hide while the text being edited is among the bound shapes.
    pub fn bind(&mut self, tree: &SceneTree, selection: &[ShapeId], editing: Option<&str>) {
        self.bound = selection
            .iter()
            .filter(|id| tree.contains(id))
            .cloned()
            .collect();
        self.handles_visible = !editing.is_some_and(|id| self.is_bound(id));
        log::debug!(
            "transformer bound to {} node(s), handles {}",
            self.bound.len(),
            if self.handles_visible { "shown" } else { "hidden" }
        );
    }

    /// Handles for a single bound shape.
    pub fn handles(&self, tree: &SceneTree) -> Vec<Handle> {
        if !self.handles_visible || self.bound.len() != 1 {
            return Vec::new();
        }
        let id = &self.bound[0];
        match (tree.find(id), tree.absolute_transform(id)) {
            (Some(shape), Some(to_stage)) => handles_for(shape, to_stage),
            _ => Vec::new(),
        }
    }

    fn begin(&mut self, tree: &SceneTree, phase: TransformPhase) -> bool {
        self.originals = self
            .bound
            .iter()
            .filter_map(|id| tree.find(id).map(|s| (id.clone(), s.clone())))
            .collect();
        self.last_accepted.clear();
        if self.originals.is_empty() {
            log::debug!("transform ignored: no bound nodes");
            self.phase = TransformPhase::Idle;
            return false;
        }
        self.phase = phase;
        true
    }

    /// Start moving the bound shapes.
    pub fn begin_drag(&mut self, tree: &SceneTree) -> bool {
        self.begin(tree, TransformPhase::Dragging)
    }

    /// Start a handle transform on the bound shapes.
    pub fn begin_transform(&mut self, tree: &SceneTree) -> bool {
        self.begin(tree, TransformPhase::Transforming)
    }

    /// Snapshot of a shape taken when the session began.
    pub fn original(&self, id: &str) -> Option<&Shape> {
        self.originals.get(id)
    }

    pub fn originals(&self) -> impl Iterator<Item = &Shape> {
        self.originals.values()
    }

    fn derive_one(&mut self, id: &str, state: &NodeState) -> Option<AttrPatch> {
        let Some(original) = self.originals.get(id) else {
            log::debug!("no bound node for {id}, skipping");
            return None;
        };
        if self.phase == TransformPhase::Dragging {
            return Some(AttrPatch::position(state.x, state.y));
        }

        let mut patch = AttrPatch {
            x: Some(state.x),
            y: Some(state.y),
            rotation: Some(state.rotation),
            ..AttrPatch::default()
        };
        let too_small = match original.kind().scale_rule() {
            ScaleRule::BakeSize => {
                let local = original.local_bounds();
                let width = local.width() * state.scale_x.abs();
                let height = local.height() * state.scale_y.abs();
                patch.width = Some(width);
                patch.height = Some(height);
                patch.scale_x = Some(1.0);
                patch.scale_y = Some(1.0);
                width < self.min_resize || height < self.min_resize
            }
            ScaleRule::BakeRadius => {
                let radius = match original {
                    Shape::Circle(c) => c.radius,
                    _ => 0.0,
                };
                let radius = radius * state.scale_x.abs().max(state.scale_y.abs());
                patch.radius = Some(radius);
                patch.scale_x = Some(1.0);
                patch.scale_y = Some(1.0);
                radius * 2.0 < self.min_resize
            }
            ScaleRule::Keep => {
                patch.scale_x = Some(state.scale_x);
                patch.scale_y = Some(state.scale_y);
                false
            }
        };

        if too_small {
            log::debug!("resize of {id} below minimum, keeping previous box");
            return Some(
                self.last_accepted
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| AttrPatch::geometry_of(original)),
            );
        }
        self.last_accepted.insert(id.to_string(), patch.clone());
        Some(patch)
    }

    fn derive(&mut self, states: &[(ShapeId, NodeState)]) -> BatchUpdate {
        states
            .iter()
            .filter_map(|(id, state)| self.derive_one(id, state).map(|p| (id.clone(), p)))
            .collect()
    }

    /// Continuous frame: attributes for the fast cache only.
    pub fn update(&mut self, states: &[(ShapeId, NodeState)]) -> Option<BatchUpdate> {
        if self.phase == TransformPhase::Idle {
            return None;
        }
        let batch = self.derive(states);
        (!batch.is_empty()).then_some(batch)
    }

    /// Release: final attributes and how to commit them. Ends the session.
    pub fn end(&mut self, states: &[(ShapeId, NodeState)]) -> Option<(BatchUpdate, CommitKind)> {
        let kind = match self.phase {
            TransformPhase::Idle => return None,
            TransformPhase::Dragging => CommitKind::Drag,
            TransformPhase::Transforming => CommitKind::Transform,
        };
        let batch = self.derive(states);
        self.cancel();
        (!batch.is_empty()).then_some((batch, kind))
    }

    /// Drop the session without producing a commit.
    pub fn cancel(&mut self) {
        self.phase = TransformPhase::Idle;
        self.originals.clear();
        self.last_accepted.clear();
    }

    /// Detach from every node and drop any session.
    pub fn unbind(&mut self) {
        self.cancel();
        self.bound.clear();
        self.handles_visible = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Arrow, Circle, Placement, Rectangle, Text};

    fn tree_with(shapes: Vec<Shape>) -> SceneTree {
        let mut tree = SceneTree::new(1920.0, 1080.0, "#ffffff");
        for shape in shapes {
            tree.add_shape(shape);
        }
        tree
    }

    fn engine_for(tree: &SceneTree, ids: &[&str]) -> TransformEngine {
        let mut engine = TransformEngine::new(5.0);
        let ids: Vec<ShapeId> = ids.iter().map(|s| s.to_string()).collect();
        engine.bind(tree, &ids, None);
        engine
    }

    fn rect(id: &str, w: f64, h: f64) -> Shape {
        let mut r = Rectangle::new(Placement::at(100.0, 100.0), w, h);
        r.id = id.to_string();
        Shape::Rect(r)
    }

    #[test]
    fn test_commit_bakes_scale_into_size() {
        let mut tree = tree_with(vec![rect("r", 200.0, 100.0)]);
        let mut engine = engine_for(&tree, &["r"]);
        assert!(engine.begin_transform(&tree));
        let state = NodeState::of(tree.find("r").unwrap()).scaled(2.0, 1.5);
        let (batch, kind) = engine.end(&[("r".to_string(), state)]).unwrap();
        assert_eq!(kind, CommitKind::Transform);
        tree.apply_batch(&batch);
        match tree.find("r").unwrap() {
            Shape::Rect(r) => {
                assert!((r.width - 400.0).abs() < 1e-9);
                assert!((r.height - 150.0).abs() < 1e-9);
                assert!((r.placement.scale_x - 1.0).abs() < f64::EPSILON);
                assert!((r.placement.scale_y - 1.0).abs() < f64::EPSILON);
            }
            _ => unreachable!(),
        }
        assert_eq!(engine.phase(), TransformPhase::Idle);
    }

    #[test]
    fn test_continuous_frames_derive_from_originals() {
        let tree = tree_with(vec![rect("r", 200.0, 100.0)]);
        let mut engine = engine_for(&tree, &["r"]);
        engine.begin_transform(&tree);
        let base = NodeState::of(tree.find("r").unwrap());
        for _ in 0..3 {
            let batch = engine.update(&[("r".to_string(), base.scaled(1.5, 1.0))]).unwrap();
            assert_eq!(batch[0].1.width, Some(300.0));
        }
    }

    #[test]
    fn test_circle_radius_uses_larger_axis() {
        let mut circle = Circle::new(Placement::at(50.0, 50.0), 40.0);
        circle.id = "c".to_string();
        let tree = tree_with(vec![Shape::Circle(circle)]);
        let mut engine = engine_for(&tree, &["c"]);
        engine.begin_transform(&tree);
        let state = NodeState::of(tree.find("c").unwrap()).scaled(-0.5, 1.25);
        let (batch, _) = engine.end(&[("c".to_string(), state)]).unwrap();
        let patch = &batch[0].1;
        assert_eq!(patch.radius, Some(50.0));
        assert_eq!(patch.scale_x, Some(1.0));
    }

    #[test]
    fn test_arrow_keeps_scale() {
        let mut arrow = Arrow::new(Placement::at(0.0, 0.0), vec![0.0, 0.0, 100.0, 0.0]);
        arrow.id = "a".to_string();
        let tree = tree_with(vec![Shape::Arrow(arrow)]);
        let mut engine = engine_for(&tree, &["a"]);
        engine.begin_transform(&tree);
        let state = NodeState::of(tree.find("a").unwrap()).scaled(2.0, 3.0);
        let (batch, _) = engine.end(&[("a".to_string(), state)]).unwrap();
        assert_eq!(batch[0].1.scale_x, Some(2.0));
        assert_eq!(batch[0].1.scale_y, Some(3.0));
        assert!(batch[0].1.width.is_none());
    }

    #[test]
    fn test_tiny_resize_keeps_previous_box() {
        let tree = tree_with(vec![rect("r", 200.0, 100.0)]);
        let mut engine = engine_for(&tree, &["r"]);
        engine.begin_transform(&tree);
        let base = NodeState::of(tree.find("r").unwrap());
        engine.update(&[("r".to_string(), base.scaled(0.5, 1.0))]);
        let batch = engine.update(&[("r".to_string(), base.scaled(0.01, 1.0))]).unwrap();
        assert_eq!(batch[0].1.width, Some(100.0));
    }

    #[test]
    fn test_drag_commit_is_position_only() {
        let tree = tree_with(vec![rect("r", 200.0, 100.0)]);
        let mut engine = engine_for(&tree, &["r"]);
        engine.begin_drag(&tree);
        let mut state = NodeState::of(tree.find("r").unwrap());
        state.x += 30.0;
        let (batch, kind) = engine.end(&[("r".to_string(), state)]).unwrap();
        assert_eq!(kind, CommitKind::Drag);
        assert_eq!(batch[0].1, AttrPatch::position(130.0, 100.0));
    }

    #[test]
    fn test_unbound_node_is_noop() {
        let tree = tree_with(vec![rect("r", 200.0, 100.0)]);
        let mut engine = engine_for(&tree, &["r"]);
        engine.begin_transform(&tree);
        let state = NodeState::of(tree.find("r").unwrap());
        assert!(engine.update(&[("ghost".to_string(), state)]).is_none());

        let mut unbound = engine_for(&tree, &["ghost"]);
        assert!(unbound.bound_ids().is_empty());
        assert!(!unbound.begin_transform(&tree));
        assert!(unbound.end(&[]).is_none());
    }

    #[test]
    fn test_multi_select_produces_one_batch() {
        let mut text = Text::new(Placement::at(0.0, 0.0), "hi".to_string());
        text.id = "t".to_string();
        text.width = 100.0;
        text.height = 40.0;
        let tree = tree_with(vec![rect("r", 200.0, 100.0), Shape::Text(text)]);
        let mut engine = engine_for(&tree, &["r", "t"]);
        engine.begin_transform(&tree);
        let states: Vec<_> = ["r", "t"]
            .iter()
            .map(|id| (id.to_string(), NodeState::of(tree.find(id).unwrap()).scaled(2.0, 2.0)))
            .collect();
        let (batch, _) = engine.end(&states).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].1.width, Some(200.0));
        assert_eq!(batch[1].1.height, Some(80.0));
    }

    #[test]
    fn test_handles_hidden_while_editing() {
        let tree = tree_with(vec![rect("r", 200.0, 100.0)]);
        let mut engine = TransformEngine::new(5.0);
        engine.bind(&tree, &["r".to_string()], Some("r"));
        assert!(!engine.handles_visible());
        assert!(engine.handles(&tree).is_empty());
        engine.bind(&tree, &["r".to_string()], None);
        assert_eq!(engine.handles(&tree).len(), 9);
    }
}

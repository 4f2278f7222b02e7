//! Scene tree: Stage → Layer → Shape.
//!
//! A [`SceneTree`] is a plain value. Edits happen on a clone that then
//! replaces the cached tree wholesale (see [`crate::cache`]).

use crate::attrs::{AttrPatch, BatchUpdate};
use crate::record::{NodeRecord, from_attrs, to_attrs};
use crate::shapes::{ExtraAttrs, Shape, ShapeId, new_shape_id};
use kurbo::{Affine, Rect};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Errors from loading or restructuring a scene tree.
#[derive(Debug, Error)]
pub enum SceneError {
    /// A node's `className` names no known kind.
    #[error("unknown node kind: {0}")]
    UnknownKind(String),

    /// A node sits where another kind was required.
    #[error("expected a {expected} node, found {found}")]
    UnexpectedNode {
        expected: &'static str,
        found: String,
    },

    /// JSON (de)serialization failure.
    #[error("invalid scene JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A reorder list is not a permutation of the current order.
    #[error("invalid reorder: {0}")]
    InvalidReorder(String),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Ordered group of shapes. Later shapes paint on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeRecord", into = "NodeRecord")]
pub struct Layer {
    pub shapes: Vec<Shape>,
    /// Layer attributes (name, id, ...) kept as persisted.
    pub extra: ExtraAttrs,
}

impl TryFrom<NodeRecord> for Layer {
    type Error = SceneError;

    fn try_from(record: NodeRecord) -> SceneResult<Self> {
        record.expect_class("Layer")?;
        let shapes = record
            .children
            .unwrap_or_default()
            .into_iter()
            .map(Shape::try_from)
            .collect::<SceneResult<Vec<_>>>()?;
        Ok(Self {
            shapes,
            extra: record.attrs,
        })
    }
}

impl From<Layer> for NodeRecord {
    fn from(layer: Layer) -> Self {
        let children = layer.shapes.into_iter().map(NodeRecord::from).collect();
        NodeRecord::new("Layer", layer.extra).with_children(children)
    }
}

fn default_background() -> String {
    SceneTree::DEFAULT_BACKGROUND.to_string()
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageAttrs {
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default = "default_background")]
    background_color: String,
    #[serde(flatten)]
    extra: ExtraAttrs,
}

/// A shape together with its stage-space bounding box and enclosing groups.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeBounds {
    pub id: ShapeId,
    pub bounds: Rect,
    /// Enclosing group ids, outermost first.
    pub ancestors: Vec<ShapeId>,
}

/// Root of a slide's composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeRecord", into = "NodeRecord")]
pub struct SceneTree {
    pub width: f64,
    pub height: f64,
    pub background_color: String,
    pub layers: Vec<Layer>,
    pub extra: ExtraAttrs,
}

impl TryFrom<NodeRecord> for SceneTree {
    type Error = SceneError;

    fn try_from(record: NodeRecord) -> SceneResult<Self> {
        record.expect_class("Stage")?;
        let attrs: StageAttrs = from_attrs(record.attrs)?;
        let layers = record
            .children
            .unwrap_or_default()
            .into_iter()
            .map(Layer::try_from)
            .collect::<SceneResult<Vec<_>>>()?;
        Ok(Self {
            width: attrs.width,
            height: attrs.height,
            background_color: attrs.background_color,
            layers,
            extra: attrs.extra,
        })
    }
}

impl From<SceneTree> for NodeRecord {
    fn from(tree: SceneTree) -> Self {
        let attrs = to_attrs(&StageAttrs {
            width: tree.width,
            height: tree.height,
            background_color: tree.background_color,
            extra: tree.extra,
        });
        let children = tree.layers.into_iter().map(NodeRecord::from).collect();
        NodeRecord::new("Stage", attrs).with_children(children)
    }
}

fn find_in<'a>(shapes: &'a [Shape], id: &str) -> Option<&'a Shape> {
    for shape in shapes {
        if shape.id() == id {
            return Some(shape);
        }
        if let Some(found) = shape.as_group().and_then(|g| find_in(&g.children, id)) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(shapes: &'a mut [Shape], id: &str) -> Option<&'a mut Shape> {
    for shape in shapes {
        if shape.id() == id {
            return Some(shape);
        }
        if let Some(group) = shape.as_group_mut() {
            if let Some(found) = find_in_mut(&mut group.children, id) {
                return Some(found);
            }
        }
    }
    None
}

/// Transform from the node's local space to stage space, if the id is found.
fn transform_in(shapes: &[Shape], id: &str, parent: Affine) -> Option<Affine> {
    for shape in shapes {
        let local = parent * shape.local_transform();
        if shape.id() == id {
            return Some(local);
        }
        if let Some(found) = shape
            .as_group()
            .and_then(|g| transform_in(&g.children, id, local))
        {
            return Some(found);
        }
    }
    None
}

fn remove_in(shapes: &mut Vec<Shape>, ids: &HashSet<&str>) -> usize {
    let before = shapes.len();
    shapes.retain(|s| !ids.contains(s.id()));
    let mut removed = before - shapes.len();
    for shape in shapes.iter_mut() {
        if let Some(group) = shape.as_group_mut() {
            removed += remove_in(&mut group.children, ids);
        }
    }
    removed
}

fn collect_bounds(
    shapes: &[Shape],
    parent: Affine,
    ancestors: &mut Vec<ShapeId>,
    out: &mut Vec<ShapeBounds>,
) {
    for shape in shapes {
        out.push(ShapeBounds {
            id: shape.id().to_string(),
            bounds: shape.bounds_in(parent),
            ancestors: ancestors.clone(),
        });
        if let Some(group) = shape.as_group() {
            ancestors.push(shape.id().to_string());
            collect_bounds(
                &group.children,
                parent * shape.local_transform(),
                ancestors,
                out,
            );
            ancestors.pop();
        }
    }
}

fn dedupe_ids(shapes: &mut [Shape], seen: &mut HashSet<ShapeId>) -> usize {
    let mut regenerated = 0;
    for shape in shapes {
        if shape.id().is_empty() || !seen.insert(shape.id().to_string()) {
            let fresh = new_shape_id();
            log::warn!("duplicate shape id {:?}, reassigned to {fresh}", shape.id());
            shape.set_id(fresh.clone());
            seen.insert(fresh);
            regenerated += 1;
        }
        if let Some(group) = shape.as_group_mut() {
            regenerated += dedupe_ids(&mut group.children, seen);
        }
    }
    regenerated
}

impl SceneTree {
    pub const DEFAULT_BACKGROUND: &'static str = "#ffffff";

    /// Empty stage with a single layer.
    pub fn new(width: f64, height: f64, background_color: &str) -> Self {
        Self {
            width,
            height,
            background_color: background_color.to_string(),
            layers: vec![Layer::default()],
            extra: ExtraAttrs::new(),
        }
    }

    /// Parse a persisted scene.
    ///
    /// Accepts the tree object itself or a JSON string containing it. Shape
    /// ids are made unique after loading.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> SceneResult<Self> {
        let value = match value {
            Value::String(inner) => serde_json::from_str(&inner)?,
            other => other,
        };
        let record: NodeRecord = serde_json::from_value(value)?;
        let mut tree = SceneTree::try_from(record)?;
        tree.ensure_unique_ids();
        Ok(tree)
    }

    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_value(&self) -> SceneResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Stage rectangle in stage coordinates.
    pub fn stage_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// The layer edits land on.
    pub fn active_layer(&self) -> Option<&Layer> {
        self.layers.first()
    }

    pub fn active_layer_mut(&mut self) -> &mut Layer {
        if self.layers.is_empty() {
            self.layers.push(Layer::default());
        }
        &mut self.layers[0]
    }

    /// Top-level shapes of every layer, in paint order.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.layers.iter().flat_map(|layer| layer.shapes.iter())
    }

    /// Find a shape anywhere in the tree.
    pub fn find(&self, id: &str) -> Option<&Shape> {
        self.layers.iter().find_map(|layer| find_in(&layer.shapes, id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Shape> {
        self.layers
            .iter_mut()
            .find_map(|layer| find_in_mut(&mut layer.shapes, id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Every id in the tree, including group descendants.
    pub fn all_ids(&self) -> Vec<ShapeId> {
        self.shapes_with_bounds().into_iter().map(|b| b.id).collect()
    }

    /// Append a shape on top of the active layer.
    pub fn add_shape(&mut self, shape: Shape) {
        self.active_layer_mut().shapes.push(shape);
    }

    /// Remove shapes by id at any depth. Returns how many were removed.
    pub fn remove_shapes(&mut self, ids: &[ShapeId]) -> usize {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.layers
            .iter_mut()
            .map(|layer| remove_in(&mut layer.shapes, &ids))
            .sum()
    }

    /// Apply a patch to one shape. Returns false when the id is unknown.
    pub fn apply_patch(&mut self, id: &str, patch: &AttrPatch) -> bool {
        match self.find_mut(id) {
            Some(shape) => {
                patch.apply_to(shape);
                true
            }
            None => false,
        }
    }

    /// Apply a batch of patches. Returns how many ids were found.
    pub fn apply_batch(&mut self, batch: &BatchUpdate) -> usize {
        batch
            .iter()
            .filter(|(id, patch)| self.apply_patch(id, patch))
            .count()
    }

    /// Reassign empty and duplicate ids. Returns how many were reassigned.
    pub fn ensure_unique_ids(&mut self) -> usize {
        let mut seen = HashSet::new();
        self.layers
            .iter_mut()
            .map(|layer| dedupe_ids(&mut layer.shapes, &mut seen))
            .sum()
    }

    /// Node-local to stage transform of a shape.
    pub fn absolute_transform(&self, id: &str) -> Option<Affine> {
        self.layers
            .iter()
            .find_map(|layer| transform_in(&layer.shapes, id, Affine::IDENTITY))
    }

    /// Transform of the shape's parent space (identity for top-level shapes).
    pub fn parent_transform(&self, id: &str) -> Option<Affine> {
        let shape = self.find(id)?;
        let absolute = self.absolute_transform(id)?;
        Some(absolute * shape.local_transform().inverse())
    }

    /// Stage-space bounds of every shape, group descendants included.
    pub fn shapes_with_bounds(&self) -> Vec<ShapeBounds> {
        let mut out = Vec::new();
        let mut ancestors = Vec::new();
        for layer in &self.layers {
            collect_bounds(&layer.shapes, Affine::IDENTITY, &mut ancestors, &mut out);
        }
        out
    }

    /// Stage-space bounds of one shape.
    pub fn bounds_of(&self, id: &str) -> Option<Rect> {
        let shape = self.find(id)?;
        let parent = self.parent_transform(id)?;
        Some(shape.bounds_in(parent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Group, Placement, Rectangle};
    use serde_json::json;

    fn sample_json() -> Value {
        json!({
            "className": "Stage",
            "attrs": { "width": 1920.0, "height": 1080.0, "backgroundColor": "#000000", "container": "konva" },
            "children": [{
                "className": "Layer",
                "attrs": { "name": "main" },
                "children": [
                    { "className": "Rect", "attrs": { "id": "r", "x": 10.0, "y": 10.0, "width": 100.0, "height": 50.0, "fill": "#3b82f6", "draggable": true } },
                    { "className": "Group", "attrs": { "id": "g", "x": 500.0, "y": 500.0 }, "children": [
                        { "className": "Circle", "attrs": { "id": "c", "x": 0.0, "y": 0.0, "radius": 20.0 } }
                    ] },
                    { "className": "Image", "attrs": { "id": "i", "x": 0.0, "y": 0.0, "width": 10.0, "height": 10.0, "src": "a.png", "opacity": 0.5 } }
                ]
            }]
        })
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let value = sample_json();
        let tree = SceneTree::from_value(value.clone()).unwrap();
        assert_eq!(tree.to_value().unwrap(), value);
        let again = SceneTree::from_json(&tree.to_json().unwrap()).unwrap();
        assert_eq!(again, tree);
    }

    #[test]
    fn test_accepts_string_wrapped_payload() {
        let wrapped = Value::String(sample_json().to_string());
        let tree = SceneTree::from_value(wrapped).unwrap();
        assert_eq!(tree.background_color, "#000000");
    }

    #[test]
    fn test_rejects_non_stage_root() {
        let err = SceneTree::from_value(json!({ "className": "Layer", "attrs": {} })).unwrap_err();
        assert!(matches!(err, SceneError::UnexpectedNode { .. }));
    }

    #[test]
    fn test_unknown_child_kind_keeps_its_error() {
        let json = json!({
            "className": "Stage",
            "attrs": { "width": 100, "height": 100 },
            "children": [{
                "className": "Layer",
                "attrs": {},
                "children": [{ "className": "Star", "attrs": {} }]
            }]
        });
        let err = SceneTree::from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, SceneError::UnknownKind(ref tag) if tag == "Star"));
    }

    #[test]
    fn test_nested_scene_still_deserializes_through_serde() {
        let slide: crate::storage::Slide = serde_json::from_value(json!({
            "id": "s", "position": 0, "duration": 5.0, "konvaData": sample_json()
        }))
        .unwrap();
        assert_eq!(slide.konva_data.unwrap().background_color, "#000000");
    }

    #[test]
    fn test_find_nested_and_bounds() {
        let tree = SceneTree::from_value(sample_json()).unwrap();
        assert!(tree.find("c").is_some());
        let bounds = tree.bounds_of("c").unwrap();
        assert!((bounds.x0 - 480.0).abs() < 1e-9);
        assert!((bounds.x1 - 520.0).abs() < 1e-9);
        let all = tree.shapes_with_bounds();
        let child = all.iter().find(|b| b.id == "c").unwrap();
        assert_eq!(child.ancestors, vec!["g".to_string()]);
    }

    #[test]
    fn test_duplicate_ids_regenerated() {
        let mut tree = SceneTree::new(100.0, 100.0, "#fff");
        let mut a = Rectangle::new(Placement::default(), 1.0, 1.0);
        a.id = "dup".to_string();
        let mut b = Circle::new(Placement::default(), 1.0);
        b.id = "dup".to_string();
        tree.add_shape(Shape::Rect(a));
        tree.add_shape(Shape::Group(Group::new(Placement::default(), vec![Shape::Circle(b)])));
        assert_eq!(tree.ensure_unique_ids(), 1);
        let ids = tree.all_ids();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(tree.contains("dup"));
    }

    #[test]
    fn test_remove_nested() {
        let mut tree = SceneTree::from_value(sample_json()).unwrap();
        assert_eq!(tree.remove_shapes(&["c".to_string(), "r".to_string()]), 2);
        assert!(!tree.contains("c"));
        assert!(tree.contains("g"));
    }

    #[test]
    fn test_apply_batch_counts_found() {
        let mut tree = SceneTree::from_value(sample_json()).unwrap();
        let batch = vec![
            ("r".to_string(), AttrPatch::position(1.0, 2.0)),
            ("missing".to_string(), AttrPatch::position(1.0, 2.0)),
        ];
        assert_eq!(tree.apply_batch(&batch), 1);
        assert!((tree.find("r").unwrap().placement().x - 1.0).abs() < f64::EPSILON);
    }
}

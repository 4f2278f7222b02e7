//! Group shape for combining multiple shapes.

use super::{ExtraAttrs, Placement, Shape, ShapeId, ShapeTrait, new_shape_id};
use kurbo::{Affine, Rect};
use serde::{Deserialize, Serialize};

/// A group of shapes that can be manipulated as a single unit.
/// Groups can contain other groups, enabling nested hierarchies.
///
/// Children are positioned in the group's local coordinate space. They are
/// carried in the node record's `children` array rather than in `attrs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default = "new_shape_id")]
    pub(crate) id: ShapeId,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(skip)]
    pub children: Vec<Shape>,
    #[serde(flatten)]
    pub extra: ExtraAttrs,
}

impl Group {
    /// Create a new group from a list of shapes.
    pub fn new(placement: Placement, children: Vec<Shape>) -> Self {
        Self {
            id: new_shape_id(),
            placement,
            children,
            extra: ExtraAttrs::new(),
        }
    }

    /// Get all shape IDs below this group (including nested groups).
    pub fn descendant_ids(&self) -> Vec<ShapeId> {
        let mut ids = Vec::new();
        for child in &self.children {
            ids.push(child.id().to_string());
            if let Shape::Group(group) = child {
                ids.extend(group.descendant_ids());
            }
        }
        ids
    }
}

impl ShapeTrait for Group {
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
        self.children
            .iter()
            .map(|child| child.bounds_in(Affine::IDENTITY))
            .reduce(|acc, b| acc.union(b))
            .unwrap_or(Rect::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Rectangle};

    #[test]
    fn test_group_bounds_union_children() {
        let rect = Rectangle::new(Placement::at(0.0, 0.0), 10.0, 10.0);
        let circle = Circle::new(Placement::at(50.0, 50.0), 10.0);
        let group = Group::new(
            Placement::at(100.0, 100.0),
            vec![Shape::Rect(rect), Shape::Circle(circle)],
        );
        let local = group.local_bounds();
        assert!((local.x1 - 60.0).abs() < f64::EPSILON);
        let stage = Shape::Group(group).bounds();
        assert!((stage.x0 - 100.0).abs() < f64::EPSILON);
        assert!((stage.y1 - 160.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_descendant_ids_nested() {
        let inner = Group::new(
            Placement::default(),
            vec![Shape::Rect(Rectangle::new(Placement::default(), 1.0, 1.0))],
        );
        let inner_id = inner.id.clone();
        let outer = Group::new(Placement::default(), vec![Shape::Group(inner)]);
        let ids = outer.descendant_ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], inner_id);
    }
}

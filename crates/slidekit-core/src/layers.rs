//! Z-order of shapes on the active layer.

use crate::scene::{SceneError, SceneResult, SceneTree};
use crate::shapes::ShapeId;
use std::collections::HashSet;

/// Check that `ordered` is a permutation of `current` and list the entries
/// whose index changes, as `(id, new_index)`.
pub(crate) fn changed_positions(
    current: &[String],
    ordered: &[String],
) -> SceneResult<Vec<(String, usize)>> {
    let current_set: HashSet<&String> = current.iter().collect();
    let ordered_set: HashSet<&String> = ordered.iter().collect();
    if ordered.len() != current.len()
        || ordered_set.len() != ordered.len()
        || current_set != ordered_set
    {
        return Err(SceneError::InvalidReorder(format!(
            "expected a permutation of {} ids, got {:?}",
            current.len(),
            ordered
        )));
    }
    Ok(ordered
        .iter()
        .enumerate()
        .filter(|(i, id)| current.get(*i) != Some(*id))
        .map(|(i, id)| (id.clone(), i))
        .collect())
}

/// Reorders the active layer's top-level shapes. Index 0 paints first.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerOrderManager;

impl LayerOrderManager {
    /// Current back-to-front order of the active layer.
    pub fn order(tree: &SceneTree) -> Vec<ShapeId> {
        tree.active_layer()
            .map(|layer| layer.shapes.iter().map(|s| s.id().to_string()).collect())
            .unwrap_or_default()
    }

    /// Apply a new back-to-front order. Returns the shapes whose index changed.
    pub fn reorder(
        tree: &mut SceneTree,
        ordered_ids: &[ShapeId],
    ) -> SceneResult<Vec<(ShapeId, usize)>> {
        let current = Self::order(tree);
        let changed = changed_positions(&current, ordered_ids)?;
        if changed.is_empty() {
            return Ok(changed);
        }
        let layer = tree.active_layer_mut();
        let mut shapes = std::mem::take(&mut layer.shapes);
        for id in ordered_ids {
            if let Some(pos) = shapes.iter().position(|s| s.id() == id) {
                layer.shapes.push(shapes.swap_remove(pos));
            }
        }
        log::debug!("reordered {} shape(s)", changed.len());
        Ok(changed)
    }

    /// Order with `ids` moved to the top, keeping their relative order.
    pub fn bring_to_front(tree: &SceneTree, ids: &[ShapeId]) -> Vec<ShapeId> {
        let (mut rest, moved): (Vec<_>, Vec<_>) =
            Self::order(tree).into_iter().partition(|id| !ids.contains(id));
        rest.extend(moved);
        rest
    }

    /// Order with `ids` moved to the bottom, keeping their relative order.
    pub fn send_to_back(tree: &SceneTree, ids: &[ShapeId]) -> Vec<ShapeId> {
        let (moved, rest): (Vec<_>, Vec<_>) =
            Self::order(tree).into_iter().partition(|id| ids.contains(id));
        moved.into_iter().chain(rest).collect()
    }

    /// Order with each of `ids` swapped one step up, unless blocked.
    pub fn bring_forward(tree: &SceneTree, ids: &[ShapeId]) -> Vec<ShapeId> {
        let mut order = Self::order(tree);
        for pos in (0..order.len().saturating_sub(1)).rev() {
            if ids.contains(&order[pos]) && !ids.contains(&order[pos + 1]) {
                order.swap(pos, pos + 1);
            }
        }
        order
    }

    /// Order with each of `ids` swapped one step down, unless blocked.
    pub fn send_backward(tree: &SceneTree, ids: &[ShapeId]) -> Vec<ShapeId> {
        let mut order = Self::order(tree);
        for pos in 1..order.len() {
            if ids.contains(&order[pos]) && !ids.contains(&order[pos - 1]) {
                order.swap(pos, pos - 1);
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Placement, Rectangle, Shape};

    fn ids(list: &[&str]) -> Vec<ShapeId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn tree() -> SceneTree {
        let mut tree = SceneTree::new(100.0, 100.0, "#fff");
        for id in ["a", "b", "c", "d"] {
            let mut r = Rectangle::new(Placement::default(), 1.0, 1.0);
            r.id = id.to_string();
            tree.add_shape(Shape::Rect(r));
        }
        tree
    }

    #[test]
    fn test_reorder_reports_changes() {
        let mut tree = tree();
        let changed = LayerOrderManager::reorder(&mut tree, &ids(&["b", "a", "c", "d"])).unwrap();
        assert_eq!(changed, vec![("b".to_string(), 0), ("a".to_string(), 1)]);
        assert_eq!(LayerOrderManager::order(&tree), ids(&["b", "a", "c", "d"]));
    }

    #[test]
    fn test_reorder_rejects_non_permutation() {
        let mut tree = tree();
        assert!(LayerOrderManager::reorder(&mut tree, &ids(&["a", "b", "c"])).is_err());
        assert!(LayerOrderManager::reorder(&mut tree, &ids(&["a", "a", "c", "d"])).is_err());
        assert!(LayerOrderManager::reorder(&mut tree, &ids(&["a", "b", "c", "x"])).is_err());
        assert_eq!(LayerOrderManager::order(&tree), ids(&["a", "b", "c", "d"]));
    }

    #[test]
    fn test_front_and_back() {
        let tree = tree();
        assert_eq!(
            LayerOrderManager::bring_to_front(&tree, &ids(&["a", "c"])),
            ids(&["b", "d", "a", "c"])
        );
        assert_eq!(
            LayerOrderManager::send_to_back(&tree, &ids(&["d"])),
            ids(&["d", "a", "b", "c"])
        );
    }

    #[test]
    fn test_forward_and_backward() {
        let tree = tree();
        assert_eq!(
            LayerOrderManager::bring_forward(&tree, &ids(&["b"])),
            ids(&["a", "c", "b", "d"])
        );
        assert_eq!(
            LayerOrderManager::bring_forward(&tree, &ids(&["c", "d"])),
            ids(&["a", "b", "c", "d"])
        );
        assert_eq!(
            LayerOrderManager::send_backward(&tree, &ids(&["a", "c"])),
            ids(&["a", "c", "b", "d"])
        );
    }
}

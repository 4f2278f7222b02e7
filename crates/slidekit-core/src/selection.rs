//! Selection state.
//!
//! Every method that can change the selection reports whether it did, so the
//! caller knows when to rebind the transformer.

use crate::scene::SceneTree;
use crate::shapes::ShapeId;
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How ids passed to [`SelectionManager::select`] combine with the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    /// Selection becomes exactly the given ids.
    Replace,
    /// Unselected ids are added, selected ids are removed.
    Toggle,
}

/// Marquee hit rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarqueeMode {
    /// Shape box must lie fully inside the marquee.
    Strict,
    /// Shape box must overlap the marquee.
    #[default]
    Loose,
}

impl MarqueeMode {
    pub fn toggled(self) -> Self {
        match self {
            MarqueeMode::Strict => MarqueeMode::Loose,
            MarqueeMode::Loose => MarqueeMode::Strict,
        }
    }
}

/// Open-interval overlap; a zero-length interval overlaps when it lies within the other.
fn spans_overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> bool {
    if a1 > a0 {
        a0 < b1 && b0 < a1
    } else {
        b0 <= a0 && a0 <= b1
    }
}

fn hits(marquee: Rect, bounds: Rect, mode: MarqueeMode) -> bool {
    match mode {
        MarqueeMode::Strict => {
            bounds.x0 >= marquee.x0
                && bounds.x1 <= marquee.x1
                && bounds.y0 >= marquee.y0
                && bounds.y1 <= marquee.y1
        }
        MarqueeMode::Loose => {
            spans_overlap(bounds.x0, bounds.x1, marquee.x0, marquee.x1)
                && spans_overlap(bounds.y0, bounds.y1, marquee.y0, marquee.y1)
        }
    }
}

/// Ordered set of selected shape ids.
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    selected: Vec<ShapeId>,
    marquee_min_size: f64,
}

impl SelectionManager {
    pub fn new(marquee_min_size: f64) -> Self {
        Self {
            selected: Vec::new(),
            marquee_min_size,
        }
    }

    pub fn selected(&self) -> &[ShapeId] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    fn replace_with(&mut self, ids: Vec<ShapeId>) -> bool {
        let mut seen = HashSet::new();
        let ids: Vec<ShapeId> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
        if ids == self.selected {
            return false;
        }
        self.selected = ids;
        true
    }

    /// Select ids. Returns true when the selection changed.
    pub fn select(&mut self, ids: &[ShapeId], mode: SelectMode) -> bool {
        match mode {
            SelectMode::Replace => self.replace_with(ids.to_vec()),
            SelectMode::Toggle => {
                let before = self.selected.clone();
                let mut seen = HashSet::new();
                for id in ids {
                    if !seen.insert(id.as_str()) {
                        continue;
                    }
                    if let Some(pos) = self.selected.iter().position(|s| s == id) {
                        self.selected.remove(pos);
                    } else {
                        self.selected.push(id.clone());
                    }
                }
                self.selected != before
            }
        }
    }

    pub fn clear(&mut self) -> bool {
        self.replace_with(Vec::new())
    }

    /// Click on empty canvas. Clears unless a modifier is held or text is being edited.
    pub fn background_click(&mut self, modifier: bool, text_editing: bool) -> bool {
        if modifier || text_editing {
            return false;
        }
        self.clear()
    }

    /// Replace the selection with every shape the marquee catches.
    ///
    /// A marquee smaller than the minimum size on both axes is a click and
    /// selects nothing. Group children are candidates, but a child is dropped
    /// when one of its enclosing groups is caught too.
    pub fn marquee_select(&mut self, tree: &SceneTree, marquee: Rect, mode: MarqueeMode) -> bool {
        let marquee = marquee.abs();
        if marquee.width() < self.marquee_min_size && marquee.height() < self.marquee_min_size {
            log::trace!("marquee below minimum size, treated as a click");
            return false;
        }
        let candidates = tree.shapes_with_bounds();
        let caught: HashSet<&str> = candidates
            .iter()
            .filter(|c| hits(marquee, c.bounds, mode))
            .map(|c| c.id.as_str())
            .collect();
        let ids = candidates
            .iter()
            .filter(|c| caught.contains(c.id.as_str()))
            .filter(|c| !c.ancestors.iter().any(|a| caught.contains(a.as_str())))
            .map(|c| c.id.clone())
            .collect();
        self.replace_with(ids)
    }

    /// Select every top-level shape.
    pub fn select_all(&mut self, tree: &SceneTree) -> bool {
        let ids = tree.shapes().map(|s| s.id().to_string()).collect();
        self.replace_with(ids)
    }

    /// Drop ids no longer present in the tree.
    pub fn prune(&mut self, tree: &SceneTree) -> bool {
        let before = self.selected.len();
        self.selected.retain(|id| tree.contains(id));
        before != self.selected.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Group, Line, Placement, Rectangle, Shape};

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> Shape {
        let mut r = Rectangle::new(Placement::at(x, y), w, h);
        r.id = id.to_string();
        Shape::Rect(r)
    }

    fn ids(list: &[&str]) -> Vec<ShapeId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sample_tree() -> SceneTree {
        let mut tree = SceneTree::new(1000.0, 1000.0, "#fff");
        tree.add_shape(rect("a", 10.0, 10.0, 50.0, 50.0));
        tree.add_shape(rect("b", 100.0, 10.0, 50.0, 50.0));
        let mut line = Line::new(Placement::at(0.0, 300.0), vec![0.0, 0.0, 100.0, 0.0]);
        line.id = "l".to_string();
        tree.add_shape(Shape::Line(line));
        let mut group = Group::new(Placement::at(500.0, 500.0), vec![rect("child", 0.0, 0.0, 20.0, 20.0)]);
        group.id = "g".to_string();
        tree.add_shape(Shape::Group(group));
        tree
    }

    #[test]
    fn test_replace_and_toggle() {
        let mut sel = SelectionManager::new(5.0);
        assert!(sel.select(&ids(&["a", "b"]), SelectMode::Replace));
        assert!(!sel.select(&ids(&["a", "b"]), SelectMode::Replace));
        assert!(sel.select(&ids(&["b", "c"]), SelectMode::Toggle));
        assert_eq!(sel.selected(), ids(&["a", "c"]).as_slice());
    }

    #[test]
    fn test_toggle_repeated_id_counts_once() {
        let mut sel = SelectionManager::new(5.0);
        assert!(sel.select(&ids(&["a", "a"]), SelectMode::Toggle));
        assert_eq!(sel.selected(), ids(&["a"]).as_slice());
        assert!(sel.select(&ids(&["a", "a"]), SelectMode::Toggle));
        assert!(sel.selected().is_empty());
        assert!(!sel.select(&[], SelectMode::Toggle));
    }

    #[test]
    fn test_background_click_respects_text_edit() {
        let mut sel = SelectionManager::new(5.0);
        sel.select(&ids(&["a"]), SelectMode::Replace);
        assert!(!sel.background_click(false, true));
        assert!(!sel.background_click(true, false));
        assert!(sel.background_click(false, false));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_strict_marquee_requires_containment() {
        let tree = sample_tree();
        let mut sel = SelectionManager::new(5.0);
        sel.marquee_select(&tree, Rect::new(0.0, 0.0, 120.0, 100.0), MarqueeMode::Strict);
        assert_eq!(sel.selected(), ids(&["a"]).as_slice());
    }

    #[test]
    fn test_loose_marquee_overlap() {
        let tree = sample_tree();
        let mut sel = SelectionManager::new(5.0);
        sel.marquee_select(&tree, Rect::new(0.0, 0.0, 120.0, 100.0), MarqueeMode::Loose);
        assert_eq!(sel.selected(), ids(&["a", "b"]).as_slice());
    }

    #[test]
    fn test_loose_marquee_catches_flat_line() {
        let tree = sample_tree();
        let mut sel = SelectionManager::new(5.0);
        sel.marquee_select(&tree, Rect::new(50.0, 290.0, 60.0, 310.0), MarqueeMode::Loose);
        assert_eq!(sel.selected(), ids(&["l"]).as_slice());
    }

    #[test]
    fn test_tiny_marquee_is_click() {
        let tree = sample_tree();
        let mut sel = SelectionManager::new(5.0);
        sel.select(&ids(&["b"]), SelectMode::Replace);
        assert!(!sel.marquee_select(&tree, Rect::new(10.0, 10.0, 13.0, 12.0), MarqueeMode::Loose));
        assert_eq!(sel.selected(), ids(&["b"]).as_slice());
    }

    #[test]
    fn test_marquee_prefers_group_over_child() {
        let tree = sample_tree();
        let mut sel = SelectionManager::new(5.0);
        sel.marquee_select(&tree, Rect::new(490.0, 490.0, 530.0, 530.0), MarqueeMode::Strict);
        assert_eq!(sel.selected(), ids(&["g"]).as_slice());
        sel.marquee_select(&tree, Rect::new(505.0, 505.0, 515.0, 515.0), MarqueeMode::Loose);
        assert_eq!(sel.selected(), ids(&["g"]).as_slice());
    }

    #[test]
    fn test_prune_and_select_all() {
        let mut tree = sample_tree();
        let mut sel = SelectionManager::new(5.0);
        assert!(sel.select_all(&tree));
        assert_eq!(sel.selected().len(), 4);
        tree.remove_shapes(&ids(&["a"]));
        assert!(sel.prune(&tree));
        assert!(!sel.is_selected("a"));
    }
}

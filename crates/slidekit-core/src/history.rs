//! Bounded undo/redo history of scene snapshots.

use crate::scene::SceneTree;
use std::collections::VecDeque;

/// Default number of undo states kept per slide.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Undo and redo stacks of whole-tree snapshots.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<SceneTree>,
    redo_stack: Vec<SceneTree>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_UNDO_HISTORY)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record the state being replaced by a committed edit.
    pub fn push(&mut self, previous: SceneTree) {
        self.undo_stack.push_back(previous);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
    }

    /// Step back from `current`. Returns the state to restore.
    pub fn undo(&mut self, current: SceneTree) -> Option<SceneTree> {
        let snapshot = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(snapshot)
    }

    /// Step forward from `current`. Returns the state to restore.
    pub fn redo(&mut self, current: SceneTree) -> Option<SceneTree> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push_back(current);
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(bg: &str) -> SceneTree {
        SceneTree::new(10.0, 10.0, bg)
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::default();
        history.push(tree("#000"));
        let restored = history.undo(tree("#111")).unwrap();
        assert_eq!(restored.background_color, "#000");
        assert!(history.can_redo());
        let again = history.redo(restored).unwrap();
        assert_eq!(again.background_color, "#111");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut history = History::default();
        history.push(tree("#000"));
        history.undo(tree("#111"));
        history.push(tree("#000"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.push(tree(&format!("#{i}")));
        }
        assert_eq!(history.len(), 3);
        let mut current = tree("#now");
        let mut last = String::new();
        while let Some(prev) = history.undo(current.clone()) {
            last = prev.background_color.clone();
            current = prev;
        }
        assert_eq!(last, "#2");
    }
}

//! In-place text editing session.

use crate::scene::SceneTree;
use crate::shapes::{Shape, ShapeId};

#[derive(Debug, Clone, PartialEq)]
struct EditSession {
    id: ShapeId,
    original: String,
    draft: String,
}

/// Overlay editor for a single text shape.
///
/// While a session is open the transformer hides its handles and canvas
/// background clicks do not clear the selection.
#[derive(Debug, Clone, Default)]
pub struct TextEditOverlay {
    session: Option<EditSession>,
}

impl TextEditOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session on a text shape. Returns false for other kinds.
    pub fn start(&mut self, tree: &SceneTree, id: &str) -> bool {
        let Some(Shape::Text(text)) = tree.find(id) else {
            return false;
        };
        self.session = Some(EditSession {
            id: id.to_string(),
            original: text.text.clone(),
            draft: text.text.clone(),
        });
        true
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Id of the shape being edited.
    pub fn editing_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }

    pub fn draft(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.draft.as_str())
    }

    /// Append typed characters.
    pub fn input(&mut self, typed: &str) {
        if let Some(session) = &mut self.session {
            session.draft.push_str(typed);
        }
    }

    /// Delete the last character.
    pub fn backspace(&mut self) {
        if let Some(session) = &mut self.session {
            session.draft.pop();
        }
    }

    /// Replace the whole draft.
    pub fn set_draft(&mut self, text: &str) {
        if let Some(session) = &mut self.session {
            text.clone_into(&mut session.draft);
        }
    }

    /// Close the session. Returns the new text when it differs from the original.
    pub fn commit(&mut self) -> Option<(ShapeId, String)> {
        let session = self.session.take()?;
        (session.draft != session.original).then_some((session.id, session.draft))
    }

    /// Close the session, discarding the draft.
    pub fn cancel(&mut self) {
        self.session = None;
    }

    /// End the session if its shape has disappeared.
    pub fn prune(&mut self, tree: &SceneTree) {
        if self.editing_id().is_some_and(|id| !tree.contains(id)) {
            self.session = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Placement, Rectangle, Text};

    fn tree() -> SceneTree {
        let mut tree = SceneTree::new(100.0, 100.0, "#fff");
        let mut text = Text::new(Placement::default(), "Hello".to_string());
        text.id = "t".to_string();
        tree.add_shape(Shape::Text(text));
        let mut rect = Rectangle::new(Placement::default(), 1.0, 1.0);
        rect.id = "r".to_string();
        tree.add_shape(Shape::Rect(rect));
        tree
    }

    #[test]
    fn test_only_text_can_be_edited() {
        let tree = tree();
        let mut overlay = TextEditOverlay::new();
        assert!(!overlay.start(&tree, "r"));
        assert!(!overlay.is_active());
        assert!(overlay.start(&tree, "t"));
        assert_eq!(overlay.editing_id(), Some("t"));
    }

    #[test]
    fn test_commit_returns_changed_text() {
        let tree = tree();
        let mut overlay = TextEditOverlay::new();
        overlay.start(&tree, "t");
        overlay.input(" world!");
        overlay.backspace();
        assert_eq!(overlay.commit(), Some(("t".to_string(), "Hello world".to_string())));
        assert!(!overlay.is_active());
    }

    #[test]
    fn test_unchanged_commit_and_cancel() {
        let tree = tree();
        let mut overlay = TextEditOverlay::new();
        overlay.start(&tree, "t");
        assert_eq!(overlay.commit(), None);
        overlay.start(&tree, "t");
        overlay.set_draft("Bye");
        overlay.cancel();
        assert!(overlay.draft().is_none());
    }
}

//! Edit scripts: a JSON list of editor commands replayed in order.
//!
//! ```json
//! [
//!   { "op": "addShape", "kind": "Rect", "x": 400, "y": 300, "label": "box" },
//!   { "op": "transform", "scaleX": 2, "scaleY": 1 },
//!   { "op": "wait", "ms": 600 },
//!   { "op": "dump" }
//! ]
//! ```
//!
//! Shape ids are random, so commands refer to shapes created earlier in the
//! script as `@label`.

use serde::{Deserialize, Serialize};
use slidekit_core::handles::HandleKind;
use slidekit_core::shapes::Endpoint;
use slidekit_core::{ShapeId, ShapeOptions};
use std::collections::HashMap;

/// Arrow endpoint as written in scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorEnd {
    Start,
    End,
}

impl From<AnchorEnd> for Endpoint {
    fn from(end: AnchorEnd) -> Self {
        match end {
            AnchorEnd::Start => Endpoint::Start,
            AnchorEnd::End => Endpoint::End,
        }
    }
}

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    /// Open the slide at this deck index.
    OpenSlide { slide: usize },
    CreateSlide,
    DeleteSlide { slide: usize },
    /// New order given as current deck indices.
    ReorderSlides { order: Vec<usize> },
    /// Duration of the open slide, in seconds.
    SetDuration { seconds: f64 },
    AddShape {
        kind: String,
        x: f64,
        y: f64,
        #[serde(default)]
        options: ShapeOptions,
        #[serde(default)]
        label: Option<String>,
    },
    Select {
        ids: Vec<String>,
        #[serde(default)]
        toggle: bool,
    },
    Marquee { x0: f64, y0: f64, x1: f64, y1: f64 },
    ToggleMarqueeMode,
    SelectAll,
    ClickBackground {
        #[serde(default)]
        modifier: bool,
    },
    DeleteSelected,
    /// Move the selection by an offset, as one drag gesture.
    Drag { dx: f64, dy: f64 },
    /// Scale and optionally rotate the selection, as one transform gesture.
    Transform {
        scale_x: f64,
        scale_y: f64,
        #[serde(default)]
        rotation: Option<f64>,
    },
    /// Drag one transformer handle to a stage point.
    Handle { handle: HandleKind, x: f64, y: f64 },
    EditText { id: String, text: String },
    SetBackground { color: String },
    MediaLoaded { id: String, width: f64, height: f64 },
    /// A library item was deleted; reload the open slide from the store.
    MediaDeleted,
    /// Drag an endpoint of the selected arrow.
    Anchor { end: AnchorEnd, x: f64, y: f64 },
    BringToFront,
    SendToBack,
    BringForward,
    SendBackward,
    Undo,
    Redo,
    /// Advance the clock and fire debounced writes that came due.
    Wait { ms: u64 },
    /// Build a frame into a display list.
    Render { width: f64, height: f64 },
    /// Emit the open slide's scene JSON.
    Dump,
}

/// A parsed script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub commands: Vec<Command>,
}

impl Script {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Script labels bound to real shape ids.
#[derive(Debug, Default)]
pub(crate) struct Labels {
    ids: HashMap<String, ShapeId>,
}

impl Labels {
    pub fn bind(&mut self, label: &str, id: ShapeId) {
        self.ids.insert(label.to_string(), id);
    }

    /// `@name` resolves through the labels; anything else is a literal id.
    pub fn resolve(&self, reference: &str) -> Option<ShapeId> {
        match reference.strip_prefix('@') {
            Some(label) => self.ids.get(label).cloned(),
            None => Some(reference.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidekit_core::handles::Corner;

    #[test]
    fn test_parse_mixed_script() {
        let script = Script::from_json(
            r##"[
                {"op": "addShape", "kind": "Image", "x": 10, "y": 20,
                 "options": {"src": "a.png", "autoResize": true}, "label": "pic"},
                {"op": "select", "ids": ["@pic"], "toggle": true},
                {"op": "transform", "scaleX": 2, "scaleY": 0.5},
                {"op": "handle", "handle": {"Corner": "BottomRight"}, "x": 5, "y": 6},
                {"op": "anchor", "end": "end", "x": 1, "y": 2},
                {"op": "setBackground", "color": "#000000"},
                {"op": "wait", "ms": 500},
                {"op": "dump"}
            ]"##,
        )
        .unwrap();
        assert_eq!(script.len(), 8);
        match &script.commands[0] {
            Command::AddShape { kind, options, label, .. } => {
                assert_eq!(kind, "Image");
                assert!(options.auto_resize);
                assert_eq!(options.src.as_deref(), Some("a.png"));
                assert_eq!(label.as_deref(), Some("pic"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            script.commands[2],
            Command::Transform { scale_x: 2.0, scale_y: 0.5, rotation: None }
        );
        assert_eq!(
            script.commands[3],
            Command::Handle { handle: HandleKind::Corner(Corner::BottomRight), x: 5.0, y: 6.0 }
        );
        assert_eq!(script.commands[4], Command::Anchor { end: AnchorEnd::End, x: 1.0, y: 2.0 });
        assert_eq!(script.commands[7], Command::Dump);
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(Script::from_json(r#"[{"op": "explode"}]"#).is_err());
    }

    #[test]
    fn test_defaults_fill_optional_fields() {
        let script = Script::from_json(
            r#"[{"op": "clickBackground"}, {"op": "addShape", "kind": "Rect", "x": 0, "y": 0}]"#,
        )
        .unwrap();
        assert_eq!(script.commands[0], Command::ClickBackground { modifier: false });
        match &script.commands[1] {
            Command::AddShape { options, label, .. } => {
                assert_eq!(options, &ShapeOptions::default());
                assert!(label.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_labels_resolve() {
        let mut labels = Labels::default();
        labels.bind("a", "shape-1".to_string());
        assert_eq!(labels.resolve("@a").as_deref(), Some("shape-1"));
        assert_eq!(labels.resolve("@missing"), None);
        assert_eq!(labels.resolve("raw-id").as_deref(), Some("raw-id"));
    }
}

//! Persisted node records: `{ "className", "attrs", "children" }`.
//!
//! Every node in a stored scene tree (stage, layers and shapes) uses the same
//! envelope. Typed nodes convert to and from this envelope; attributes the
//! typed model does not know about ride along untouched.

use crate::scene::{SceneError, SceneResult};
use crate::shapes::{Group, LiveText, Shape, ShapeKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Untyped node envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "className")]
    pub class_name: String,
    #[serde(default)]
    pub attrs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeRecord>>,
}

impl NodeRecord {
    pub fn new(class_name: &str, attrs: Map<String, Value>) -> Self {
        Self {
            class_name: class_name.to_string(),
            attrs,
            children: None,
        }
    }

    pub fn with_children(mut self, children: Vec<NodeRecord>) -> Self {
        self.children = Some(children);
        self
    }

    /// Fail unless this record carries the given tag.
    pub(crate) fn expect_class(&self, expected: &'static str) -> SceneResult<()> {
        if self.class_name == expected {
            Ok(())
        } else {
            Err(SceneError::UnexpectedNode {
                expected,
                found: self.class_name.clone(),
            })
        }
    }
}

/// Decode a typed attribute struct from an attribute map.
pub(crate) fn from_attrs<T: DeserializeOwned>(attrs: Map<String, Value>) -> SceneResult<T> {
    Ok(serde_json::from_value(Value::Object(attrs))?)
}

/// Encode a typed attribute struct into an attribute map.
pub(crate) fn to_attrs<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            log::error!("attributes serialized to a non-object value: {other}");
            Map::new()
        }
        Err(e) => {
            log::error!("failed to serialize attributes: {e}");
            Map::new()
        }
    }
}

impl TryFrom<NodeRecord> for Shape {
    type Error = SceneError;

    fn try_from(record: NodeRecord) -> SceneResult<Self> {
        let kind: ShapeKind = record
            .class_name
            .parse()
            .map_err(|_| SceneError::UnknownKind(record.class_name.clone()))?;
        let attrs = record.attrs;
        let shape = match kind {
            ShapeKind::Rect => Shape::Rect(from_attrs(attrs)?),
            ShapeKind::Circle => Shape::Circle(from_attrs(attrs)?),
            ShapeKind::Text => Shape::Text(from_attrs(attrs)?),
            ShapeKind::Image => Shape::Image(from_attrs(attrs)?),
            ShapeKind::Video => Shape::Video(from_attrs(attrs)?),
            ShapeKind::Line => Shape::Line(from_attrs(attrs)?),
            ShapeKind::Arrow => Shape::Arrow(from_attrs(attrs)?),
            ShapeKind::Live(kind) => Shape::Live(LiveText {
                kind,
                text: from_attrs(attrs)?,
            }),
            ShapeKind::Group => {
                let mut group: Group = from_attrs(attrs)?;
                group.children = record
                    .children
                    .unwrap_or_default()
                    .into_iter()
                    .map(Shape::try_from)
                    .collect::<SceneResult<Vec<_>>>()?;
                Shape::Group(group)
            }
        };
        Ok(shape)
    }
}

impl From<Shape> for NodeRecord {
    fn from(shape: Shape) -> Self {
        let tag = shape.kind().tag();
        match shape {
            Shape::Rect(s) => NodeRecord::new(tag, to_attrs(&s)),
            Shape::Circle(s) => NodeRecord::new(tag, to_attrs(&s)),
            Shape::Text(s) => NodeRecord::new(tag, to_attrs(&s)),
            Shape::Live(s) => NodeRecord::new(tag, to_attrs(&s.text)),
            Shape::Image(s) | Shape::Video(s) => NodeRecord::new(tag, to_attrs(&s)),
            Shape::Line(s) => NodeRecord::new(tag, to_attrs(&s)),
            Shape::Arrow(s) => NodeRecord::new(tag, to_attrs(&s)),
            Shape::Group(mut g) => {
                let children = std::mem::take(&mut g.children)
                    .into_iter()
                    .map(NodeRecord::from)
                    .collect();
                NodeRecord::new(tag, to_attrs(&g)).with_children(children)
            }
        }
    }
}

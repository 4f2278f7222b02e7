//! Shape definitions for the slide canvas.

mod arrow;
mod circle;
mod group;
mod line;
mod media;
mod rectangle;
mod text;

pub use arrow::Arrow;
pub use circle::Circle;
pub use group::Group;
pub use line::{Endpoint, Line, endpoint, point_pairs, points_bounds, points_well_formed, set_endpoint};
pub use media::{Media, fit_within};
pub use rectangle::Rectangle;
pub use text::{LiveText, Text, TextAlign, TextStyle};

use kurbo::{Affine, Rect};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = String;

/// Attributes carried by a node that the editor does not interpret.
///
/// They are kept verbatim so a load/edit/save cycle never drops data.
pub type ExtraAttrs = Map<String, Value>;

/// Generate a fresh shape id.
pub fn new_shape_id() -> ShapeId {
    Uuid::new_v4().to_string()
}

pub(crate) fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

pub(crate) fn is_one(v: &f64) -> bool {
    *v == 1.0
}

pub(crate) fn one() -> f64 {
    1.0
}

/// Position, rotation and scale shared by every node.
///
/// Rotation is in degrees around the node origin. Scale is transient for
/// width/height and radius based kinds: it is baked back into the size on
/// every commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotation: f64,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scale_x: f64,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scale_y: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self::at(0.0, 0.0)
    }
}

impl Placement {
    /// Unrotated, unscaled placement at a point.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Node-local to parent transform: translate, then rotate, then scale.
    pub fn transform(&self) -> Affine {
        Affine::translate((self.x, self.y))
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// Whether a non-identity scale is standing on the node.
    pub fn is_scaled(&self) -> bool {
        self.scale_x != 1.0 || self.scale_y != 1.0
    }
}

/// Paint attributes. Colors are CSS color strings, as persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

impl ShapeStyle {
    /// Style with a fill and a stroke.
    pub fn filled(fill: &str, stroke: &str, stroke_width: f64) -> Self {
        Self {
            fill: Some(fill.to_string()),
            stroke: Some(stroke.to_string()),
            stroke_width: Some(stroke_width),
        }
    }

    /// Stroke-only style.
    pub fn stroked(stroke: &str, stroke_width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(stroke.to_string()),
            stroke_width: Some(stroke_width),
        }
    }
}

/// Text kinds whose content is sourced externally at display time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiveKind {
    /// Current date and/or time.
    DateTime,
    /// Security incident counter (e.g. days without incident).
    SecurityCounter,
    /// Business KPI value.
    KpiCounter,
}

impl LiveKind {
    pub fn tag(self) -> &'static str {
        match self {
            LiveKind::DateTime => "DateTime",
            LiveKind::SecurityCounter => "SecurityCounter",
            LiveKind::KpiCounter => "KpiCounter",
        }
    }

    pub fn all() -> &'static [LiveKind] {
        &[
            LiveKind::DateTime,
            LiveKind::SecurityCounter,
            LiveKind::KpiCounter,
        ]
    }
}

/// Discriminator of a shape node, serialized as the `className` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rect,
    Circle,
    Text,
    Image,
    Video,
    Line,
    Arrow,
    Group,
    Live(LiveKind),
}

/// How a standing scale factor is folded into the node on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleRule {
    /// `width *= scaleX`, `height *= scaleY`, scale reset to 1.
    BakeSize,
    /// `radius *= max(|scaleX|, |scaleY|)`, scale reset to 1.
    BakeRadius,
    /// Scale stays on the node.
    Keep,
}

impl ShapeKind {
    /// The `className` tag.
    pub fn tag(self) -> &'static str {
        match self {
            ShapeKind::Rect => "Rect",
            ShapeKind::Circle => "Circle",
            ShapeKind::Text => "Text",
            ShapeKind::Image => "Image",
            ShapeKind::Video => "Video",
            ShapeKind::Line => "Line",
            ShapeKind::Arrow => "Arrow",
            ShapeKind::Group => "Group",
            ShapeKind::Live(live) => live.tag(),
        }
    }

    pub fn scale_rule(self) -> ScaleRule {
        match self {
            ShapeKind::Rect
            | ShapeKind::Text
            | ShapeKind::Image
            | ShapeKind::Video
            | ShapeKind::Live(_) => ScaleRule::BakeSize,
            ShapeKind::Circle => ScaleRule::BakeRadius,
            ShapeKind::Line | ShapeKind::Arrow | ShapeKind::Group => ScaleRule::Keep,
        }
    }

    /// Text and live-text kinds.
    pub fn is_text(self) -> bool {
        matches!(self, ShapeKind::Text | ShapeKind::Live(_))
    }

    /// Image and video kinds.
    pub fn is_media(self) -> bool {
        matches!(self, ShapeKind::Image | ShapeKind::Video)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when a `className` tag names no known shape kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown shape kind: {}", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for ShapeKind {
    type Err = UnknownKind;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let kind = match tag {
            "Rect" => ShapeKind::Rect,
            "Circle" => ShapeKind::Circle,
            "Text" => ShapeKind::Text,
            "Image" => ShapeKind::Image,
            "Video" => ShapeKind::Video,
            "Line" => ShapeKind::Line,
            "Arrow" => ShapeKind::Arrow,
            "Group" => ShapeKind::Group,
            other => {
                return LiveKind::all()
                    .iter()
                    .find(|live| live.tag() == other)
                    .map(|live| ShapeKind::Live(*live))
                    .ok_or_else(|| UnknownKind(other.to_string()));
            }
        };
        Ok(kind)
    }
}

/// Common trait for all shapes.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> &str;

    /// Position, rotation and scale.
    fn placement(&self) -> &Placement;

    fn placement_mut(&mut self) -> &mut Placement;

    /// Bounding box in the node's own (unscaled, unrotated) coordinates.
    fn local_bounds(&self) -> Rect;
}

/// Enum wrapper for all shape kinds.
///
/// Serializes as a `{ className, attrs, children? }` node record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "crate::record::NodeRecord", into = "crate::record::NodeRecord")]
pub enum Shape {
    Rect(Rectangle),
    Circle(Circle),
    Text(Text),
    Live(LiveText),
    Image(Media),
    Video(Media),
    Line(Line),
    Arrow(Arrow),
    Group(Group),
}

macro_rules! each_shape {
    ($value:expr, $s:ident => $body:expr) => {
        match $value {
            Shape::Rect($s) => $body,
            Shape::Circle($s) => $body,
            Shape::Text($s) => $body,
            Shape::Live(live) => {
                let $s = &live.text;
                $body
            }
            Shape::Image($s) => $body,
            Shape::Video($s) => $body,
            Shape::Line($s) => $body,
            Shape::Arrow($s) => $body,
            Shape::Group($s) => $body,
        }
    };
}

macro_rules! each_shape_mut {
    ($value:expr, $s:ident => $body:expr) => {
        match $value {
            Shape::Rect($s) => $body,
            Shape::Circle($s) => $body,
            Shape::Text($s) => $body,
            Shape::Live(live) => {
                let $s = &mut live.text;
                $body
            }
            Shape::Image($s) => $body,
            Shape::Video($s) => $body,
            Shape::Line($s) => $body,
            Shape::Arrow($s) => $body,
            Shape::Group($s) => $body,
        }
    };
}

impl Shape {
    pub fn id(&self) -> &str {
        each_shape!(self, s => s.id())
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rect(_) => ShapeKind::Rect,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Text(_) => ShapeKind::Text,
            Shape::Live(live) => ShapeKind::Live(live.kind),
            Shape::Image(_) => ShapeKind::Image,
            Shape::Video(_) => ShapeKind::Video,
            Shape::Line(_) => ShapeKind::Line,
            Shape::Arrow(_) => ShapeKind::Arrow,
            Shape::Group(_) => ShapeKind::Group,
        }
    }

    pub fn placement(&self) -> &Placement {
        each_shape!(self, s => s.placement())
    }

    pub fn placement_mut(&mut self) -> &mut Placement {
        each_shape_mut!(self, s => s.placement_mut())
    }

    pub fn local_bounds(&self) -> Rect {
        each_shape!(self, s => s.local_bounds())
    }

    /// Node-local to parent transform.
    pub fn local_transform(&self) -> Affine {
        self.placement().transform()
    }

    /// Axis-aligned bounding box in stage coordinates for a top-level shape.
    pub fn bounds(&self) -> Rect {
        self.bounds_in(Affine::IDENTITY)
    }

    /// Axis-aligned bounding box under a parent transform.
    pub fn bounds_in(&self, parent: Affine) -> Rect {
        (parent * self.local_transform()).transform_rect_bbox(self.local_bounds())
    }

    /// Paint attributes, if the kind has any.
    pub fn style(&self) -> Option<&ShapeStyle> {
        match self {
            Shape::Rect(s) => Some(&s.style),
            Shape::Circle(s) => Some(&s.style),
            Shape::Text(s) => Some(&s.style),
            Shape::Live(s) => Some(&s.text.style),
            Shape::Image(s) | Shape::Video(s) => Some(&s.style),
            Shape::Line(s) => Some(&s.style),
            Shape::Arrow(s) => Some(&s.style),
            Shape::Group(_) => None,
        }
    }

    pub fn style_mut(&mut self) -> Option<&mut ShapeStyle> {
        match self {
            Shape::Rect(s) => Some(&mut s.style),
            Shape::Circle(s) => Some(&mut s.style),
            Shape::Text(s) => Some(&mut s.style),
            Shape::Live(s) => Some(&mut s.text.style),
            Shape::Image(s) | Shape::Video(s) => Some(&mut s.style),
            Shape::Line(s) => Some(&mut s.style),
            Shape::Arrow(s) => Some(&mut s.style),
            Shape::Group(_) => None,
        }
    }

    /// Unknown attributes preserved from the persisted record.
    pub fn extra(&self) -> &ExtraAttrs {
        match self {
            Shape::Rect(s) => &s.extra,
            Shape::Circle(s) => &s.extra,
            Shape::Text(s) => &s.extra,
            Shape::Live(s) => &s.text.extra,
            Shape::Image(s) | Shape::Video(s) => &s.extra,
            Shape::Line(s) => &s.extra,
            Shape::Arrow(s) => &s.extra,
            Shape::Group(s) => &s.extra,
        }
    }

    /// Check if this shape is a group.
    pub fn is_group(&self) -> bool {
        matches!(self, Shape::Group(_))
    }

    /// Get the group if this shape is a group.
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Shape::Group(g) => Some(g),
            _ => None,
        }
    }

    /// Get the mutable group if this shape is a group.
    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Shape::Group(g) => Some(g),
            _ => None,
        }
    }

    /// Line-like point list for Line and Arrow.
    pub fn points(&self) -> Option<&[f64]> {
        match self {
            Shape::Line(l) => Some(&l.points),
            Shape::Arrow(a) => Some(&a.points),
            _ => None,
        }
    }

    pub fn points_mut(&mut self) -> Option<&mut Vec<f64>> {
        match self {
            Shape::Line(l) => Some(&mut l.points),
            Shape::Arrow(a) => Some(&mut a.points),
            _ => None,
        }
    }

    /// Text body of Text and live-text shapes.
    pub fn text(&self) -> Option<&Text> {
        match self {
            Shape::Text(t) => Some(t),
            Shape::Live(live) => Some(&live.text),
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Shape::Text(t) => Some(t),
            Shape::Live(live) => Some(&mut live.text),
            _ => None,
        }
    }

    /// Image or video payload.
    pub fn media(&self) -> Option<&Media> {
        match self {
            Shape::Image(m) | Shape::Video(m) => Some(m),
            _ => None,
        }
    }

    pub fn media_mut(&mut self) -> Option<&mut Media> {
        match self {
            Shape::Image(m) | Shape::Video(m) => Some(m),
            _ => None,
        }
    }

    /// Regenerate the shape's id, and the ids of any nested children.
    pub fn regenerate_ids(&mut self) {
        each_shape_mut!(self, s => s.id = new_shape_id());
        if let Shape::Group(group) = self {
            for child in &mut group.children {
                child.regenerate_ids();
            }
        }
    }

    pub(crate) fn set_id(&mut self, id: ShapeId) {
        each_shape_mut!(self, s => s.id = id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_round_trip() {
        let kinds = [
            ShapeKind::Rect,
            ShapeKind::Circle,
            ShapeKind::Text,
            ShapeKind::Image,
            ShapeKind::Video,
            ShapeKind::Line,
            ShapeKind::Arrow,
            ShapeKind::Group,
            ShapeKind::Live(LiveKind::DateTime),
            ShapeKind::Live(LiveKind::KpiCounter),
        ];
        for kind in kinds {
            assert_eq!(kind.tag().parse::<ShapeKind>(), Ok(kind));
        }
        assert!("Star".parse::<ShapeKind>().is_err());
    }

    #[test]
    fn test_scale_rules() {
        assert_eq!(ShapeKind::Rect.scale_rule(), ScaleRule::BakeSize);
        assert_eq!(ShapeKind::Live(LiveKind::SecurityCounter).scale_rule(), ScaleRule::BakeSize);
        assert_eq!(ShapeKind::Circle.scale_rule(), ScaleRule::BakeRadius);
        assert_eq!(ShapeKind::Arrow.scale_rule(), ScaleRule::Keep);
    }

    #[test]
    fn test_rotated_bounds() {
        let mut rect = Rectangle::new(Placement::at(100.0, 100.0), 100.0, 50.0);
        rect.placement.rotation = 90.0;
        let bounds = Shape::Rect(rect).bounds();
        // Rotating around the top-left origin swings the box to the left.
        assert!((bounds.x0 - 50.0).abs() < 1e-9);
        assert!((bounds.x1 - 100.0).abs() < 1e-9);
        assert!((bounds.y0 - 100.0).abs() < 1e-9);
        assert!((bounds.y1 - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_scaled_bounds() {
        let mut rect = Rectangle::new(Placement::at(10.0, 10.0), 100.0, 50.0);
        rect.placement.scale_x = 2.0;
        let bounds = Shape::Rect(rect).bounds();
        assert!((bounds.width() - 200.0).abs() < 1e-9);
        assert!((bounds.height() - 50.0).abs() < 1e-9);
    }
}

//! Sparse attribute updates.
//!
//! An [`AttrPatch`] names absolute values for a subset of a shape's
//! attributes. Applying one is idempotent: applying it twice leaves the shape
//! exactly as applying it once.

use crate::shapes::{Shape, ShapeId, points_well_formed};
use serde::{Deserialize, Serialize};

/// Absolute attribute values to write onto a shape. `None` leaves a field alone.
///
/// Fields that do not exist on the target kind are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttrPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_resize: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

/// Per-shape patches written together as one update.
pub type BatchUpdate = Vec<(ShapeId, AttrPatch)>;

impl AttrPatch {
    /// Patch moving a shape to a position.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch setting a fill color.
    pub fn fill(color: impl Into<String>) -> Self {
        Self {
            fill: Some(color.into()),
            ..Self::default()
        }
    }

    /// Full geometric state of a shape: placement plus its kind's sizing.
    pub fn geometry_of(shape: &Shape) -> Self {
        let p = shape.placement();
        let mut patch = Self {
            x: Some(p.x),
            y: Some(p.y),
            rotation: Some(p.rotation),
            scale_x: Some(p.scale_x),
            scale_y: Some(p.scale_y),
            ..Self::default()
        };
        match shape {
            Shape::Rect(r) => {
                patch.width = Some(r.width);
                patch.height = Some(r.height);
            }
            Shape::Text(t) => {
                patch.width = Some(t.width);
                patch.height = Some(t.height);
            }
            Shape::Live(l) => {
                patch.width = Some(l.text.width);
                patch.height = Some(l.text.height);
            }
            Shape::Image(m) | Shape::Video(m) => {
                patch.width = Some(m.width);
                patch.height = Some(m.height);
            }
            Shape::Circle(c) => patch.radius = Some(c.radius),
            Shape::Line(_) | Shape::Arrow(_) | Shape::Group(_) => {}
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write the patch onto a shape.
    pub fn apply_to(&self, shape: &mut Shape) {
        {
            let p = shape.placement_mut();
            if let Some(x) = self.x {
                p.x = x;
            }
            if let Some(y) = self.y {
                p.y = y;
            }
            if let Some(rotation) = self.rotation {
                p.rotation = rotation;
            }
            if let Some(sx) = self.scale_x {
                p.scale_x = sx;
            }
            if let Some(sy) = self.scale_y {
                p.scale_y = sy;
            }
        }

        let size = match &mut *shape {
            Shape::Rect(r) => Some((&mut r.width, &mut r.height)),
            Shape::Text(t) => Some((&mut t.width, &mut t.height)),
            Shape::Live(l) => Some((&mut l.text.width, &mut l.text.height)),
            Shape::Image(m) | Shape::Video(m) => Some((&mut m.width, &mut m.height)),
            _ => None,
        };
        if let Some((width, height)) = size {
            if let Some(w) = self.width {
                *width = w;
            }
            if let Some(h) = self.height {
                *height = h;
            }
        }

        if let (Shape::Circle(c), Some(radius)) = (&mut *shape, self.radius) {
            c.radius = radius;
        }

        if let Some(points) = &self.points {
            if points_well_formed(points) {
                if let Some(target) = shape.points_mut() {
                    target.clone_from(points);
                }
            } else {
                log::warn!(
                    "ignoring malformed points ({} values) for {}",
                    points.len(),
                    shape.id()
                );
            }
        }

        if let Some(text) = shape.text_mut() {
            if let Some(content) = &self.text {
                text.text.clone_from(content);
            }
            if let Some(size) = self.font_size {
                text.text_style.font_size = size;
            }
        }

        if let Some(media) = shape.media_mut() {
            if let Some(src) = &self.src {
                media.src = Some(src.clone());
            }
            if let Some(auto_resize) = self.auto_resize {
                media.auto_resize = auto_resize;
            }
        }

        if let Some(style) = shape.style_mut() {
            if let Some(fill) = &self.fill {
                style.fill = Some(fill.clone());
            }
            if let Some(stroke) = &self.stroke {
                style.stroke = Some(stroke.clone());
            }
            if let Some(width) = self.stroke_width {
                style.stroke_width = Some(width);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Arrow, Circle, Placement, Rectangle};

    #[test]
    fn test_apply_twice_is_idempotent() {
        let mut shape = Shape::Rect(Rectangle::new(Placement::at(0.0, 0.0), 10.0, 10.0));
        let patch = AttrPatch {
            x: Some(40.0),
            width: Some(120.0),
            fill: Some("#00ff00".to_string()),
            ..AttrPatch::default()
        };
        patch.apply_to(&mut shape);
        let once = shape.clone();
        patch.apply_to(&mut shape);
        assert_eq!(shape, once);
    }

    #[test]
    fn test_irrelevant_fields_ignored() {
        let mut shape = Shape::Circle(Circle::new(Placement::at(0.0, 0.0), 10.0));
        let patch = AttrPatch {
            width: Some(99.0),
            radius: Some(20.0),
            ..AttrPatch::default()
        };
        patch.apply_to(&mut shape);
        match &shape {
            Shape::Circle(c) => assert!((c.radius - 20.0).abs() < f64::EPSILON),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_malformed_points_rejected() {
        let mut shape = Shape::Arrow(Arrow::new(Placement::default(), vec![0.0, 0.0, 10.0, 0.0]));
        AttrPatch {
            points: Some(vec![1.0, 2.0, 3.0]),
            ..AttrPatch::default()
        }
        .apply_to(&mut shape);
        assert_eq!(shape.points().unwrap(), &[0.0, 0.0, 10.0, 0.0]);
    }

    #[test]
    fn test_geometry_of_rect() {
        let shape = Shape::Rect(Rectangle::new(Placement::at(1.0, 2.0), 3.0, 4.0));
        let patch = AttrPatch::geometry_of(&shape);
        assert_eq!(patch.width, Some(3.0));
        assert_eq!(patch.scale_x, Some(1.0));
        assert!(patch.radius.is_none());
    }
}

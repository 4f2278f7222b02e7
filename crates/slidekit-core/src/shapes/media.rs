//! Image and video shapes.

use super::{ExtraAttrs, Placement, ShapeId, ShapeStyle, ShapeTrait, new_shape_id};
use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};

fn is_false(v: &bool) -> bool {
    !*v
}

/// A media frame. The `Image`/`Video` distinction lives on [`super::Shape`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(default = "new_shape_id")]
    pub(crate) id: ShapeId,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Fit to the natural size on first load, then cleared.
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_resize: bool,
    #[serde(flatten)]
    pub style: ShapeStyle,
    #[serde(flatten)]
    pub extra: ExtraAttrs,
}

impl Media {
    pub fn new(placement: Placement, width: f64, height: f64, src: Option<String>) -> Self {
        Self {
            id: new_shape_id(),
            placement,
            width,
            height,
            src,
            auto_resize: false,
            style: ShapeStyle::default(),
            extra: ExtraAttrs::new(),
        }
    }

    /// A frame without a source cannot be displayed.
    pub fn has_source(&self) -> bool {
        self.src.as_deref().is_some_and(|s| !s.is_empty())
    }
}

impl ShapeTrait for Media {
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
        Rect::new(0.0, 0.0, self.width, self.height).abs()
    }
}

/// Largest size with the natural aspect ratio that fits inside `bounds`.
/// Media smaller than the bounds keeps its natural size.
pub fn fit_within(natural: Size, bounds: Size) -> Size {
    if natural.width <= 0.0 || natural.height <= 0.0 {
        return bounds;
    }
    let scale = (bounds.width / natural.width)
        .min(bounds.height / natural.height)
        .min(1.0);
    Size::new(natural.width * scale, natural.height * scale)
}

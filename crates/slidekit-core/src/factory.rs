//! Canonical new shapes.

use crate::shapes::{
    Arrow, Circle, Line, LiveText, Media, Placement, Rectangle, Shape, ShapeKind, ShapeStyle,
    Text, TextAlign,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FILL: &str = "#3b82f6";
pub const DEFAULT_STROKE: &str = "#1e40af";
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;
pub const DEFAULT_TEXT_COLOR: &str = "#111827";
pub const PLACEHOLDER_TEXT: &str = "Double-click to edit";

const RECT_SIZE: (f64, f64) = (200.0, 100.0);
const CIRCLE_RADIUS: f64 = 50.0;
const TEXT_BOX: (f64, f64) = (200.0, 50.0);
const MEDIA_BOX: (f64, f64) = (320.0, 180.0);
const SEGMENT_HALF_LENGTH: f64 = 50.0;

/// Per-kind extras for [`ShapeFactory::create`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeOptions {
    /// Media: fit to the natural size on first load.
    pub auto_resize: bool,
    /// Media: source URL.
    pub src: Option<String>,
    /// Media: library id to associate with the slide.
    pub media_id: Option<String>,
    /// Text: initial content instead of the placeholder.
    pub text: Option<String>,
}

/// Top-left that centers a `w`×`h` box on `(cx, cy)`, kept inside the stage when it fits.
fn centered_origin(cx: f64, cy: f64, w: f64, h: f64, stage_w: f64, stage_h: f64) -> (f64, f64) {
    let clamp = |v: f64, size: f64, limit: f64| {
        if size <= limit { v.clamp(0.0, limit - size) } else { v }
    };
    (
        clamp(cx - w / 2.0, w, stage_w),
        clamp(cy - h / 2.0, h, stage_h),
    )
}

fn text_box(mut text: Text, width: f64, height: f64) -> Text {
    text.width = width;
    text.height = height;
    text.text_style.align = Some(TextAlign::Center);
    text.style.fill = Some(DEFAULT_TEXT_COLOR.to_string());
    text
}

/// Builds shapes with default attributes.
pub struct ShapeFactory;

impl ShapeFactory {
    /// Build a shape from its `className` tag. Unknown tags produce nothing.
    pub fn create(
        tag: &str,
        x: f64,
        y: f64,
        stage_width: f64,
        stage_height: f64,
        options: &ShapeOptions,
    ) -> Option<Shape> {
        match tag.parse::<ShapeKind>() {
            Ok(kind) => Self::create_kind(kind, x, y, stage_width, stage_height, options),
            Err(err) => {
                log::debug!("factory ignored: {err}");
                None
            }
        }
    }

    /// Build a shape centered on `(x, y)`. Groups are never created empty.
    pub fn create_kind(
        kind: ShapeKind,
        x: f64,
        y: f64,
        stage_width: f64,
        stage_height: f64,
        options: &ShapeOptions,
    ) -> Option<Shape> {
        let origin = |(w, h): (f64, f64)| {
            let (ox, oy) = centered_origin(x, y, w, h, stage_width, stage_height);
            Placement::at(ox, oy)
        };
        let shape = match kind {
            ShapeKind::Rect => {
                let mut rect = Rectangle::new(origin(RECT_SIZE), RECT_SIZE.0, RECT_SIZE.1);
                rect.style = ShapeStyle::filled(DEFAULT_FILL, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH);
                Shape::Rect(rect)
            }
            ShapeKind::Circle => {
                let mut circle = Circle::new(Placement::at(x, y), CIRCLE_RADIUS);
                circle.style =
                    ShapeStyle::filled(DEFAULT_FILL, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH);
                Shape::Circle(circle)
            }
            ShapeKind::Text => {
                let content = options.text.clone().unwrap_or_else(|| PLACEHOLDER_TEXT.to_string());
                let text = Text::new(origin(TEXT_BOX), content);
                Shape::Text(text_box(text, TEXT_BOX.0, TEXT_BOX.1))
            }
            ShapeKind::Live(live) => {
                let mut live = LiveText::new(live, origin(TEXT_BOX));
                live.text = text_box(live.text, TEXT_BOX.0, TEXT_BOX.1);
                Shape::Live(live)
            }
            ShapeKind::Image | ShapeKind::Video => {
                let mut media =
                    Media::new(origin(MEDIA_BOX), MEDIA_BOX.0, MEDIA_BOX.1, options.src.clone());
                media.auto_resize = options.auto_resize;
                if kind == ShapeKind::Image {
                    Shape::Image(media)
                } else {
                    Shape::Video(media)
                }
            }
            ShapeKind::Line | ShapeKind::Arrow => {
                let points = vec![-SEGMENT_HALF_LENGTH, 0.0, SEGMENT_HALF_LENGTH, 0.0];
                let style = ShapeStyle::stroked(DEFAULT_STROKE, DEFAULT_STROKE_WIDTH);
                if kind == ShapeKind::Line {
                    let mut line = Line::new(Placement::at(x, y), points);
                    line.style = style;
                    Shape::Line(line)
                } else {
                    let mut arrow = Arrow::new(Placement::at(x, y), points);
                    arrow.style = ShapeStyle {
                        fill: Some(DEFAULT_STROKE.to_string()),
                        ..style
                    };
                    Shape::Arrow(arrow)
                }
            }
            ShapeKind::Group => {
                log::debug!("factory ignored: groups are built from existing shapes");
                return None;
            }
        };
        Some(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{LiveKind, ScaleRule};

    fn make(tag: &str, x: f64, y: f64) -> Option<Shape> {
        ShapeFactory::create(tag, x, y, 1920.0, 1080.0, &ShapeOptions::default())
    }

    #[test]
    fn test_rect_centered_on_point() {
        let shape = make("Rect", 200.0, 150.0).unwrap();
        let b = shape.bounds();
        assert!((b.x0 - 100.0).abs() < 1e-9);
        assert!((b.y0 - 100.0).abs() < 1e-9);
        assert!((b.width() - 200.0).abs() < 1e-9);
        assert!((b.height() - 100.0).abs() < 1e-9);
        assert_eq!(shape.style().unwrap().fill.as_deref(), Some(DEFAULT_FILL));
    }

    #[test]
    fn test_rect_kept_inside_stage() {
        let shape = make("Rect", 5.0, 1079.0).unwrap();
        let b = shape.bounds();
        assert!(b.x0.abs() < 1e-9);
        assert!((b.y1 - 1080.0).abs() < 1e-9);
    }

    #[test]
    fn test_circle_and_text_defaults() {
        let Some(Shape::Circle(circle)) = make("Circle", 300.0, 300.0) else {
            panic!("expected circle");
        };
        assert!((circle.radius - 50.0).abs() < f64::EPSILON);
        assert!((circle.placement.x - 300.0).abs() < f64::EPSILON);

        let Some(Shape::Text(text)) = make("Text", 300.0, 300.0) else {
            panic!("expected text");
        };
        assert_eq!(text.text, PLACEHOLDER_TEXT);
        assert_eq!(text.text_style.align(), TextAlign::Center);
        assert!((text.width - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_arrow_is_horizontal_segment() {
        let Some(Shape::Arrow(arrow)) = make("Arrow", 400.0, 400.0) else {
            panic!("expected arrow");
        };
        assert_eq!(arrow.points, vec![-50.0, 0.0, 50.0, 0.0]);
        assert!((arrow.pointer_length - Arrow::DEFAULT_POINTER).abs() < f64::EPSILON);
        let b = Shape::Arrow(arrow).bounds();
        assert!((b.center().x - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_media_options() {
        let options = ShapeOptions {
            auto_resize: true,
            src: Some("https://cdn/clip.mp4".to_string()),
            ..ShapeOptions::default()
        };
        let Some(Shape::Video(video)) =
            ShapeFactory::create("Video", 500.0, 500.0, 1920.0, 1080.0, &options)
        else {
            panic!("expected video");
        };
        assert!(video.auto_resize);
        assert!(video.has_source());
    }

    #[test]
    fn test_live_kinds_bake_size() {
        for live in LiveKind::all() {
            let shape = make(live.tag(), 100.0, 100.0).unwrap();
            assert_eq!(shape.kind(), ShapeKind::Live(*live));
            assert_eq!(shape.kind().scale_rule(), ScaleRule::BakeSize);
        }
    }

    #[test]
    fn test_unknown_kind_and_group_are_none() {
        assert!(make("Hexagon", 0.0, 0.0).is_none());
        assert!(make("Group", 0.0, 0.0).is_none());
    }

    #[test]
    fn test_ids_are_fresh() {
        let a = make("Rect", 0.0, 0.0).unwrap();
        let b = make("Rect", 0.0, 0.0).unwrap();
        assert_ne!(a.id(), b.id());
    }
}

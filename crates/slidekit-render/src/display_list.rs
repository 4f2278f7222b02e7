//! Backend-agnostic display list.
//!
//! [`DisplayListRenderer`] flattens a frame into [`DrawItem`]s in viewport
//! space. A GPU or canvas backend replays the list; tests inspect it.

use crate::color::{color_or, parse_color};
use crate::renderer::{RenderContext, RenderResult, Renderer};
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape as KurboShape};
use peniko::Color;
use slidekit_core::handles::{HANDLE_SIZE, HandleKind};
use slidekit_core::shapes::{
    Arrow, Line, Media, Shape, ShapeId, ShapeStyle, Text, TextAlign, point_pairs,
    points_well_formed,
};

const TOLERANCE: f64 = 0.1;
const DEFAULT_TEXT_COLOR: Color = Color::BLACK;

/// How a path is painted.
#[derive(Debug, Clone)]
pub enum Paint {
    Fill(Color),
    Stroke {
        color: Color,
        width: f64,
        /// Dash and gap length, if dashed.
        dash: Option<f64>,
    },
}

/// One drawing command.
#[derive(Debug, Clone)]
pub enum DrawItem {
    Path {
        /// Owning shape; `None` for overlays.
        shape_id: Option<ShapeId>,
        transform: Affine,
        path: BezPath,
        paint: Paint,
    },
    Text {
        shape_id: ShapeId,
        transform: Affine,
        bounds: Rect,
        text: String,
        font_size: f64,
        font_family: Option<String>,
        bold: bool,
        italic: bool,
        align: TextAlign,
        color: Color,
    },
    Media {
        shape_id: ShapeId,
        transform: Affine,
        bounds: Rect,
        src: String,
        video: bool,
    },
}

impl DrawItem {
    pub fn shape_id(&self) -> Option<&str> {
        match self {
            DrawItem::Path { shape_id, .. } => shape_id.as_deref(),
            DrawItem::Text { shape_id, .. } | DrawItem::Media { shape_id, .. } => Some(shape_id),
        }
    }
}

/// Renderer that records draw items.
#[derive(Debug)]
pub struct DisplayListRenderer {
    items: Vec<DrawItem>,
    zoom: f64,
    selection_color: Color,
}

impl Default for DisplayListRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayListRenderer {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            zoom: 1.0,
            selection_color: Color::from_rgba8(59, 130, 246, 255),
        }
    }

    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    pub fn take_items(&mut self) -> Vec<DrawItem> {
        std::mem::take(&mut self.items)
    }

    fn push_path(&mut self, shape_id: Option<&str>, transform: Affine, path: BezPath, paint: Paint) {
        self.items.push(DrawItem::Path {
            shape_id: shape_id.map(str::to_string),
            transform,
            path,
            paint,
        });
    }

    /// Fill then stroke, each only when the style asks for it.
    fn render_path(&mut self, id: &str, path: BezPath, style: &ShapeStyle, transform: Affine) {
        if let Some(fill) = style.fill.as_deref().and_then(parse_color) {
            self.push_path(Some(id), transform, path.clone(), Paint::Fill(fill));
        }
        let width = style.stroke_width.unwrap_or(1.0);
        if let Some(color) = style.stroke.as_deref().and_then(parse_color) {
            if width > 0.0 {
                self.push_path(
                    Some(id),
                    transform,
                    path,
                    Paint::Stroke { color, width, dash: None },
                );
            }
        }
    }

    fn polyline(points: &[f64]) -> BezPath {
        let mut path = BezPath::new();
        for (i, p) in point_pairs(points).into_iter().enumerate() {
            if i == 0 {
                path.move_to(p);
            } else {
                path.line_to(p);
            }
        }
        path
    }

    fn render_line(&mut self, line: &Line, id: &str, transform: Affine) -> bool {
        if !points_well_formed(&line.points) {
            return false;
        }
        let color = color_or(line.style.stroke.as_deref(), Color::BLACK);
        let width = line.style.stroke_width.unwrap_or(1.0);
        self.push_path(
            Some(id),
            transform,
            Self::polyline(&line.points),
            Paint::Stroke { color, width, dash: None },
        );
        true
    }

    fn render_arrow(&mut self, arrow: &Arrow, id: &str, transform: Affine) -> bool {
        if !points_well_formed(&arrow.points) {
            return false;
        }
        let color = color_or(arrow.style.stroke.as_deref(), Color::BLACK);
        let width = arrow.style.stroke_width.unwrap_or(1.0);
        self.push_path(
            Some(id),
            transform,
            Self::polyline(&arrow.points),
            Paint::Stroke { color, width, dash: None },
        );
        if let Some([tip, left, right]) = arrow.head() {
            let mut head = BezPath::new();
            head.move_to(tip);
            head.line_to(left);
            head.line_to(right);
            head.close_path();
            let fill = color_or(arrow.style.fill.as_deref(), color);
            self.push_path(Some(id), transform, head, Paint::Fill(fill));
        }
        true
    }

    fn render_text(&mut self, text: &Text, id: &str, transform: Affine) {
        let bounds = Rect::new(0.0, 0.0, text.box_width(), text.box_height());
        let outline = ShapeStyle {
            fill: None,
            ..text.style.clone()
        };
        self.render_path(id, bounds.to_path(TOLERANCE), &outline, transform);
        self.items.push(DrawItem::Text {
            shape_id: id.to_string(),
            transform,
            bounds,
            text: text.text.clone(),
            font_size: text.text_style.font_size,
            font_family: text.text_style.font_family.clone(),
            bold: text.text_style.is_bold(),
            italic: text.text_style.is_italic(),
            align: text.text_style.align(),
            color: color_or(text.style.fill.as_deref(), DEFAULT_TEXT_COLOR),
        });
    }

    fn render_media(&mut self, media: &Media, id: &str, transform: Affine, video: bool) -> bool {
        let Some(src) = media.src.as_deref().filter(|_| media.has_source()) else {
            return false;
        };
        self.items.push(DrawItem::Media {
            shape_id: id.to_string(),
            transform,
            bounds: Rect::new(0.0, 0.0, media.width, media.height),
            src: src.to_string(),
            video,
        });
        true
    }

    /// Draw one shape. `parent` maps the shape's parent space to the viewport.
    fn render_shape(&mut self, shape: &Shape, parent: Affine, ctx: &RenderContext) {
        if ctx.editing_shape_id.as_deref() == Some(shape.id()) {
            return;
        }
        let transform = parent * shape.local_transform();
        let id = shape.id();
        let drawn = match shape {
            Shape::Rect(rect) => {
                self.render_path(id, rect.outline().to_path(TOLERANCE), &rect.style, transform);
                true
            }
            Shape::Circle(circle) => {
                let path = Circle::new(Point::ZERO, circle.radius.abs()).to_path(TOLERANCE);
                self.render_path(id, path, &circle.style, transform);
                true
            }
            Shape::Text(text) => {
                self.render_text(text, id, transform);
                true
            }
            Shape::Live(live) => {
                self.render_text(&live.text, id, transform);
                true
            }
            Shape::Image(media) => self.render_media(media, id, transform, false),
            Shape::Video(media) => self.render_media(media, id, transform, true),
            Shape::Line(line) => self.render_line(line, id, transform),
            Shape::Arrow(arrow) => self.render_arrow(arrow, id, transform),
            Shape::Group(group) => {
                for child in &group.children {
                    self.render_shape(child, transform, ctx);
                }
                true
            }
        };
        if !drawn {
            log::warn!("skipping malformed {} {}", shape.kind(), id);
        }
    }

    fn dashed_outline(&mut self, rect: Rect, view: Affine) {
        let width = 1.0 / self.zoom;
        let color = self.selection_color;
        self.push_path(
            None,
            view,
            rect.to_path(TOLERANCE),
            Paint::Stroke { color, width, dash: Some(4.0 / self.zoom) },
        );
    }

    fn render_selection(&mut self, ctx: &RenderContext, view: Affine) {
        for id in &ctx.selected {
            if let Some(bounds) = ctx.tree.bounds_of(id) {
                self.dashed_outline(bounds, view);
            }
        }
    }

    /// Handles keep a constant screen size.
    fn render_handles(&mut self, ctx: &RenderContext, view: Affine) {
        let size = HANDLE_SIZE / self.zoom;
        let stroke = Paint::Stroke {
            color: self.selection_color,
            width: 1.5 / self.zoom,
            dash: None,
        };
        for handle in &ctx.handles {
            let path = match handle.kind {
                HandleKind::Rotate => Circle::new(handle.position, size / 2.0).to_path(TOLERANCE),
                HandleKind::Corner(_) | HandleKind::Edge(_) => {
                    Rect::from_center_size(handle.position, (size, size)).to_path(TOLERANCE)
                }
            };
            self.push_path(None, view, path.clone(), Paint::Fill(Color::WHITE));
            self.push_path(None, view, path, stroke.clone());
        }
        for anchor in &ctx.arrow_anchors {
            let path = Circle::new(*anchor, size / 2.0).to_path(TOLERANCE);
            self.push_path(None, view, path.clone(), Paint::Fill(Color::WHITE));
            self.push_path(None, view, path, stroke.clone());
        }
    }

    fn render_guides(&mut self, ctx: &RenderContext, view: Affine) {
        let color = Color::from_rgba8(236, 72, 153, 255); // Pink
        for line in &ctx.guide_lines {
            let mut path = BezPath::new();
            path.move_to(line.p0);
            path.line_to(line.p1);
            self.push_path(
                None,
                view,
                path,
                Paint::Stroke { color, width: 1.0 / self.zoom, dash: None },
            );
        }
    }

    fn render_marquee(&mut self, rect: Rect, view: Affine) {
        let fill = Color::from_rgba8(59, 130, 246, 25);
        self.push_path(None, view, rect.to_path(TOLERANCE), Paint::Fill(fill));
        self.dashed_outline(rect, view);
    }
}

impl Renderer for DisplayListRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        self.items.clear();
        self.selection_color = ctx.selection_color;
        self.zoom = ctx.zoom() * ctx.scale_factor;
        if self.zoom <= 0.0 {
            self.zoom = 1.0;
        }
        let view = ctx.view_transform() * Affine::scale(ctx.scale_factor);

        self.push_path(
            None,
            view,
            ctx.tree.stage_rect().to_path(TOLERANCE),
            Paint::Fill(ctx.stage_color()),
        );
        for layer in &ctx.tree.layers {
            for shape in &layer.shapes {
                self.render_shape(shape, view, ctx);
            }
        }
        self.render_selection(ctx, view);
        self.render_handles(ctx, view);
        self.render_guides(ctx, view);
        if let Some(rect) = ctx.selection_rect {
            self.render_marquee(rect.abs(), view);
        }
        Ok(())
    }
}

//! Renderer trait abstraction.

use crate::color::color_or;
use kurbo::{Affine, Line, Point, Rect, Size};
use peniko::Color;
use slidekit_core::editor::Editor;
use slidekit_core::handles::Handle;
use slidekit_core::scene::SceneTree;
use slidekit_core::shapes::{Endpoint, ShapeId};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render frame.
///
/// Scene and overlay geometry is in stage coordinates; the renderer maps the
/// stage into the viewport.
pub struct RenderContext<'a> {
    /// The slide to render.
    pub tree: &'a SceneTree,
    /// Viewport size in physical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Color around the stage.
    pub backdrop_color: Color,
    /// Selection highlight color.
    pub selection_color: Color,
    pub selected: Vec<ShapeId>,
    /// Marquee rectangle being dragged.
    pub selection_rect: Option<Rect>,
    /// Shape under the inline text editor (not drawn).
    pub editing_shape_id: Option<ShapeId>,
    pub handles: Vec<Handle>,
    pub arrow_anchors: Vec<Point>,
    pub guide_lines: Vec<Line>,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(tree: &'a SceneTree, viewport_size: Size) -> Self {
        Self {
            tree,
            viewport_size,
            scale_factor: 1.0,
            backdrop_color: Color::from_rgba8(229, 231, 235, 255),
            selection_color: Color::from_rgba8(59, 130, 246, 255), // Blue
            selected: Vec::new(),
            selection_rect: None,
            editing_shape_id: None,
            handles: Vec::new(),
            arrow_anchors: Vec::new(),
            guide_lines: Vec::new(),
        }
    }

    /// Context for the editor's open slide with all of its overlays.
    pub fn for_editor(editor: &'a Editor, viewport_size: Size) -> Option<Self> {
        let tree = editor.tree()?;
        let arrows = editor.arrow_transformer();
        Some(Self {
            selected: editor.selection().to_vec(),
            editing_shape_id: editor.text_edit().editing_id().map(str::to_string),
            handles: editor.handles(),
            arrow_anchors: [Endpoint::Start, Endpoint::End]
                .into_iter()
                .filter_map(|which| arrows.anchor(which))
                .collect(),
            guide_lines: editor.guide_lines(),
            ..Self::new(tree, viewport_size)
        })
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the selection rectangle.
    pub fn with_selection_rect(mut self, rect: Option<Rect>) -> Self {
        self.selection_rect = rect;
        self
    }

    /// Stage background color from the tree.
    pub fn stage_color(&self) -> Color {
        color_or(Some(&self.tree.background_color), Color::WHITE)
    }

    /// Stage-to-viewport transform: the stage is fitted and centered.
    pub fn view_transform(&self) -> Affine {
        let stage = self.tree.stage_rect();
        if stage.width() <= 0.0 || stage.height() <= 0.0 {
            return Affine::IDENTITY;
        }
        let scale = (self.viewport_size.width / stage.width())
            .min(self.viewport_size.height / stage.height());
        let offset = (
            (self.viewport_size.width - stage.width() * scale) / 2.0,
            (self.viewport_size.height - stage.height() * scale) / 2.0,
        );
        Affine::translate(offset) * Affine::scale(scale)
    }

    /// Viewport pixels per stage unit.
    pub fn zoom(&self) -> f64 {
        self.view_transform().as_coeffs()[0]
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Build the draw commands for a frame.
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()>;

    /// Get the color to clear with.
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.backdrop_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_transform_fits_and_centers() {
        let tree = SceneTree::new(1920.0, 1080.0, "#ffffff");
        let ctx = RenderContext::new(&tree, Size::new(960.0, 1080.0));
        let view = ctx.view_transform();
        assert!((ctx.zoom() - 0.5).abs() < 1e-9);
        let top_left = view * Point::ZERO;
        assert!(top_left.x.abs() < 1e-9);
        assert!((top_left.y - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_stage_color_from_tree() {
        let tree = SceneTree::new(100.0, 100.0, "#000000");
        let ctx = RenderContext::new(&tree, Size::new(100.0, 100.0));
        assert_eq!(ctx.stage_color().to_rgba8().to_u8_array(), [0, 0, 0, 255]);
    }
}

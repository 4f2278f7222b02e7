//! SlideKit Render Library
//!
//! Renderer abstraction for slide scenes and their editing overlays.
//! The bundled implementation records a backend-agnostic display list.

pub mod color;
mod display_list;
mod renderer;

pub use color::parse_color;
pub use display_list::{DisplayListRenderer, DrawItem, Paint};
pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};

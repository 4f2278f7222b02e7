//! Text shapes: plain text and externally-sourced live text.

use super::{ExtraAttrs, LiveKind, Placement, ShapeId, ShapeStyle, ShapeTrait, new_shape_id};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

fn default_font_size() -> f64 {
    Text::DEFAULT_FONT_SIZE
}

/// Typography attributes of text kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Space-joined style tokens such as `"bold italic"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: Text::DEFAULT_FONT_SIZE,
            font_family: None,
            font_style: None,
            align: None,
        }
    }
}

impl TextStyle {
    fn has_token(&self, token: &str) -> bool {
        self.font_style
            .as_deref()
            .is_some_and(|s| s.split_whitespace().any(|t| t == token))
    }

    pub fn is_bold(&self) -> bool {
        self.has_token("bold")
    }

    pub fn is_italic(&self) -> bool {
        self.has_token("italic")
    }

    /// Flip a style token on or off, keeping bold before italic.
    pub fn toggle(&mut self, token: &str) {
        let mut bold = self.is_bold();
        let mut italic = self.is_italic();
        match token {
            "bold" => bold = !bold,
            "italic" => italic = !italic,
            _ => return,
        }
        let tokens: Vec<&str> = [(bold, "bold"), (italic, "italic")]
            .into_iter()
            .filter_map(|(on, t)| on.then_some(t))
            .collect();
        self.font_style = if tokens.is_empty() {
            Some("normal".to_string())
        } else {
            Some(tokens.join(" "))
        };
    }

    pub fn align(&self) -> TextAlign {
        self.align.unwrap_or_default()
    }
}

/// A text box. A zero width or height means the box follows its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    #[serde(default = "new_shape_id")]
    pub(crate) id: ShapeId,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub text_style: TextStyle,
    #[serde(flatten)]
    pub style: ShapeStyle,
    #[serde(flatten)]
    pub extra: ExtraAttrs,
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 24.0;

    /// Average glyph advance relative to the font size.
    const CHAR_WIDTH_FACTOR: f64 = 0.55;

    pub fn new(placement: Placement, text: String) -> Self {
        Self {
            id: new_shape_id(),
            placement,
            width: 0.0,
            height: 0.0,
            text,
            text_style: TextStyle::default(),
            style: ShapeStyle::default(),
            extra: ExtraAttrs::new(),
        }
    }

    fn line_count(&self) -> usize {
        let count = self.text.lines().count().max(1);
        if self.text.ends_with('\n') { count + 1 } else { count }
    }

    fn approximate_width(&self) -> f64 {
        let longest = self
            .text
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        longest as f64 * self.text_style.font_size * Self::CHAR_WIDTH_FACTOR
    }

    /// Box width, falling back to the content estimate.
    pub fn box_width(&self) -> f64 {
        if self.width > 0.0 { self.width } else { self.approximate_width() }
    }

    /// Box height, falling back to one font size per line.
    pub fn box_height(&self) -> f64 {
        if self.height > 0.0 {
            self.height
        } else {
            self.line_count() as f64 * self.text_style.font_size
        }
    }
}

impl ShapeTrait for Text {
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
        Rect::new(0.0, 0.0, self.box_width(), self.box_height())
    }
}

/// Text whose content is filled in from an external source when displayed.
///
/// Geometry and typography are identical to [`Text`]; the stored `text` is
/// the last rendered value or a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveText {
    pub kind: LiveKind,
    pub text: Text,
}

impl LiveText {
    pub fn new(kind: LiveKind, placement: Placement) -> Self {
        let placeholder = match kind {
            LiveKind::DateTime => "00:00",
            LiveKind::SecurityCounter => "0 days",
            LiveKind::KpiCounter => "0",
        };
        Self {
            kind,
            text: Text::new(placement, placeholder.to_string()),
        }
    }
}

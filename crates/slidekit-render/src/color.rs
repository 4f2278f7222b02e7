//! CSS-style color strings as stored in scene attributes.

use peniko::Color;

fn hex_digit_pair(hex: &str, range: std::ops::Range<usize>) -> Option<u8> {
    u8::from_str_radix(hex.get(range)?, 16).ok()
}

/// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `transparent` or a handful of
/// named colors. Anything else is `None`.
pub fn parse_color(color: &str) -> Option<Color> {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        return match hex.len() {
            3 => {
                let mut channels = hex.chars().map(|c| c.to_digit(16).map(|v| v as u8 * 17));
                let r = channels.next()??;
                let g = channels.next()??;
                let b = channels.next()??;
                Some(Color::from_rgba8(r, g, b, 255))
            }
            6 => Some(Color::from_rgba8(
                hex_digit_pair(hex, 0..2)?,
                hex_digit_pair(hex, 2..4)?,
                hex_digit_pair(hex, 4..6)?,
                255,
            )),
            8 => Some(Color::from_rgba8(
                hex_digit_pair(hex, 0..2)?,
                hex_digit_pair(hex, 2..4)?,
                hex_digit_pair(hex, 4..6)?,
                hex_digit_pair(hex, 6..8)?,
            )),
            _ => None,
        };
    }
    match color.to_ascii_lowercase().as_str() {
        "transparent" => Some(Color::TRANSPARENT),
        "black" => Some(Color::BLACK),
        "white" => Some(Color::WHITE),
        "red" => Some(Color::from_rgba8(255, 0, 0, 255)),
        "green" => Some(Color::from_rgba8(0, 128, 0, 255)),
        "blue" => Some(Color::from_rgba8(0, 0, 255, 255)),
        _ => None,
    }
}

/// Parse an optional attribute, falling back when it is absent or unreadable.
pub fn color_or(color: Option<&str>, fallback: Color) -> Color {
    match color {
        Some(c) => parse_color(c).unwrap_or_else(|| {
            log::debug!("unreadable color {c:?}, using fallback");
            fallback
        }),
        None => fallback,
    }
}

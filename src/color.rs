use std::str::FromStr;

use eframe::egui::Color32;
use palette::Srgb;

use crate::engine::style::LineStyle;

// ---------------------------------------------------------------------------
// Hex colour parsing
// ---------------------------------------------------------------------------

/// Parse `#rrggbb` / `#rgb` into a colour with the given opacity (0..=1).
pub fn parse_hex(hex: &str, opacity: f32) -> Option<Color32> {
    let rgb = Srgb::<u8>::from_str(hex.trim()).ok()?;
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Some(Color32::from_rgba_unmultiplied(
        rgb.red, rgb.green, rgb.blue, alpha,
    ))
}

/// Stroke colour for a derived line, grey if its hex string is malformed.
pub fn stroke_color(style: &LineStyle) -> Color32 {
    parse_hex(style.color, style.opacity).unwrap_or_else(|| {
        log::warn!("invalid colour '{}', falling back to grey", style.color);
        Color32::GRAY
    })
}

// ---------------------------------------------------------------------------
// Chart theme
// ---------------------------------------------------------------------------

/// Colours of the observation series itself. Derived lines carry their own
/// [`LineStyle`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChartTheme {
    pub series: Color32,
    pub point: Color32,
    pub point_radius: f32,
    pub line_width: f32,
}

impl Default for ChartTheme {
    fn default() -> Self {
        let series = parse_hex("#0ea5e9", 1.0).unwrap_or(Color32::LIGHT_BLUE);
        Self {
            series,
            point: series,
            point_radius: 3.0,
            line_width: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Styling metadata handed to the rendering boundary
// ---------------------------------------------------------------------------

/// Where an overlay's label sits along its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPosition {
    Start,
    Center,
    End,
}

/// Stroke description for a derived line. Colours are `#rrggbb` strings;
/// the viewer converts them with [`crate::color::parse_hex`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: &'static str,
    pub opacity: f32,
    pub width: f32,
    /// `(dash, gap)` lengths, `None` for a solid stroke.
    pub dash: Option<(f32, f32)>,
}

pub const REGRESSION_LINE: LineStyle = LineStyle {
    color: "#eaeaea",
    opacity: 1.0,
    width: 2.0,
    dash: None,
};

pub const BAND_LINE: LineStyle = LineStyle {
    color: "#666666",
    opacity: 0.5,
    width: 2.0,
    dash: Some((6.0, 6.0)),
};

pub const MEAN_LINE: LineStyle = LineStyle {
    color: "#3b82f6",
    opacity: 1.0,
    width: 2.0,
    dash: Some((6.0, 6.0)),
};

/// Format with two decimals, never printing `-0.00`.
pub fn fixed2(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0.00".to_string();
    }
    format!("{rounded:.2}")
}

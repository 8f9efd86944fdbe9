//! Explicit styling passed to every renderer.

/// Visual settings for every artifact of a report run.
///
/// Colors are CSS color strings. Sizes are in SVG user units (pixels).
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTheme {
    /// Canvas width.
    pub width: u32,
    /// Canvas height.
    pub height: u32,
    /// Space around the plot panel for titles, axes and captions.
    pub margin: u32,
    /// CSS font stack for all text.
    pub font_family: String,
    /// Title font size.
    pub title_size: f64,
    /// Body text (subtitle, axis labels, legend) font size.
    pub body_size: f64,
    /// Caption and tick label font size.
    pub small_size: f64,
    /// Canvas background.
    pub background: String,
    /// Text and axis color.
    pub foreground: String,
    /// Secondary text color (subtitles, captions).
    pub muted: String,
    /// Grid line color.
    pub grid: String,
    /// Boundary polygon fill.
    pub boundary_fill: String,
    /// Boundary polygon outline.
    pub boundary_stroke: String,
    /// Line width of chart series.
    pub line_width: f64,
    /// Radius of map points.
    pub point_radius: f64,
    /// Opacity of map points.
    pub point_opacity: f64,
    /// Categorical palette, cycled when there are more categories.
    pub palette: Vec<String>,
}

impl Default for ReportTheme {
    fn default() -> Self {
        Self {
            width: 900,
            height: 640,
            margin: 60,
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            title_size: 20.0,
            body_size: 13.0,
            small_size: 11.0,
            background: "#ffffff".to_string(),
            foreground: "#222222".to_string(),
            muted: "#666666".to_string(),
            grid: "#ebebeb".to_string(),
            boundary_fill: "#f2f2f2".to_string(),
            boundary_stroke: "#9a9a9a".to_string(),
            line_width: 1.6,
            point_radius: 1.8,
            point_opacity: 0.6,
            palette: [
                "#F8766D", "#A3A500", "#00BF7D", "#00B0F6", "#E76BF3", "#7F7F7F",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        }
    }
}

impl ReportTheme {
    /// Palette color for category `index`.
    #[must_use]
    pub fn color(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            return &self.foreground;
        }
        &self.palette[index % self.palette.len()]
    }
}

//! Minimal SVG document writer shared by the chart, map and animation
//! renderers.

use std::fmt::Write as _;

use crate::ReportTheme;

/// Escapes text for use in SVG/HTML content and attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Path data for a set of closed rings (`M .. L .. Z` per ring).
#[must_use]
pub fn ring_path(rings: &[Vec<(f64, f64)>]) -> String {
    let mut d = String::new();
    for ring in rings {
        for (i, (x, y)) in ring.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd}{x:.2} {y:.2} ");
        }
        if !ring.is_empty() {
            d.push_str("Z ");
        }
    }
    d.truncate(d.trim_end().len());
    d
}

/// Horizontal text anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Left-aligned.
    Start,
    /// Centered.
    Middle,
    /// Right-aligned.
    End,
}

impl Anchor {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// Font settings for one text element.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle<'a> {
    /// Font size.
    pub size: f64,
    /// Fill color.
    pub color: &'a str,
    /// Anchoring.
    pub anchor: Anchor,
    /// Bold text.
    pub bold: bool,
}

/// An SVG document under construction.
#[derive(Debug)]
pub struct SvgDoc {
    buf: String,
}

impl SvgDoc {
    /// Starts a `width` x `height` document filled with the theme
    /// background.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn new(width: u32, height: u32, theme: &ReportTheme) -> Result<Self, std::fmt::Error> {
        let mut buf = String::new();
        writeln!(
            buf,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="{}">"#,
            escape(&theme.font_family)
        )?;
        writeln!(
            buf,
            r#"<rect x="0" y="0" width="{width}" height="{height}" fill="{}"/>"#,
            escape(&theme.background)
        )?;
        Ok(Self { buf })
    }

    /// Appends raw markup.
    pub fn raw(&mut self, markup: &str) {
        self.buf.push_str(markup);
        if !markup.ends_with('\n') {
            self.buf.push('\n');
        }
    }

    /// Opens a `<g>` with the given attribute text.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn open_group(&mut self, attrs: &str) -> std::fmt::Result {
        if attrs.is_empty() {
            writeln!(self.buf, "<g>")
        } else {
            writeln!(self.buf, "<g {attrs}>")
        }
    }

    /// Closes the innermost `<g>`.
    pub fn close_group(&mut self) {
        self.buf.push_str("</g>\n");
    }

    /// Axis-aligned rectangle.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) -> std::fmt::Result {
        writeln!(
            self.buf,
            r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{}"/>"#,
            escape(fill)
        )
    }

    /// Straight line.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn line(
        &mut self,
        from: (f64, f64),
        to: (f64, f64),
        stroke: &str,
        width: f64,
    ) -> std::fmt::Result {
        writeln!(
            self.buf,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{width}"/>"#,
            from.0,
            from.1,
            to.0,
            to.1,
            escape(stroke)
        )
    }

    /// Open polyline.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: &str, width: f64) -> std::fmt::Result {
        let coords: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect();
        writeln!(
            self.buf,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{width}" stroke-linejoin="round"/>"#,
            coords.join(" "),
            escape(stroke)
        )
    }

    /// Filled path with outline, using the even-odd rule so inner rings cut
    /// holes.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn path(&mut self, d: &str, fill: &str, stroke: &str, width: f64) -> std::fmt::Result {
        writeln!(
            self.buf,
            r#"<path d="{d}" fill="{}" fill-rule="evenodd" stroke="{}" stroke-width="{width}"/>"#,
            escape(fill),
            escape(stroke)
        )
    }

    /// Filled circle.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn circle(
        &mut self,
        center: (f64, f64),
        radius: f64,
        fill: &str,
        opacity: f64,
    ) -> std::fmt::Result {
        writeln!(
            self.buf,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{radius}" fill="{}" fill-opacity="{opacity}"/>"#,
            center.0,
            center.1,
            escape(fill)
        )
    }

    /// Single line of text with its baseline at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn text(&mut self, x: f64, y: f64, style: TextStyle<'_>, content: &str) -> std::fmt::Result {
        let weight = if style.bold { r#" font-weight="bold""# } else { "" };
        writeln!(
            self.buf,
            r#"<text x="{x:.2}" y="{y:.2}" font-size="{}" fill="{}" text-anchor="{}"{weight}>{}</text>"#,
            style.size,
            escape(style.color),
            style.anchor.as_str(),
            escape(content)
        )
    }

    /// Text rotated 90 degrees counter-clockwise around `(x, y)`, for
    /// vertical axis titles.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn vertical_text(
        &mut self,
        x: f64,
        y: f64,
        style: TextStyle<'_>,
        content: &str,
    ) -> std::fmt::Result {
        writeln!(
            self.buf,
            r#"<text x="{x:.2}" y="{y:.2}" font-size="{}" fill="{}" text-anchor="{}" transform="rotate(-90 {x:.2} {y:.2})">{}</text>"#,
            style.size,
            escape(style.color),
            style.anchor.as_str(),
            escape(content)
        )
    }

    /// Closes the document and returns its markup.
    #[must_use]
    pub fn finish(mut self) -> String {
        self.buf.push_str("</svg>\n");
        self.buf
    }
}

/// Round tick positions covering `[min, max]`, roughly `target` of them.
#[must_use]
pub fn nice_ticks(min: f64, max: f64, target: usize) -> Vec<f64> {
    if !min.is_finite() || !max.is_finite() || max <= min || target == 0 {
        return vec![min];
    }

    #[allow(clippy::cast_precision_loss)]
    let raw_step = (max - min) / target as f64;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw_step)
        .unwrap_or(10.0 * magnitude);

    let first = (min / step).ceil() * step;
    let mut ticks = Vec::new();
    let mut tick = first;
    while tick <= max + step * 1e-9 {
        // Avoid "-0" labels.
        ticks.push(if tick.abs() < step * 1e-9 { 0.0 } else { tick });
        tick += step;
    }
    ticks
}

/// Tick label without trailing zeros.
#[must_use]
pub fn tick_label(value: f64) -> String {
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" { "0".to_string() } else { text.to_string() }
}

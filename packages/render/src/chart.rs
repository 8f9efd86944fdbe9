//! Frequency polygon charts.

use stop_report_analytics_models::FrequencyPolygon;

use crate::svg::{Anchor, SvgDoc, TextStyle, nice_ticks, tick_label};
use crate::{RenderError, ReportTheme};

/// Label shown for a series whose group value is absent.
pub const MISSING_LABEL: &str = "NA";

/// Text around a chart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartText {
    /// Title, top left.
    pub title: String,
    /// Line under the title.
    pub subtitle: Option<String>,
    /// Horizontal axis title.
    pub x_label: String,
    /// Vertical axis title.
    pub y_label: String,
    /// Small print, bottom right.
    pub caption: Option<String>,
    /// Legend heading.
    pub legend_title: Option<String>,
}

/// Plot panel in canvas pixels.
#[derive(Debug, Clone, Copy)]
struct Panel {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl Panel {
    fn for_theme(theme: &ReportTheme, legend_width: f64) -> Self {
        let margin = f64::from(theme.margin);
        Self {
            left: margin + 10.0,
            right: f64::from(theme.width) - margin * 0.5 - legend_width,
            top: margin + theme.body_size * 1.5,
            bottom: f64::from(theme.height) - margin - 10.0,
        }
    }
}

/// Draws one line per series of `polygon`, colored from the theme palette,
/// with a legend when there is more than one series.
///
/// # Errors
///
/// Returns [`RenderError::Empty`] if the polygon has no points.
pub fn frequency_chart(
    polygon: &FrequencyPolygon,
    text: &ChartText,
    theme: &ReportTheme,
) -> Result<String, RenderError> {
    let points = polygon.series.iter().flat_map(|s| s.points.iter());
    let (x_min, x_max, y_max) = points.fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0u64),
        |(lo, hi, top), p| (lo.min(p.x), hi.max(p.x), top.max(p.count)),
    );
    if !x_min.is_finite() {
        return Err(RenderError::Empty(format!("chart {:?} has no points", text.title)));
    }

    #[allow(clippy::cast_precision_loss)]
    let y_peak = y_max.max(1) as f64;
    let mut y_ticks = nice_ticks(0.0, y_peak, 5);
    // The axis ends on a tick at or above the tallest point.
    if let [.., prev, last] = y_ticks[..]
        && last < y_peak
    {
        y_ticks.push(last + (last - prev));
    }
    let y_top = y_ticks.last().copied().unwrap_or(1.0).max(y_peak);
    let x_ticks = nice_ticks(x_min, x_max, 8);

    let show_legend = polygon.series.len() > 1;
    let panel = Panel::for_theme(theme, if show_legend { 110.0 } else { 0.0 });
    let x_span = if x_max > x_min { x_max - x_min } else { 1.0 };
    let sx = |x: f64| panel.left + (x - x_min) / x_span * (panel.right - panel.left);
    let sy = |y: f64| panel.bottom - y / y_top * (panel.bottom - panel.top);

    let mut doc = SvgDoc::new(theme.width, theme.height, theme)?;
    let small = TextStyle {
        size: theme.small_size,
        color: &theme.muted,
        anchor: Anchor::Middle,
        bold: false,
    };
    let body = TextStyle {
        size: theme.body_size,
        color: &theme.foreground,
        anchor: Anchor::Middle,
        bold: false,
    };

    // Grid and tick labels.
    for tick in &y_ticks {
        let y = sy(*tick);
        doc.line((panel.left, y), (panel.right, y), &theme.grid, 1.0)?;
        doc.text(
            panel.left - 6.0,
            y + theme.small_size * 0.35,
            TextStyle {
                anchor: Anchor::End,
                ..small
            },
            &tick_label(*tick),
        )?;
    }
    for tick in &x_ticks {
        let x = sx(*tick);
        doc.line((x, panel.top), (x, panel.bottom), &theme.grid, 1.0)?;
        doc.text(x, panel.bottom + theme.small_size + 4.0, small, &tick_label(*tick))?;
    }

    // Series.
    for (i, series) in polygon.series.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let line: Vec<(f64, f64)> = series
            .points
            .iter()
            .map(|p| (sx(p.x), sy(p.count as f64)))
            .collect();
        doc.polyline(&line, theme.color(i), theme.line_width)?;
    }

    // Titles.
    let margin = f64::from(theme.margin);
    doc.text(
        panel.left,
        margin * 0.5,
        TextStyle {
            size: theme.title_size,
            anchor: Anchor::Start,
            bold: true,
            ..body
        },
        &text.title,
    )?;
    if let Some(subtitle) = &text.subtitle {
        doc.text(
            panel.left,
            margin * 0.5 + theme.body_size * 1.6,
            TextStyle {
                anchor: Anchor::Start,
                color: &theme.muted,
                ..body
            },
            subtitle,
        )?;
    }
    doc.text(
        (panel.left + panel.right) / 2.0,
        panel.bottom + theme.small_size + theme.body_size * 2.2,
        body,
        &text.x_label,
    )?;
    doc.vertical_text(
        panel.left - margin * 0.7,
        (panel.top + panel.bottom) / 2.0,
        body,
        &text.y_label,
    )?;
    if let Some(caption) = &text.caption {
        doc.text(
            f64::from(theme.width) - margin * 0.5,
            f64::from(theme.height) - theme.small_size,
            TextStyle {
                anchor: Anchor::End,
                ..small
            },
            caption,
        )?;
    }

    if show_legend {
        let x = panel.right + 20.0;
        let mut y = panel.top + theme.body_size;
        if let Some(legend_title) = &text.legend_title {
            doc.text(
                x,
                y,
                TextStyle {
                    anchor: Anchor::Start,
                    ..body
                },
                legend_title,
            )?;
            y += theme.body_size * 1.6;
        }
        for (i, series) in polygon.series.iter().enumerate() {
            doc.line((x, y - 4.0), (x + 18.0, y - 4.0), theme.color(i), theme.line_width * 1.5)?;
            doc.text(
                x + 24.0,
                y,
                TextStyle {
                    anchor: Anchor::Start,
                    ..body
                },
                series.label.as_deref().unwrap_or(MISSING_LABEL),
            )?;
            y += theme.body_size * 1.5;
        }
    }

    Ok(doc.finish())
}

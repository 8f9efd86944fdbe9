//! Point overlays on boundary polygons.
//!
//! Drawing happens in two steps. [`MapPlan::build`] projects the layer and
//! the points into canvas pixels; this is pure geometry and can be checked
//! directly (e.g. that a point lands inside its polygon's drawn extent).
//! [`render_map`] then turns a plan into SVG.

use geo::{Centroid as _, Coord, Rect};
use stop_report_geography_models::{BoundarySet, Crs, TaggedPoints, rect_contains};

use crate::svg::{Anchor, SvgDoc, TextStyle, ring_path};
use crate::{RenderError, ReportTheme};

/// Horizontal space reserved for the legend.
const LEGEND_WIDTH: f64 = 150.0;

/// A point in canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PlottedPoint {
    /// Horizontal pixel position.
    pub x: f64,
    /// Vertical pixel position (down is positive).
    pub y: f64,
    /// Category, for coloring.
    pub category: Option<String>,
}

/// A text label in canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PlottedLabel {
    /// Horizontal pixel position.
    pub x: f64,
    /// Vertical pixel position.
    pub y: f64,
    /// Label text.
    pub text: String,
}

/// A layer and its points projected into a pixel panel.
#[derive(Debug, Clone)]
pub struct MapPlan {
    /// Data extent (the boundary layer's bounding box).
    pub extent: Rect<f64>,
    /// Pixel area the map was fitted into.
    pub panel: Rect<f64>,
    /// Rings of every boundary, in pixels, in layer order.
    pub polygons: Vec<Vec<Vec<(f64, f64)>>>,
    /// Points inside the extent, in pixels.
    pub points: Vec<PlottedPoint>,
    /// Polygon labels.
    pub labels: Vec<PlottedLabel>,
    /// Points dropped for falling outside the extent.
    pub dropped: usize,
    x_scale: f64,
    y_scale: f64,
    origin: (f64, f64),
}

impl MapPlan {
    /// Panel a map occupies on a canvas styled by `theme`.
    #[must_use]
    pub fn panel_for(theme: &ReportTheme, legend: bool) -> Rect<f64> {
        let margin = f64::from(theme.margin);
        let right = f64::from(theme.width) - margin * 0.5 - if legend { LEGEND_WIDTH } else { 0.0 };
        Rect::new(
            Coord {
                x: margin * 0.5,
                y: margin + theme.body_size * 1.5,
            },
            Coord {
                x: right,
                y: f64::from(theme.height) - margin * 0.6,
            },
        )
    }

    /// Fits `layer` into `panel` and projects `points` onto it.
    ///
    /// Longitudes are scaled by the cosine of the middle latitude so shapes
    /// keep their proportions. Points outside the layer's bounding box are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnsupportedCrs`] if the layer is projected,
    /// [`RenderError::CrsMismatch`] if the points' CRS cannot share a map
    /// with the layer's, or [`RenderError::Empty`] if the layer has no
    /// geometry.
    pub fn build(
        layer: &BoundarySet,
        points: &TaggedPoints,
        panel: Rect<f64>,
    ) -> Result<Self, RenderError> {
        match &layer.crs {
            Crs::Projected { .. } => return Err(RenderError::unsupported_crs(&layer.crs)),
            Crs::Unknown => log::warn!(
                "Layer {} has no CRS; assuming longitude/latitude degrees",
                layer.name
            ),
            _ => {}
        }
        if !points.crs.is_compatible_with(&layer.crs) {
            return Err(RenderError::CrsMismatch {
                points: points.crs.label(),
                layer: layer.crs.label(),
            });
        }
        if points.crs != layer.crs {
            log::debug!(
                "Drawing {} points on a {} layer",
                points.crs.label(),
                layer.crs.label()
            );
        }

        let extent = layer
            .extent()
            .ok_or_else(|| RenderError::Empty(format!("layer {} has no geometry", layer.name)))?;

        let mid_lat = (extent.min().y + extent.max().y) / 2.0;
        let aspect = mid_lat.to_radians().cos().abs().max(1e-6);
        let data_w = extent.width() * aspect;
        let data_h = extent.height();
        let scale = match (data_w > 0.0, data_h > 0.0) {
            (true, true) => (panel.width() / data_w).min(panel.height() / data_h),
            (true, false) => panel.width() / data_w,
            (false, true) => panel.height() / data_h,
            (false, false) => 1.0,
        };
        let pad_x = (panel.width() - data_w * scale) / 2.0;
        let pad_y = (panel.height() - data_h * scale) / 2.0;

        let mut plan = Self {
            extent,
            panel,
            polygons: Vec::with_capacity(layer.len()),
            points: Vec::with_capacity(points.points.len()),
            labels: Vec::new(),
            dropped: 0,
            x_scale: scale * aspect,
            y_scale: scale,
            origin: (panel.min().x + pad_x, panel.max().y - pad_y),
        };

        for boundary in &layer.boundaries {
            let rings: Vec<Vec<(f64, f64)>> = boundary
                .geometry
                .0
                .iter()
                .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
                .map(|ring| ring.coords().map(|c| plan.project(c.x, c.y)).collect())
                .collect();
            plan.polygons.push(rings);
        }

        for point in &points.points {
            if rect_contains(&extent, point.lng, point.lat) {
                let (x, y) = plan.project(point.lng, point.lat);
                plan.points.push(PlottedPoint {
                    x,
                    y,
                    category: point.category.clone(),
                });
            } else {
                plan.dropped += 1;
            }
        }
        if plan.dropped > 0 {
            log::debug!("{} points fall outside layer {}", plan.dropped, layer.name);
        }

        Ok(plan)
    }

    /// Adds one label per boundary at its centroid. Boundaries with no
    /// label text are skipped.
    #[must_use]
    pub fn with_labels(mut self, layer: &BoundarySet, labels: &[Option<String>]) -> Self {
        for (boundary, label) in layer.boundaries.iter().zip(labels) {
            let (Some(text), Some(centroid)) = (label, boundary.geometry.centroid()) else {
                continue;
            };
            let (x, y) = self.project(centroid.x(), centroid.y());
            self.labels.push(PlottedLabel {
                x,
                y,
                text: text.clone(),
            });
        }
        self
    }

    /// Pixel position of a longitude/latitude pair.
    #[must_use]
    pub fn project(&self, lng: f64, lat: f64) -> (f64, f64) {
        (
            (lng - self.extent.min().x).mul_add(self.x_scale, self.origin.0),
            (lat - self.extent.min().y).mul_add(-self.y_scale, self.origin.1),
        )
    }

    /// Pixel bounding box of boundary `index` as drawn.
    #[must_use]
    pub fn polygon_bounds(&self, index: usize) -> Option<Rect<f64>> {
        let coords = self.polygons.get(index)?.iter().flatten();
        coords
            .map(|(x, y)| Rect::new(Coord { x: *x, y: *y }, Coord { x: *x, y: *y }))
            .reduce(stop_report_geography_models::union_rect)
    }
}

/// Text around a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapText {
    /// Title, top left.
    pub title: String,
    /// Line under the title.
    pub subtitle: Option<String>,
    /// Small print, bottom right.
    pub caption: Option<String>,
    /// Legend heading.
    pub legend_title: Option<String>,
}

/// Draws the boundary polygons and their labels.
pub(crate) fn draw_base(doc: &mut SvgDoc, plan: &MapPlan, theme: &ReportTheme) -> std::fmt::Result {
    doc.open_group(r#"class="boundaries""#)?;
    for rings in &plan.polygons {
        doc.path(
            &ring_path(rings),
            &theme.boundary_fill,
            &theme.boundary_stroke,
            0.8,
        )?;
    }
    doc.close_group();

    let style = TextStyle {
        size: theme.small_size,
        color: &theme.muted,
        anchor: Anchor::Middle,
        bold: false,
    };
    for label in &plan.labels {
        doc.text(label.x, label.y, style, &label.text)?;
    }
    Ok(())
}

/// Draws the title, subtitle and caption.
pub(crate) fn draw_titles(doc: &mut SvgDoc, text: &MapText, theme: &ReportTheme) -> std::fmt::Result {
    let margin = f64::from(theme.margin);
    let body = TextStyle {
        size: theme.body_size,
        color: &theme.foreground,
        anchor: Anchor::Start,
        bold: false,
    };
    doc.text(
        margin * 0.5,
        margin * 0.5,
        TextStyle {
            size: theme.title_size,
            bold: true,
            ..body
        },
        &text.title,
    )?;
    if let Some(subtitle) = &text.subtitle {
        doc.text(
            margin * 0.5,
            margin * 0.5 + theme.body_size * 1.6,
            TextStyle {
                color: &theme.muted,
                ..body
            },
            subtitle,
        )?;
    }
    if let Some(caption) = &text.caption {
        doc.text(
            f64::from(theme.width) - margin * 0.5,
            f64::from(theme.height) - theme.small_size,
            TextStyle {
                size: theme.small_size,
                color: &theme.muted,
                anchor: Anchor::End,
                bold: false,
            },
            caption,
        )?;
    }
    Ok(())
}

/// Draws a color legend for `categories` to the right of the panel.
pub(crate) fn draw_legend(
    doc: &mut SvgDoc,
    plan: &MapPlan,
    categories: &[String],
    title: Option<&str>,
    theme: &ReportTheme,
) -> std::fmt::Result {
    let x = plan.panel.max().x + 20.0;
    let mut y = plan.panel.min().y + theme.body_size;
    let style = TextStyle {
        size: theme.body_size,
        color: &theme.foreground,
        anchor: Anchor::Start,
        bold: false,
    };
    if let Some(title) = title {
        doc.text(x, y, style, title)?;
        y += theme.body_size * 1.6;
    }
    for (i, category) in categories.iter().enumerate() {
        doc.circle((x + 5.0, y - 4.0), 5.0, theme.color(i), 1.0)?;
        doc.text(x + 16.0, y, style, category)?;
        y += theme.body_size * 1.5;
    }
    Ok(())
}

/// Palette color of a point: the position of its category in `categories`,
/// or the first palette color when there are no categories.
pub(crate) fn point_color<'a>(
    point: &PlottedPoint,
    categories: &[String],
    theme: &'a ReportTheme,
) -> &'a str {
    if categories.is_empty() {
        return theme.color(0);
    }
    point
        .category
        .as_ref()
        .and_then(|c| categories.iter().position(|k| k == c))
        .map_or(theme.muted.as_str(), |i| theme.color(i))
}

/// Renders `plan` as a static SVG map. Points are colored by their position
/// in `categories`; with no categories every point gets the first palette
/// color and no legend is drawn.
///
/// # Errors
///
/// Returns [`RenderError`] if formatting fails.
pub fn render_map(
    plan: &MapPlan,
    categories: &[String],
    text: &MapText,
    theme: &ReportTheme,
) -> Result<String, RenderError> {
    let mut doc = SvgDoc::new(theme.width, theme.height, theme)?;
    draw_base(&mut doc, plan, theme)?;

    doc.open_group(r#"class="points""#)?;
    for point in &plan.points {
        doc.circle(
            (point.x, point.y),
            theme.point_radius,
            point_color(point, categories, theme),
            theme.point_opacity,
        )?;
    }
    doc.close_group();

    draw_titles(&mut doc, text, theme)?;
    if !categories.is_empty() {
        draw_legend(&mut doc, plan, categories, text.legend_title.as_deref(), theme)?;
    }

    Ok(doc.finish())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use geo::{LineString, MultiPolygon, Polygon};
    use stop_report_geography_models::{AttributeValue, Boundary, StopPoint};

    use super::*;

    fn square_layer(crs: Crs) -> BoundarySet {
        let mut attributes = BTreeMap::new();
        attributes.insert("NAME".to_string(), AttributeValue::Text("Downtown".to_string()));
        BoundarySet {
            name: "neighborhoods".to_string(),
            crs,
            boundaries: vec![Boundary {
                attributes,
                geometry: MultiPolygon(vec![Polygon::new(
                    LineString::from(vec![
                        (-72.70, 41.70),
                        (-72.60, 41.70),
                        (-72.60, 41.80),
                        (-72.70, 41.80),
                        (-72.70, 41.70),
                    ]),
                    vec![],
                )]),
            }],
        }
    }

    fn point(lng: f64, lat: f64, category: &str) -> StopPoint {
        StopPoint {
            lng,
            lat,
            category: Some(category.to_string()),
        }
    }

    fn panel() -> Rect<f64> {
        MapPlan::panel_for(&ReportTheme::default(), true)
    }

    #[test]
    fn point_inside_polygon_lands_inside_its_drawn_extent() {
        let layer = square_layer(Crs::Wgs84);
        let points = TaggedPoints::wgs84(vec![point(-72.65, 41.75, "white")]);

        let plan = MapPlan::build(&layer, &points, panel()).unwrap();
        let bounds = plan.polygon_bounds(0).unwrap();
        let drawn = &plan.points[0];

        assert!(rect_contains(&bounds, drawn.x, drawn.y));
        assert!(rect_contains(&plan.panel, bounds.min().x, bounds.min().y));
        assert!(rect_contains(&plan.panel, bounds.max().x, bounds.max().y));
    }

    #[test]
    fn north_is_up() {
        let layer = square_layer(Crs::Nad83);
        let points =
            TaggedPoints::wgs84(vec![point(-72.65, 41.79, "a"), point(-72.65, 41.71, "b")]);

        let plan = MapPlan::build(&layer, &points, panel()).unwrap();
        assert!(plan.points[0].y < plan.points[1].y);
    }

    #[test]
    fn points_outside_the_layer_are_dropped() {
        let layer = square_layer(Crs::Wgs84);
        let points = TaggedPoints::wgs84(vec![
            point(-72.65, 41.75, "a"),
            point(0.0, 0.0, "null island"),
        ]);

        let plan = MapPlan::build(&layer, &points, panel()).unwrap();
        assert_eq!(plan.points.len(), 1);
        assert_eq!(plan.dropped, 1);
    }

    #[test]
    fn projected_layers_are_rejected() {
        let layer = square_layer(Crs::Projected {
            name: "NAD83 / Connecticut".to_string(),
        });
        let points = TaggedPoints::wgs84(vec![]);

        assert!(matches!(
            MapPlan::build(&layer, &points, panel()),
            Err(RenderError::UnsupportedCrs(_))
        ));
    }

    #[test]
    fn mismatched_crs_is_rejected() {
        let layer = square_layer(Crs::Geographic {
            name: "GCS_North_American_1927".to_string(),
        });
        let points = TaggedPoints::wgs84(vec![point(-72.65, 41.75, "a")]);

        assert!(matches!(
            MapPlan::build(&layer, &points, panel()),
            Err(RenderError::CrsMismatch { .. })
        ));
    }

    #[test]
    fn wgs84_points_draw_on_a_nad83_layer() {
        let layer = square_layer(Crs::Nad83);
        let points = TaggedPoints::wgs84(vec![point(-72.65, 41.75, "a")]);

        let plan = MapPlan::build(&layer, &points, panel()).unwrap();
        assert_eq!(plan.points.len(), 1);
    }

    #[test]
    fn renders_polygons_points_labels_and_legend() {
        let layer = square_layer(Crs::Wgs84);
        let points = TaggedPoints::wgs84(vec![
            point(-72.65, 41.75, "white"),
            point(-72.66, 41.74, "black"),
        ]);
        let plan = MapPlan::build(&layer, &points, panel())
            .unwrap()
            .with_labels(&layer, &[layer.boundaries[0].label(None)]);
        let text = MapText {
            title: "Arrests in Hartford".to_string(),
            legend_title: Some("Race".to_string()),
            ..MapText::default()
        };

        let svg = render_map(
            &plan,
            &["white".to_string(), "black".to_string()],
            &text,
            &ReportTheme::default(),
        )
        .unwrap();

        assert_eq!(svg.matches("<path").count(), 1);
        // Two points plus two legend markers.
        assert_eq!(svg.matches("<circle").count(), 4);
        assert!(svg.contains(">Downtown</text>"));
        assert!(svg.contains(">Race</text>"));
    }
}

//! Polygon layer decoding from `.shp` + `.dbf`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::dbase::FieldValue;
use shapefile::{PolygonRing, Shape};
use stop_report_geography_models::{AttributeValue, Boundary, BoundarySet};

use crate::GeoError;
use crate::prj::read_layer_crs;

/// A ring as `(is_outer, points)`.
type Ring = (bool, Vec<Coord<f64>>);

/// Reads every polygon feature of the layer at `shp_path`, with its
/// attribute row, and tags the layer with the CRS from its `.prj`.
///
/// Non-polygon and null shapes are skipped with a warning.
///
/// # Errors
///
/// Returns [`GeoError`] if the files cannot be decoded or the layer has no
/// polygons.
pub fn load_layer(shp_path: &Path) -> Result<BoundarySet, GeoError> {
    let path_str = shp_path.display().to_string();
    let shapefile_err = |source| GeoError::Shapefile {
        path: path_str.clone(),
        source,
    };

    let mut reader = shapefile::Reader::from_path(shp_path).map_err(shapefile_err)?;

    let mut boundaries = Vec::new();
    let mut skipped = 0u64;

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.map_err(shapefile_err)?;

        let Some(geometry) = shape_to_multipolygon(&shape) else {
            skipped += 1;
            continue;
        };

        let attributes: BTreeMap<String, AttributeValue> =
            HashMap::<String, FieldValue>::from(record)
                .into_iter()
                .map(|(name, value)| (name, attribute_value(value)))
                .collect();

        boundaries.push(Boundary {
            attributes,
            geometry,
        });
    }

    if skipped > 0 {
        log::warn!("{path_str}: skipped {skipped} non-polygon features");
    }

    if boundaries.is_empty() {
        return Err(GeoError::NoPolygons { path: path_str });
    }

    let crs = read_layer_crs(shp_path)?;
    let name = shp_path
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());

    log::info!(
        "Loaded {} polygons from layer {name} ({})",
        boundaries.len(),
        crs.label()
    );

    Ok(BoundarySet {
        name,
        crs,
        boundaries,
    })
}

fn shape_to_multipolygon(shape: &Shape) -> Option<MultiPolygon<f64>> {
    let rings: Vec<Ring> = match shape {
        Shape::Polygon(p) => p
            .rings()
            .iter()
            .map(|r| ring(r, |pt| Coord { x: pt.x, y: pt.y }))
            .collect(),
        Shape::PolygonM(p) => p
            .rings()
            .iter()
            .map(|r| ring(r, |pt| Coord { x: pt.x, y: pt.y }))
            .collect(),
        Shape::PolygonZ(p) => p
            .rings()
            .iter()
            .map(|r| ring(r, |pt| Coord { x: pt.x, y: pt.y }))
            .collect(),
        _ => return None,
    };

    assemble(rings)
}

fn ring<P>(ring: &PolygonRing<P>, to_coord: impl Fn(&P) -> Coord<f64>) -> Ring {
    let is_outer = matches!(ring, PolygonRing::Outer(_));
    (is_outer, ring.points().iter().map(to_coord).collect())
}

/// Groups rings into polygons: each outer ring starts a polygon and the
/// inner rings that follow are its holes.
fn assemble(rings: Vec<Ring>) -> Option<MultiPolygon<f64>> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for (is_outer, coords) in rings {
        if coords.len() < 3 {
            continue;
        }
        let line = LineString::new(coords);
        if is_outer {
            polygons.push((line, Vec::new()));
        } else if let Some((_, holes)) = polygons.last_mut() {
            holes.push(line);
        } else {
            // Hole before any shell; treat it as a shell.
            polygons.push((line, Vec::new()));
        }
    }

    if polygons.is_empty() {
        return None;
    }

    Some(MultiPolygon(
        polygons
            .into_iter()
            .map(|(exterior, holes)| Polygon::new(exterior, holes))
            .collect(),
    ))
}

fn attribute_value(value: FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                AttributeValue::Null
            } else {
                AttributeValue::Text(trimmed.to_string())
            }
        }
        FieldValue::Numeric(Some(n)) | FieldValue::Double(n) | FieldValue::Currency(n) => {
            AttributeValue::Number(n)
        }
        FieldValue::Float(Some(f)) => AttributeValue::Number(f64::from(f)),
        FieldValue::Integer(i) => AttributeValue::Number(f64::from(i)),
        FieldValue::Logical(Some(b)) => AttributeValue::Bool(b),
        FieldValue::Date(Some(d)) => {
            AttributeValue::Date(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
        }
        _ => AttributeValue::Null,
    }
}

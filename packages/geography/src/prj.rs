//! Coordinate reference system detection from `.prj` WKT.
//!
//! Only the outermost definition is inspected: enough to tell geographic
//! from projected layers and to recognize the two datums US city portals
//! publish in.

use std::path::Path;

use stop_report_geography_models::Crs;

use crate::GeoError;

/// Parses a WKT (1 or 2) definition into a [`Crs`].
#[must_use]
pub fn parse_wkt(wkt: &str) -> Crs {
    let trimmed = wkt.trim();
    let upper = trimmed.to_ascii_uppercase();
    let name = first_quoted(trimmed).unwrap_or_default();

    if upper.starts_with("PROJCS[") || upper.starts_with("PROJCRS[") {
        return Crs::Projected { name };
    }

    if upper.starts_with("GEOGCS[") || upper.starts_with("GEOGCRS[") {
        let normalized = upper.replace(['_', ' '], "");
        if normalized.contains("WGS1984") || normalized.contains("WGS84") {
            return Crs::Wgs84;
        }
        if normalized.contains("NORTHAMERICAN1983") || normalized.contains("NAD83") {
            return Crs::Nad83;
        }
        return Crs::Geographic { name };
    }

    Crs::Unknown
}

/// Reads the CRS for the layer at `shp_path` from its sibling `.prj` file.
///
/// A missing `.prj` yields [`Crs::Unknown`].
///
/// # Errors
///
/// Returns [`GeoError::Io`] if the file exists but cannot be read.
pub fn read_layer_crs(shp_path: &Path) -> Result<Crs, GeoError> {
    let prj_path = shp_path.with_extension("prj");
    if !prj_path.exists() {
        log::warn!("No .prj next to {}, CRS unknown", shp_path.display());
        return Ok(Crs::Unknown);
    }

    let wkt = std::fs::read_to_string(&prj_path).map_err(|e| GeoError::Io {
        path: prj_path.display().to_string(),
        source: e,
    })?;

    let crs = parse_wkt(&wkt);
    log::debug!("{} declares {}", prj_path.display(), crs.label());
    Ok(crs)
}

fn first_quoted(s: &str) -> Option<String> {
    let start = s.find('"')? + 1;
    let len = s[start..].find('"')?;
    Some(s[start..start + len].to_string())
}

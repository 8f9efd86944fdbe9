#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shapefile and projection-file decoding for boundary layers.
//!
//! Reads a `.shp` + `.dbf` pair into a
//! [`BoundarySet`](stop_report_geography_models::BoundarySet) and tags it
//! with the CRS declared by the sibling `.prj` file.

pub mod prj;
pub mod shp;

use thiserror::Error;

/// Errors that can occur while decoding a boundary layer.
#[derive(Debug, Error)]
pub enum GeoError {
    /// The shapefile or its attribute table could not be read.
    #[error("Shapefile error in {path}: {source}")]
    Shapefile {
        /// Layer path.
        path: String,
        /// Underlying decoder error.
        source: shapefile::Error,
    },

    /// I/O error reading a sidecar file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The layer decoded to zero polygons.
    #[error("Layer {path} contains no polygon features")]
    NoPolygons {
        /// Layer path.
        path: String,
    },
}

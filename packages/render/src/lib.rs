#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Table, chart, map and animation renderers for the stop report.
//!
//! Renderers are pure functions from an aggregate (or a geometry layer plus
//! points) and an explicit [`ReportTheme`] to a text artifact: Markdown,
//! HTML or SVG. Nothing here keeps global state; [`write_artifact`] is the
//! only function that touches the filesystem.

pub mod animation;
pub mod chart;
pub mod map;
pub mod svg;
pub mod table;
pub mod theme;

use std::path::Path;

pub use theme::ReportTheme;

use stop_report_geography_models::Crs;
use thiserror::Error;

/// Errors that can occur while rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing an artifact failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// There is nothing to draw.
    #[error("Nothing to render: {0}")]
    Empty(String),

    /// A table row does not match the table's columns.
    #[error("Malformed table: {0}")]
    Table(String),

    /// Points and boundaries cannot share a degree-based plot.
    #[error("Cannot overlay points on a layer in {0}: a geographic CRS is required")]
    UnsupportedCrs(String),

    /// Points were tagged with a different CRS than the layer.
    #[error("Points in {points} cannot be drawn over a layer in {layer}")]
    CrsMismatch {
        /// CRS of the points.
        points: String,
        /// CRS of the boundary layer.
        layer: String,
    },

    /// Formatting into the output buffer failed.
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl RenderError {
    pub(crate) fn unsupported_crs(crs: &Crs) -> Self {
        Self::UnsupportedCrs(crs.label())
    }
}

/// Writes `contents` to `path`, replacing any existing file.
///
/// The data is written to a `.tmp` sibling first and renamed into place, so
/// an interrupted run never leaves a truncated artifact behind.
///
/// # Errors
///
/// Returns [`RenderError::Io`] if the file cannot be written.
pub fn write_artifact(path: &Path, contents: &str) -> Result<(), RenderError> {
    let io_err = |source| RenderError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, contents).map_err(io_err)?;
    std::fs::rename(&tmp_path, path).map_err(io_err)?;

    log::info!("Wrote {}", path.display());
    Ok(())
}

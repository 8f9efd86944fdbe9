#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Archive decoding into in-memory stop tables and boundary layers.
//!
//! Both entry points, [`unpack_stops`] and [`unpack_boundaries`], consume a
//! downloaded archive: they decode it into memory and then delete the
//! archive and everything extracted from it, whether decoding succeeded
//! or not. See [`artifact::ScopedArtifact`].

pub mod archive;
pub mod artifact;
pub mod boundaries;
pub mod stops;

pub use boundaries::unpack_boundaries;
pub use stops::unpack_stops;

use stop_report_database::DbError;
use stop_report_geography::GeoError;

/// Errors that can occur while unpacking an archive.
#[derive(Debug, thiserror::Error)]
pub enum UnpackError {
    /// The archive to unpack does not exist.
    #[error("Archive not found: {0}")]
    ArchiveNotFound(String),

    /// The archive could not be decompressed or read.
    #[error("Corrupt archive {path}: {message}")]
    Corrupt {
        /// Archive path.
        path: String,
        /// Decoder message.
        message: String,
    },

    /// The archive has no entry of the expected kind.
    #[error("Archive {path} contains no {expected} file")]
    MissingEntry {
        /// Archive path.
        path: String,
        /// What was looked for (e.g. `".csv"`).
        expected: &'static str,
    },

    /// I/O error while extracting.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The extracted CSV could not be parsed.
    #[error("CSV decode error: {0}")]
    Csv(#[from] DbError),

    /// The extracted shapefile could not be decoded.
    #[error("Shapefile decode error: {0}")]
    Shapefile(#[from] GeoError),
}

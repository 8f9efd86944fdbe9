#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Police stop report for Hartford, CT and Owensboro, KY.
//!
//! The report is a fixed sequence: for each dataset, fetch the stop archive
//! and the boundary bundle, decode them into memory (deleting the files),
//! answer the dataset's questions, and render tables, charts and maps into
//! the output directory. A Markdown summary ties the artifacts together.
//!
//! Any failure aborts the run; [`ReportError`] names the stage and dataset
//! that failed.

pub mod context;
pub mod hartford;
pub mod owensboro;
pub mod paths;
pub mod pipeline;
pub mod summary;
pub mod taxonomy;

pub use context::ReportContext;
pub use pipeline::run;

use stop_report_analytics::AnalyticsError;
use stop_report_database::DbError;
use stop_report_render::RenderError;
use stop_report_source::FetchError;
use stop_report_unpack::UnpackError;
use thiserror::Error;

/// A failure while answering one dataset's questions.
#[derive(Debug, Error)]
pub enum QuestionError {
    /// The data could not answer a query.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// An artifact could not be rendered or written.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Errors that abort a report run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Downloading an archive failed.
    #[error("Fetch stage failed for {dataset}: {source}")]
    Fetch {
        /// Dataset id.
        dataset: String,
        /// Underlying error.
        source: FetchError,
    },

    /// Decoding an archive failed.
    #[error("Unpack stage failed for {dataset}: {source}")]
    Unpack {
        /// Dataset id.
        dataset: String,
        /// Underlying error.
        source: UnpackError,
    },

    /// A filter or aggregate could not be computed.
    #[error("Filter/aggregate stage failed for {dataset}: {source}")]
    Analyze {
        /// Dataset id.
        dataset: String,
        /// Underlying error.
        source: AnalyticsError,
    },

    /// Rendering or writing an artifact failed.
    #[error("Presentation stage failed for {dataset}: {source}")]
    Render {
        /// Dataset id (or `"summary"`).
        dataset: String,
        /// Underlying error.
        source: RenderError,
    },

    /// The in-memory store could not be opened.
    #[error("Store error: {0}")]
    Store(#[from] DbError),

    /// A dataset definition has no questions attached.
    #[error("No report questions for dataset {0}")]
    UnknownDataset(String),
}

impl ReportError {
    pub(crate) fn question(dataset: &str, error: QuestionError) -> Self {
        let dataset = dataset.to_string();
        match error {
            QuestionError::Analytics(source) => Self::Analyze { dataset, source },
            QuestionError::Render(source) => Self::Render { dataset, source },
        }
    }
}

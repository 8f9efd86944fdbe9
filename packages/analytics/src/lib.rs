#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter, grouping and summary queries over stop datasets.
//!
//! Every function is a single full pass over a [`Dataset`] that returns a
//! fresh value; nothing is cached or updated incrementally.
//!
//! [`Dataset`]: stop_report_database::Dataset

pub mod aggregate;
pub mod dates;
pub mod filter;
pub mod frequency;
pub mod points;
pub mod rates;

pub use aggregate::group_count;
pub use dates::{first_date, format_long_date};
pub use filter::{count, count_where, filter};
pub use frequency::frequency_polygon;
pub use points::stop_points;
pub use rates::{arrest_rates, missing_outcome_as_zero, outcome_tallies};

use stop_report_database::{Dataset, DbError};
use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// The data cannot answer the query: a required column is missing, or
    /// an input that must be non-empty is empty.
    #[error("Data error: {message}")]
    Data {
        /// Description of what went wrong.
        message: String,
    },
}

impl AnalyticsError {
    pub(crate) fn data(message: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
        }
    }
}

/// Fails with [`AnalyticsError::Data`] unless every column in `columns`
/// exists in `dataset`.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] naming the first missing column.
pub fn require_columns(dataset: &Dataset<'_>, columns: &[&str]) -> Result<(), AnalyticsError> {
    let schema = dataset.schema()?;
    for column in columns {
        if !schema.iter().any(|c| c.name == *column) {
            return Err(AnalyticsError::data(format!(
                "column {column:?} is absent from {}",
                dataset.relation()
            )));
        }
    }
    Ok(())
}

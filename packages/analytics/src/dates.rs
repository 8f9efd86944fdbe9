//! Date minima and their long-form rendering.

use chrono::NaiveDate;
use stop_report_database::{Dataset, quote_ident};

use crate::{AnalyticsError, require_columns};

/// Earliest non-absent value of the date `column`.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if the column is missing, holds no
/// present values (including a dataset with zero rows), or its minimum is
/// not a `YYYY-MM-DD` date.
pub fn first_date(dataset: &Dataset<'_>, column: &str) -> Result<NaiveDate, AnalyticsError> {
    require_columns(dataset, &[column])?;

    let col = quote_ident(column);
    let sql = format!(
        "SELECT CAST(MIN({col}) AS VARCHAR) FROM {} WHERE {col} IS NOT NULL",
        dataset.quoted()
    );
    let minimum = dataset
        .query_rows(&sql, |row| row.get::<_, Option<String>>(0))?
        .into_iter()
        .flatten()
        .next()
        .ok_or_else(|| {
            AnalyticsError::data(format!(
                "minimum of {column:?} over zero rows of {}",
                dataset.relation()
            ))
        })?;

    // Timestamps render as "YYYY-MM-DD HH:MM:SS"; only the date part counts.
    let date_part = minimum.get(..10).unwrap_or(&minimum);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| {
        AnalyticsError::data(format!("{column:?} minimum {minimum:?} is not a date: {e}"))
    })
}

/// Renders `date` as e.g. `"March 2, 2014"`.
#[must_use]
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

//! Frequency polygons: binned counts of a numeric column, one line per
//! group.
//!
//! Binning follows the usual `bins` convention for frequency polygons: bin
//! width is `range / (bins - 1)`, so the first bin is centered on the
//! minimum and the last on the maximum. Bins are closed on the right. Each
//! series is padded with an empty bin on either side so the line starts and
//! ends at zero.

use std::collections::BTreeMap;

use stop_report_analytics_models::{FrequencyPoint, FrequencyPolygon, FrequencySeries};
use stop_report_database::{Dataset, quote_ident};

use crate::{AnalyticsError, require_columns};

/// Bin width used when every value is identical.
const ZERO_RANGE_WIDTH: f64 = 0.1;

/// Bins `value_column` of `dataset`, with one series per distinct value of
/// `series_column` (or a single unlabeled series). Rows with an absent value
/// are skipped.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if a column is missing, the value column
/// is not numeric, or no row has a value.
pub fn frequency_polygon(
    dataset: &Dataset<'_>,
    value_column: &str,
    series_column: Option<&str>,
    bins: usize,
) -> Result<FrequencyPolygon, AnalyticsError> {
    let mut columns = vec![value_column];
    columns.extend(series_column);
    require_columns(dataset, &columns)?;

    let value_type = dataset.column_type(value_column)?;
    if !value_type.as_ref().is_some_and(stop_report_database::ColumnType::is_numeric) {
        return Err(AnalyticsError::data(format!(
            "{value_column:?} is not numeric ({value_type:?})"
        )));
    }

    let value = quote_ident(value_column);
    let series = series_column.map_or_else(
        || "CAST(NULL AS VARCHAR)".to_string(),
        |s| format!("CAST({} AS VARCHAR)", quote_ident(s)),
    );
    let sql = format!(
        "SELECT {series}, CAST({value} AS DOUBLE) FROM {} WHERE {value} IS NOT NULL",
        dataset.quoted()
    );
    let values = dataset.query_rows(&sql, |row| {
        Ok((row.get::<_, Option<String>>(0)?, row.get::<_, f64>(1)?))
    })?;

    bin_values(&values, bins)
}

/// Bins `(series, value)` pairs. All series share one set of bins spanning
/// the overall range.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if `values` is empty or `bins` is zero.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn bin_values(
    values: &[(Option<String>, f64)],
    bins: usize,
) -> Result<FrequencyPolygon, AnalyticsError> {
    if bins == 0 {
        return Err(AnalyticsError::data("frequency polygon needs at least one bin"));
    }

    let Some((min, max)) = values.iter().map(|(_, v)| *v).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    }) else {
        return Err(AnalyticsError::data("frequency polygon over zero values"));
    };

    let range = max - min;
    let (width, bins) = if range <= 0.0 {
        (ZERO_RANGE_WIDTH, 1)
    } else if bins == 1 {
        (range, 1)
    } else {
        (range / (bins - 1) as f64, bins)
    };

    let mut counts: BTreeMap<Option<String>, Vec<u64>> = BTreeMap::new();
    for (label, v) in values {
        let index = ((v - min) / width - 0.5).ceil().clamp(0.0, (bins - 1) as f64) as usize;
        counts.entry(label.clone()).or_insert_with(|| vec![0; bins])[index] += 1;
    }

    let mut series: Vec<FrequencySeries> = counts
        .into_iter()
        .map(|(label, bin_counts)| {
            let padded = std::iter::once(0)
                .chain(bin_counts)
                .chain(std::iter::once(0));
            FrequencySeries {
                label,
                points: padded
                    .enumerate()
                    .map(|(i, count)| FrequencyPoint {
                        x: (i as f64 - 1.0).mul_add(width, min),
                        count,
                    })
                    .collect(),
            }
        })
        .collect();
    series.sort_by(|a, b| (a.label.is_none(), &a.label).cmp(&(b.label.is_none(), &b.label)));

    log::debug!(
        "Binned {} values into {bins} bins of width {width} ({} series)",
        values.len(),
        series.len()
    );

    Ok(FrequencyPolygon {
        bin_width: width,
        series,
    })
}

#[cfg(test)]
mod tests {
    use stop_report_database::StopStore;

    use super::*;
    use crate::test_support::load;

    fn unlabeled(values: &[f64]) -> Vec<(Option<String>, f64)> {
        values.iter().map(|v| (None, *v)).collect()
    }

    #[test]
    fn bins_are_centered_on_the_extremes() {
        let values: Vec<f64> = (0..30).map(f64::from).collect();
        let polygon = bin_values(&unlabeled(&values), 30).unwrap();

        assert!((polygon.bin_width - 1.0).abs() < 1e-12);
        let points = &polygon.series[0].points;
        assert_eq!(points.len(), 32);
        assert!((points[0].x + 1.0).abs() < 1e-12);
        assert!((points[31].x - 30.0).abs() < 1e-12);
        assert_eq!(points[0].count, 0);
        assert_eq!(points[31].count, 0);
        assert!(points[1..31].iter().all(|p| p.count == 1));
    }

    #[test]
    fn bins_are_closed_on_the_right() {
        // width 0.5: bin 0 is (-0.25, 0.25], bin 1 is (0.25, 0.75].
        let polygon = bin_values(&unlabeled(&[0.0, 0.25, 0.26, 1.0]), 3).unwrap();
        let counts: Vec<u64> = polygon.series[0].points.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![0, 2, 1, 1, 0]);
    }

    #[test]
    fn identical_values_use_one_narrow_bin() {
        let polygon = bin_values(&unlabeled(&[5.0, 5.0, 5.0]), 30).unwrap();
        let points = &polygon.series[0].points;
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].count, 3);
        assert!((points[1].x - 5.0).abs() < 1e-12);
        assert!((polygon.bin_width - ZERO_RANGE_WIDTH).abs() < 1e-12);
    }

    #[test]
    fn empty_input_is_a_data_error() {
        assert!(bin_values(&[], 30).is_err());
        assert!(bin_values(&unlabeled(&[1.0]), 0).is_err());
    }

    #[test]
    fn one_series_per_group_with_absent_label_last() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(
            &store,
            "subject_age,subject_sex\n18,male\n25,female\n40,male\nNA,female\n33,NA\n",
        );

        let polygon = frequency_polygon(&stops, "subject_age", Some("subject_sex"), 30).unwrap();
        let labels: Vec<Option<&str>> = polygon.series.iter().map(|s| s.label.as_deref()).collect();

        assert_eq!(labels, vec![Some("female"), Some("male"), None]);
        assert_eq!(polygon.series[0].total(), 1);
        assert_eq!(polygon.series[1].total(), 2);
        assert_eq!(polygon.series[2].total(), 1);
        assert!(polygon.series.iter().all(|s| s.points.len() == 32));
    }

    #[test]
    fn text_column_is_a_data_error() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(&store, "subject_age,subject_sex\nadult,male\n");

        let err = frequency_polygon(&stops, "subject_age", None, 30).unwrap_err();
        assert!(matches!(err, AnalyticsError::Data { .. }));
    }
}

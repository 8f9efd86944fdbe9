//! Stop coordinates for map overlays.

use stop_report_database::{Dataset, quote_ident};
use stop_report_geography_models::StopPoint;

use crate::{AnalyticsError, require_columns};

/// Coordinates of every row with both `lat` and `lng` present, with the
/// optional `category` column as each point's category.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if a column is missing.
pub fn stop_points(
    dataset: &Dataset<'_>,
    lat: &str,
    lng: &str,
    category: Option<&str>,
) -> Result<Vec<StopPoint>, AnalyticsError> {
    let mut columns = vec![lat, lng];
    columns.extend(category);
    require_columns(dataset, &columns)?;

    let lat = quote_ident(lat);
    let lng = quote_ident(lng);
    let category = category.map_or_else(
        || "CAST(NULL AS VARCHAR)".to_string(),
        |c| format!("CAST({} AS VARCHAR)", quote_ident(c)),
    );
    let sql = format!(
        "SELECT CAST({lng} AS DOUBLE), CAST({lat} AS DOUBLE), {category} FROM {} \
         WHERE {lat} IS NOT NULL AND {lng} IS NOT NULL",
        dataset.quoted()
    );

    let points = dataset.query_rows(&sql, |row| {
        Ok(StopPoint {
            lng: row.get(0)?,
            lat: row.get(1)?,
            category: row.get(2)?,
        })
    })?;

    log::debug!("{} located stops in {}", points.len(), dataset.relation());
    Ok(points)
}

#[cfg(test)]
mod tests {
    use stop_report_database::StopStore;

    use super::*;
    use crate::test_support::load;

    #[test]
    fn skips_rows_without_coordinates() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(
            &store,
            "lat,lng,subject_race\n37.77,-87.11,white\nNA,-87.12,black\n37.75,NA,white\n37.76,-87.10,NA\n",
        );

        let points = stop_points(&stops, "lat", "lng", Some("subject_race")).unwrap();

        assert_eq!(points.len(), 2);
        assert!((points[0].lng + 87.11).abs() < 1e-9);
        assert_eq!(points[0].category.as_deref(), Some("white"));
        assert_eq!(points[1].category, None);
    }

    #[test]
    fn missing_coordinate_column_is_a_data_error() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(&store, "lat,subject_race\n37.77,white\n");

        assert!(matches!(
            stop_points(&stops, "lat", "lng", None),
            Err(AnalyticsError::Data { .. })
        ));
    }
}

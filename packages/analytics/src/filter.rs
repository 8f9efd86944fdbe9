//! Conjunctive row filters.
//!
//! Predicates are compiled into a SQL `WHERE` clause. Literals are inlined
//! as escaped SQL text because the filtered relation is materialized as a
//! view, and views cannot carry bound parameters.

use stop_report_analytics_models::{Predicate, Scalar};
use stop_report_database::{Dataset, quote_ident, quote_literal};

use crate::{AnalyticsError, require_columns};

fn literal(value: &Scalar) -> Result<String, AnalyticsError> {
    Ok(match value {
        Scalar::Bool(true) => "TRUE".to_string(),
        Scalar::Bool(false) => "FALSE".to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) if f.is_finite() => format!("{f:?}"),
        Scalar::Float(f) => {
            return Err(AnalyticsError::data(format!(
                "cannot compare against non-finite value {f}"
            )));
        }
        Scalar::Text(s) => quote_literal(s),
        Scalar::Date(d) => format!("DATE '{}'", d.format("%Y-%m-%d")),
    })
}

fn compile_one(predicate: &Predicate) -> Result<String, AnalyticsError> {
    let column = quote_ident(predicate.column());
    Ok(match predicate {
        Predicate::Eq { value, .. } => format!("{column} = {}", literal(value)?),
        Predicate::Range { min, max, .. } => {
            let mut bounds = Vec::new();
            if let Some(min) = min {
                bounds.push(format!("{column} >= {}", literal(min)?));
            }
            if let Some(max) = max {
                bounds.push(format!("{column} <= {}", literal(max)?));
            }
            if bounds.is_empty() {
                // An unbounded range still rejects absent values.
                format!("{column} IS NOT NULL")
            } else {
                format!("({})", bounds.join(" AND "))
            }
        }
        Predicate::IsNull { .. } => format!("{column} IS NULL"),
        Predicate::NotNull { .. } => format!("{column} IS NOT NULL"),
    })
}

/// Compiles `predicates` into a `WHERE` clause body. An empty set compiles
/// to `TRUE`.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if a literal cannot be expressed in SQL.
pub fn where_clause(predicates: &[Predicate]) -> Result<String, AnalyticsError> {
    if predicates.is_empty() {
        return Ok("TRUE".to_string());
    }
    let parts: Result<Vec<String>, AnalyticsError> = predicates.iter().map(compile_one).collect();
    Ok(parts?.join(" AND "))
}

fn predicate_columns(predicates: &[Predicate]) -> Vec<&str> {
    predicates.iter().map(Predicate::column).collect()
}

/// Returns the rows of `dataset` satisfying every predicate, as a new
/// dataset. `dataset` itself is unchanged.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if a predicate names a column the
/// dataset lacks.
pub fn filter<'a>(
    dataset: &Dataset<'a>,
    predicates: &[Predicate],
) -> Result<Dataset<'a>, AnalyticsError> {
    require_columns(dataset, &predicate_columns(predicates))?;

    if predicates.is_empty() {
        return Ok(dataset.clone());
    }

    let clause = where_clause(predicates)?;
    Ok(dataset.derive(&clause)?)
}

/// Number of rows in `dataset`.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the query fails.
pub fn count(dataset: &Dataset<'_>) -> Result<u64, AnalyticsError> {
    Ok(dataset.row_count()?)
}

/// Number of rows in `dataset` satisfying every predicate.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if a predicate names a column the
/// dataset lacks.
pub fn count_where(dataset: &Dataset<'_>, predicates: &[Predicate]) -> Result<u64, AnalyticsError> {
    require_columns(dataset, &predicate_columns(predicates))?;

    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        dataset.quoted(),
        where_clause(predicates)?
    );
    let counts = dataset.query_rows(&sql, |row| row.get::<_, i64>(0))?;

    #[allow(clippy::cast_sign_loss)]
    Ok(counts.first().copied().unwrap_or(0).max(0) as u64)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use stop_report_database::StopStore;

    use super::*;
    use crate::test_support::load;

    const CSV: &str = "\
raw_row_number,date,district,subject_sex,subject_age,arrest_made
1,2014-03-02,SOUTH END,female,34,TRUE
2,2014-03-05,SOUTH END,male,NA,FALSE
3,2014-04-01,NORTH END,female,22,TRUE
4,2015-01-01,NA,male,61,NA
5,2015-02-11,O'BRIEN,female,45,FALSE
";

    fn row_ids(dataset: &Dataset<'_>) -> Vec<i64> {
        dataset
            .query_rows(
                &format!(
                    "SELECT raw_row_number FROM {} ORDER BY raw_row_number",
                    dataset.quoted()
                ),
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn arrest_count_is_bounded_by_total() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(&store, CSV);

        let total = count(&stops).unwrap();
        let arrests = count(&filter(&stops, &[Predicate::eq("arrest_made", true)]).unwrap()).unwrap();

        assert_eq!(total, 5);
        assert_eq!(arrests, 2);
        assert!(arrests <= total);
    }

    #[test]
    fn filtering_is_idempotent() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(&store, CSV);
        let predicates = [
            Predicate::eq("subject_sex", "female"),
            Predicate::at_least("subject_age", 30),
        ];

        let once = filter(&stops, &predicates).unwrap();
        let twice = filter(&once, &predicates).unwrap();

        assert_eq!(row_ids(&once), vec![1, 5]);
        assert_eq!(row_ids(&once), row_ids(&twice));
    }

    #[test]
    fn absent_values_fail_comparisons() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(&store, CSV);

        let young = count_where(&stops, &[Predicate::at_most("subject_age", 200)]).unwrap();
        let not_arrested = count_where(&stops, &[Predicate::eq("arrest_made", false)]).unwrap();
        let unknown_age = count_where(&stops, &[Predicate::is_null("subject_age")]).unwrap();

        assert_eq!(young, 4);
        assert_eq!(not_arrested, 2);
        assert_eq!(unknown_age, 1);
    }

    #[test]
    fn date_ranges_are_inclusive() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(&store, CSV);
        let from = NaiveDate::from_ymd_opt(2014, 3, 2).unwrap();
        let to = NaiveDate::from_ymd_opt(2014, 4, 1).unwrap();

        let spring = filter(&stops, &[Predicate::between("date", from, to)]).unwrap();
        assert_eq!(row_ids(&spring), vec![1, 2, 3]);
    }

    #[test]
    fn text_literals_are_escaped() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(&store, CSV);

        let obrien = count_where(&stops, &[Predicate::eq("district", "O'BRIEN")]).unwrap();
        assert_eq!(obrien, 1);
    }

    #[test]
    fn empty_predicate_set_keeps_every_row() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(&store, CSV);

        let all = filter(&stops, &[]).unwrap();
        assert_eq!(all.relation(), stops.relation());
        assert_eq!(count_where(&stops, &[]).unwrap(), 5);
    }

    #[test]
    fn unknown_column_is_a_data_error() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(&store, CSV);

        let err = filter(&stops, &[Predicate::eq("citation_issued", true)]).unwrap_err();
        assert!(matches!(err, AnalyticsError::Data { .. }));
    }

    #[test]
    fn compiles_literals() {
        let date = NaiveDate::from_ymd_opt(2014, 3, 2).unwrap();
        assert_eq!(
            where_clause(&[Predicate::eq("date", date), Predicate::eq("lat", 1.5)]).unwrap(),
            "\"date\" = DATE '2014-03-02' AND \"lat\" = 1.5"
        );
        assert!(where_clause(&[Predicate::eq("lat", f64::NAN)]).is_err());
    }
}

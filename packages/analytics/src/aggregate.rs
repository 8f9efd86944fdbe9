//! Grouped row counts.

use stop_report_analytics_models::{GroupCount, GroupKey};
use stop_report_database::{Dataset, quote_ident};

use crate::{AnalyticsError, require_columns};

/// SQL list of `CAST(key AS VARCHAR)` expressions, in key order.
pub(crate) fn key_exprs(keys: &[&str]) -> String {
    keys.iter()
        .map(|k| format!("CAST({} AS VARCHAR)", quote_ident(k)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `1, 2, ..., n` for `GROUP BY` positions.
pub(crate) fn positions(n: usize) -> String {
    (1..=n).map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

/// `ORDER BY` positions with absent values last.
pub(crate) fn order_positions(n: usize) -> String {
    (1..=n)
        .map(|i| format!("{i} NULLS LAST"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn read_key(row: &duckdb::Row<'_>, width: usize) -> duckdb::Result<GroupKey> {
    (0..width).map(|i| row.get::<_, Option<String>>(i)).collect()
}

/// Counts the rows of each distinct `keys` tuple.
///
/// Absent key values form their own partition (`None`). Groups are returned
/// in ascending key order with absent values last.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if a key column is missing or `keys` is
/// empty.
pub fn group_count(dataset: &Dataset<'_>, keys: &[&str]) -> Result<Vec<GroupCount>, AnalyticsError> {
    if keys.is_empty() {
        return Err(AnalyticsError::data("group_count needs at least one key"));
    }
    require_columns(dataset, keys)?;

    let width = keys.len();
    let sql = format!(
        "SELECT {}, COUNT(*) FROM {} GROUP BY {} ORDER BY {}",
        key_exprs(keys),
        dataset.quoted(),
        positions(width),
        order_positions(width),
    );

    let groups = dataset.query_rows(&sql, |row| {
        let key = read_key(row, width)?;
        let count: i64 = row.get(width)?;
        #[allow(clippy::cast_sign_loss)]
        Ok(GroupCount {
            key,
            count: count.max(0) as u64,
        })
    })?;

    log::debug!("{} groups over {keys:?} in {}", groups.len(), dataset.relation());
    Ok(groups)
}

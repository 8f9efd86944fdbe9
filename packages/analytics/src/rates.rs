//! Grouped outcome rates (e.g. arrest rate by race and sex).
//!
//! Rates are computed in three explicit steps: observed tallies per group,
//! an optional key normalizer that folds groups together, then a
//! missing-value policy turning each tally into definite counts. Groups
//! whose denominator is zero after the policy are left out of the result.

use std::collections::BTreeMap;

use stop_report_analytics_models::{GroupKey, OutcomeCounts, OutcomeTally, RateRow};
use stop_report_database::{ColumnType, Dataset, quote_ident};

use crate::aggregate::{key_exprs, order_positions, positions, read_key};
use crate::{AnalyticsError, require_columns};

/// Treats an outcome never observed in a group as observed zero times.
#[must_use]
pub fn missing_outcome_as_zero(tally: OutcomeTally) -> OutcomeCounts {
    OutcomeCounts {
        positive: tally.positive.unwrap_or(0),
        negative: tally.negative.unwrap_or(0),
    }
}

/// Counts rows per (`keys` tuple, boolean `outcome`). Rows whose outcome is
/// absent are not counted.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if a column is missing or `outcome` is
/// not boolean.
pub fn outcome_tallies(
    dataset: &Dataset<'_>,
    keys: &[&str],
    outcome: &str,
) -> Result<Vec<(GroupKey, OutcomeTally)>, AnalyticsError> {
    let mut columns = keys.to_vec();
    columns.push(outcome);
    require_columns(dataset, &columns)?;

    match dataset.column_type(outcome)? {
        Some(ColumnType::Boolean) => {}
        other => {
            return Err(AnalyticsError::data(format!(
                "outcome column {outcome:?} must be boolean, found {other:?}"
            )));
        }
    }

    let width = keys.len();
    let key_list = if keys.is_empty() {
        String::new()
    } else {
        format!("{}, ", key_exprs(keys))
    };
    let outcome_col = quote_ident(outcome);
    let sql = format!(
        "SELECT {key_list}{outcome_col}, COUNT(*) FROM {} WHERE {outcome_col} IS NOT NULL \
         GROUP BY {} ORDER BY {}",
        dataset.quoted(),
        positions(width + 1),
        order_positions(width + 1),
    );

    let cells = dataset.query_rows(&sql, |row| {
        let key = read_key(row, width)?;
        let value: bool = row.get(width)?;
        let count: i64 = row.get(width + 1)?;
        #[allow(clippy::cast_sign_loss)]
        Ok((key, value, count.max(0) as u64))
    })?;

    let mut tallies: BTreeMap<GroupKey, OutcomeTally> = BTreeMap::new();
    for (key, value, n) in cells {
        let tally = tallies.entry(key).or_default();
        if value {
            tally.positive = Some(n);
        } else {
            tally.negative = Some(n);
        }
    }

    Ok(tallies.into_iter().collect())
}

/// Rate of a boolean `outcome` per group of `keys`.
///
/// Each observed group key is passed through `normalize`; groups mapping to
/// the same key are merged before `policy` turns the merged tally into
/// counts. A group with zero total after the policy has no defined rate and
/// is omitted.
///
/// # Errors
///
/// Returns [`AnalyticsError`] under the same conditions as
/// [`outcome_tallies`].
pub fn arrest_rates<N, P>(
    dataset: &Dataset<'_>,
    keys: &[&str],
    outcome: &str,
    normalize: N,
    policy: P,
) -> Result<Vec<RateRow>, AnalyticsError>
where
    N: Fn(GroupKey) -> GroupKey,
    P: Fn(OutcomeTally) -> OutcomeCounts,
{
    let mut merged: BTreeMap<GroupKey, OutcomeTally> = BTreeMap::new();
    for (key, tally) in outcome_tallies(dataset, keys, outcome)? {
        let entry = merged.entry(normalize(key)).or_default();
        *entry = entry.merge(tally);
    }

    let mut rows = Vec::with_capacity(merged.len());
    for (key, tally) in merged {
        let counts = policy(tally);
        let Some(rate) = counts.rate() else {
            log::debug!("Dropping group {key:?}: no observed {outcome}");
            continue;
        };
        rows.push(RateRow { key, counts, rate });
    }

    Ok(rows)
}

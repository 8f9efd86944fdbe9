#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Predicate and aggregate types for the stop analytics stage.
//!
//! Row filters are expressed as a conjunction of [`Predicate`]s over named
//! columns. Aggregates ([`GroupCount`], [`RateRow`], [`FrequencyPolygon`])
//! are plain values recomputed in full by every query.

use chrono::NaiveDate;

/// A literal compared against a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// Text literal.
    Text(String),
    /// Calendar date literal.
    Date(NaiveDate),
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// One row predicate. A row survives a filter iff every predicate holds.
///
/// Comparisons against an absent value never hold; only [`Predicate::IsNull`]
/// selects absent values.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column == value`.
    Eq {
        /// Column name.
        column: String,
        /// Value to compare with.
        value: Scalar,
    },
    /// `min <= column <= max`; either bound may be open.
    Range {
        /// Column name.
        column: String,
        /// Inclusive lower bound.
        min: Option<Scalar>,
        /// Inclusive upper bound.
        max: Option<Scalar>,
    },
    /// Column value is absent.
    IsNull {
        /// Column name.
        column: String,
    },
    /// Column value is present.
    NotNull {
        /// Column name.
        column: String,
    },
}

impl Predicate {
    /// `column == value`.
    #[must_use]
    pub fn eq(column: &str, value: impl Into<Scalar>) -> Self {
        Self::Eq {
            column: column.to_string(),
            value: value.into(),
        }
    }

    /// `min <= column <= max`.
    #[must_use]
    pub fn between(column: &str, min: impl Into<Scalar>, max: impl Into<Scalar>) -> Self {
        Self::Range {
            column: column.to_string(),
            min: Some(min.into()),
            max: Some(max.into()),
        }
    }

    /// `column >= min`.
    #[must_use]
    pub fn at_least(column: &str, min: impl Into<Scalar>) -> Self {
        Self::Range {
            column: column.to_string(),
            min: Some(min.into()),
            max: None,
        }
    }

    /// `column <= max`.
    #[must_use]
    pub fn at_most(column: &str, max: impl Into<Scalar>) -> Self {
        Self::Range {
            column: column.to_string(),
            min: None,
            max: Some(max.into()),
        }
    }

    /// Column value is absent.
    #[must_use]
    pub fn is_null(column: &str) -> Self {
        Self::IsNull {
            column: column.to_string(),
        }
    }

    /// Column value is present.
    #[must_use]
    pub fn not_null(column: &str) -> Self {
        Self::NotNull {
            column: column.to_string(),
        }
    }

    /// The column this predicate reads.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. }
            | Self::Range { column, .. }
            | Self::IsNull { column }
            | Self::NotNull { column } => column,
        }
    }
}

/// Grouping key: one text rendering per key column, `None` where the value
/// is absent.
pub type GroupKey = Vec<Option<String>>;

/// Row count of one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    /// Key values, in key-column order.
    pub key: GroupKey,
    /// Rows in the partition.
    pub count: u64,
}

/// Raw per-group counts of a boolean outcome, as observed.
///
/// A side is `None` when no row of the group had that outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    /// Rows where the outcome is true.
    pub positive: Option<u64>,
    /// Rows where the outcome is false.
    pub negative: Option<u64>,
}

impl OutcomeTally {
    /// Sums two tallies, side by side. A side stays `None` only if it is
    /// `None` in both.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        const fn add(a: Option<u64>, b: Option<u64>) -> Option<u64> {
            match (a, b) {
                (Some(a), Some(b)) => Some(a + b),
                (Some(n), None) | (None, Some(n)) => Some(n),
                (None, None) => None,
            }
        }
        Self {
            positive: add(self.positive, other.positive),
            negative: add(self.negative, other.negative),
        }
    }
}

/// Outcome counts after a missing-value policy has been applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    /// Rows where the outcome is true.
    pub positive: u64,
    /// Rows where the outcome is false.
    pub negative: u64,
}

impl OutcomeCounts {
    /// `positive + negative`.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.positive + self.negative
    }

    /// `positive / total`, or `None` when the total is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rate(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.positive as f64 / total as f64)
    }
}

/// One row of a grouped rate table.
#[derive(Debug, Clone, PartialEq)]
pub struct RateRow {
    /// Key values, in key-column order.
    pub key: GroupKey,
    /// Counts the rate was computed from.
    pub counts: OutcomeCounts,
    /// `counts.positive / counts.total()`, always within `[0, 1]`.
    pub rate: f64,
}

/// One vertex of a frequency polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyPoint {
    /// Bin center.
    pub x: f64,
    /// Values falling into the bin.
    pub count: u64,
}

/// One line of a frequency polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySeries {
    /// Series value, `None` for rows where it is absent.
    pub label: Option<String>,
    /// Vertices in ascending `x` order.
    pub points: Vec<FrequencyPoint>,
}

impl FrequencySeries {
    /// Total count across all bins.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.points.iter().map(|p| p.count).sum()
    }
}

/// Binned counts of a numeric column, one series per group.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyPolygon {
    /// Width shared by every bin.
    pub bin_width: f64,
    /// The series, ordered by label with the absent label last.
    pub series: Vec<FrequencySeries>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_missing_only_when_missing_on_both_sides() {
        let a = OutcomeTally {
            positive: Some(2),
            negative: None,
        };
        let b = OutcomeTally {
            positive: Some(1),
            negative: None,
        };
        let merged = a.merge(b);
        assert_eq!(merged.positive, Some(3));
        assert_eq!(merged.negative, None);

        let c = OutcomeTally {
            positive: None,
            negative: Some(4),
        };
        assert_eq!(merged.merge(c).negative, Some(4));
    }

    #[test]
    fn rate_is_undefined_for_empty_counts() {
        assert_eq!(OutcomeCounts::default().rate(), None);
        let counts = OutcomeCounts {
            positive: 1,
            negative: 3,
        };
        assert_eq!(counts.rate(), Some(0.25));
    }

    #[test]
    fn predicate_constructors_record_column() {
        let date = NaiveDate::from_ymd_opt(2014, 3, 2).unwrap();
        assert_eq!(Predicate::eq("district", "SOUTH END").column(), "district");
        assert_eq!(
            Predicate::at_least("date", date),
            Predicate::Range {
                column: "date".to_string(),
                min: Some(Scalar::Date(date)),
                max: None,
            }
        );
        assert_eq!(Predicate::not_null("lat").column(), "lat");
    }
}

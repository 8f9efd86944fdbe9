//! Folding raw demographic values onto the report's categories.

use std::collections::BTreeSet;

use stop_report_analytics_models::GroupKey;
use stop_report_geography_models::StopPoint;
use stop_report_stops_models::{SubjectRace, SubjectSex};

/// Rewrites position `race_at` of `key` to its canonical race value, so
/// `other`, `unknown` and missing race land in one group.
#[must_use]
pub fn fold_race(mut key: GroupKey, race_at: usize) -> GroupKey {
    if let Some(slot) = key.get_mut(race_at) {
        *slot = Some(SubjectRace::from_raw(slot.as_deref()).to_string());
    }
    key
}

/// Rewrites position `sex_at` of `key` to its canonical sex value.
#[must_use]
pub fn fold_sex(mut key: GroupKey, sex_at: usize) -> GroupKey {
    if let Some(slot) = key.get_mut(sex_at) {
        *slot = Some(SubjectSex::from_raw(slot.as_deref()).to_string());
    }
    key
}

/// Canonical race of a folded key value.
#[must_use]
pub fn race_of(value: Option<&str>) -> SubjectRace {
    SubjectRace::from_raw(value)
}

/// Race labels in table order.
#[must_use]
pub fn race_priority() -> Vec<&'static str> {
    SubjectRace::all().iter().map(|r| r.label()).collect()
}

/// Replaces each point's raw race with its display label.
pub fn label_races(points: &mut [StopPoint]) {
    for point in points {
        point.category = Some(race_of(point.category.as_deref()).label().to_string());
    }
}

/// Race labels that occur in `points`, in table order. Accepts raw values
/// or labels, which differ only in case.
#[must_use]
pub fn present_races(points: &[StopPoint]) -> Vec<String> {
    let present: BTreeSet<SubjectRace> = points
        .iter()
        .map(|p| SubjectRace::from_raw(p.category.as_deref()))
        .collect();
    present.into_iter().map(|r| r.label().to_string()).collect()
}

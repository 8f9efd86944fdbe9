//! Owensboro, KY: who gets stopped, where, and an animated map cycling
//! through stops by race over the city's police zones.

use std::collections::BTreeMap;

use stop_report_analytics::{AnalyticsError, count, group_count, stop_points};
use stop_report_database::Dataset;
use stop_report_geography_models::{BoundarySet, StopPoint, TaggedPoints};
use stop_report_render::animation::{Timeline, render_animated_map};
use stop_report_render::map::{MapPlan, MapText, render_map};
use stop_report_render::table::{Cell, Column, ColumnFormat, Table, format_integer};
use stop_report_render::{RenderError, write_artifact};
use stop_report_source::source_def::{Attribution, DatasetDefinition};
use stop_report_spatial::BoundaryIndex;
use stop_report_stops_models::SubjectRace;
use stop_report_stops_models::columns::{LAT, LNG, SUBJECT_RACE};

use crate::summary::Section;
use crate::taxonomy::{label_races, present_races, race_of, race_priority};
use crate::{QuestionError, ReportContext};

const RACE_MD: &str = "stops_by_race.md";
const RACE_HTML: &str = "stops_by_race.html";
const ZONES_MD: &str = "stops_by_zone.md";
const ZONES_HTML: &str = "stops_by_zone.html";
const ZONES_MAP: &str = "stops_by_zone_map.svg";
const RACE_ANIMATION: &str = "stops_by_race_animated.svg";

/// Stops per race, folded onto the report categories, in table order.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the race column is missing.
pub fn stops_by_race(stops: &Dataset<'_>) -> Result<Vec<(SubjectRace, u64)>, AnalyticsError> {
    let mut folded: BTreeMap<SubjectRace, u64> = BTreeMap::new();
    for group in group_count(stops, &[SUBJECT_RACE])? {
        let race = race_of(group.key.first().cloned().flatten().as_deref());
        *folded.entry(race).or_default() += group.count;
    }
    Ok(folded.into_iter().collect())
}

/// Count and share of stops per race.
///
/// # Errors
///
/// Returns [`RenderError`] if a row cannot be added.
pub fn race_table(
    counts: &[(SubjectRace, u64)],
    place: &str,
    attribution: &Attribution,
) -> Result<Table, RenderError> {
    let total: u64 = counts.iter().map(|(_, n)| n).sum();
    let mut table = Table::new(
        &format!("Stops by race, {place}"),
        vec![
            Column::new("Race", ColumnFormat::Text),
            Column::new("Stops", ColumnFormat::Integer),
            Column::new("Share", ColumnFormat::Percent),
        ],
    )
    .with_footer(&attribution.source_note())
    .with_row_order(0, &race_priority());

    for (race, n) in counts {
        #[allow(clippy::cast_precision_loss)]
        let share = if total == 0 {
            Cell::Empty
        } else {
            Cell::Number(*n as f64 / total as f64)
        };
        table.push_row(vec![
            Cell::Text(race.label().to_string()),
            Cell::Integer(*n),
            share,
        ])?;
    }

    Ok(table)
}

/// Stops attributed to one police zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneCount {
    /// Zone display name.
    pub zone: String,
    /// Stops located inside the zone.
    pub stops: u64,
}

/// Stop counts per zone of `layer`, in layer order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneTally {
    /// One entry per zone.
    pub zones: Vec<ZoneCount>,
    /// Stops with coordinates outside every zone.
    pub outside: u64,
    /// Stops without coordinates.
    pub unlocated: u64,
}

/// Attributes every located stop to the zone containing it.
///
/// Zones are named by `label_field`, else their first text attribute, else
/// `"Zone <n>"`.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a coordinate column is missing.
pub fn stops_per_zone(
    stops: &Dataset<'_>,
    layer: &BoundarySet,
    label_field: Option<&str>,
) -> Result<ZoneTally, AnalyticsError> {
    let total = count(stops)?;
    let points = TaggedPoints::wgs84(stop_points(stops, LAT, LNG, None)?);
    if !points.crs.is_compatible_with(&layer.crs) {
        log::warn!(
            "Counting {} stops against a {} layer; most will fall outside",
            points.crs.label(),
            layer.crs.label()
        );
    }
    let located = points.points.len() as u64;

    let index = BoundaryIndex::build(layer);
    let (counts, outside) = index.count_points(layer.len(), &points);

    let zones = layer
        .boundaries
        .iter()
        .zip(counts)
        .enumerate()
        .map(|(i, (boundary, stops))| ZoneCount {
            zone: boundary
                .label(label_field)
                .unwrap_or_else(|| format!("Zone {}", i + 1)),
            stops,
        })
        .collect();

    Ok(ZoneTally {
        zones,
        outside,
        unlocated: total.saturating_sub(located),
    })
}

/// Stops per zone, in layer order.
///
/// # Errors
///
/// Returns [`RenderError`] if a row cannot be added.
pub fn zone_table(
    tally: &ZoneTally,
    place: &str,
    description: &str,
    attribution: &Attribution,
) -> Result<Table, RenderError> {
    let mut table = Table::new(
        &format!("Stops by {description}, {place}"),
        vec![
            Column::new("Zone", ColumnFormat::Text),
            Column::new("Stops", ColumnFormat::Integer),
        ],
    )
    .with_footer(&attribution.source_note());

    for zone in &tally.zones {
        table.push_row(vec![Cell::Text(zone.zone.clone()), Cell::Integer(zone.stops)])?;
    }
    Ok(table)
}

/// Located stops labeled by race.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a column is missing.
pub fn race_points(stops: &Dataset<'_>) -> Result<Vec<StopPoint>, AnalyticsError> {
    let mut points = stop_points(stops, LAT, LNG, Some(SUBJECT_RACE))?;
    label_races(&mut points);
    Ok(points)
}

fn write_table(
    ctx: &ReportContext,
    def: &DatasetDefinition,
    table: &Table,
    markdown: &str,
    html: &str,
    section: &mut Section,
) -> Result<(), RenderError> {
    write_artifact(&ctx.artifact_path(def, markdown), &table.to_markdown())?;
    write_artifact(&ctx.artifact_path(def, html), &table.to_html(&ctx.theme))?;
    section.push(table.to_markdown());
    section.push(format!(
        "[{} as HTML]({})",
        table.title,
        ReportContext::artifact_link(def, html)
    ));
    Ok(())
}

/// Answers every Owensboro question, writes the artifacts, and returns the
/// summary section.
///
/// # Errors
///
/// Returns [`QuestionError`] if a question cannot be answered or an artifact
/// cannot be written.
pub fn report(
    ctx: &ReportContext,
    def: &DatasetDefinition,
    stops: &Dataset<'_>,
    zones: &BoundarySet,
) -> Result<Section, QuestionError> {
    let place = def.place_name();
    let source = def.attribution.source_note();
    let description = &def.boundaries.description;
    let mut section = Section::new(&place);

    section.push(format!(
        "{} stops by the {}.",
        format_integer(count(stops)?),
        def.name
    ));

    let races = race_table(&stops_by_race(stops)?, &place, &def.attribution)?;
    write_table(ctx, def, &races, RACE_MD, RACE_HTML, &mut section)?;

    let tally = stops_per_zone(stops, zones, def.boundaries.label_field.as_deref())?;
    let zone_stops = zone_table(&tally, &place, description, &def.attribution)?;
    write_table(ctx, def, &zone_stops, ZONES_MD, ZONES_HTML, &mut section)?;
    if tally.outside > 0 || tally.unlocated > 0 {
        section.push(format!(
            "{} stops fall outside every zone and {} have no location.",
            format_integer(tally.outside),
            format_integer(tally.unlocated)
        ));
    }

    let zone_labels: Vec<Option<String>> = tally
        .zones
        .iter()
        .map(|z| Some(format!("{}: {}", z.zone, format_integer(z.stops))))
        .collect();
    let outline = TaggedPoints::wgs84(Vec::new());
    let plan = MapPlan::build(zones, &outline, MapPlan::panel_for(&ctx.theme, false))?
        .with_labels(zones, &zone_labels);
    let map = render_map(
        &plan,
        &[],
        &MapText {
            title: format!("Stops by {description}"),
            subtitle: Some(place.clone()),
            caption: Some(source.clone()),
            legend_title: None,
        },
        &ctx.theme,
    )?;
    write_artifact(&ctx.artifact_path(def, ZONES_MAP), &map)?;
    section.push_image(
        &format!("Stops by {description}"),
        &ReportContext::artifact_link(def, ZONES_MAP),
    );

    let tagged = TaggedPoints::wgs84(race_points(stops)?);
    let states = present_races(&tagged.points);
    let plan = MapPlan::build(zones, &tagged, MapPlan::panel_for(&ctx.theme, true))?;
    let animation = render_animated_map(
        &plan,
        &states,
        &Timeline::default(),
        &MapText {
            title: "Stops by race".to_string(),
            subtitle: Some(format!("{place} {description}")),
            caption: Some(source),
            legend_title: Some("Race".to_string()),
        },
        &ctx.theme,
    )?;
    write_artifact(&ctx.artifact_path(def, RACE_ANIMATION), &animation)?;
    section.push_image(
        "Stops by race, animated",
        &ReportContext::artifact_link(def, RACE_ANIMATION),
    );

    Ok(section)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use geo::{LineString, MultiPolygon, Polygon};
    use stop_report_database::StopStore;
    use stop_report_geography_models::{AttributeValue, Boundary, Crs};
    use stop_report_source::registry::dataset;

    use super::*;

    const STOPS: &str = "\
date,lat,lng,subject_race,subject_sex
2017-01-01,37.76,-87.11,white,male
2017-01-02,37.755,-87.115,black,female
2017-01-03,37.76,-87.09,white,female
2017-01-04,37.765,-87.085,hispanic,male
2017-01-05,37.76,-87.09,other,male
2017-01-06,NA,NA,white,male
2017-01-07,38.5,-86.0,black,male
";

    fn load(store: &StopStore) -> (tempfile::TempDir, Dataset<'_>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("owensboro.csv");
        std::fs::write(&path, STOPS).unwrap();
        let dataset = store.load_csv("owensboro", &path).unwrap();
        (dir, dataset)
    }

    fn zone(x0: f64, name: Option<&str>) -> Boundary {
        let mut attributes = BTreeMap::new();
        if let Some(name) = name {
            attributes.insert("ZONE".to_string(), AttributeValue::Text(name.to_string()));
        }
        Boundary {
            attributes,
            geometry: MultiPolygon(vec![Polygon::new(
                LineString::from(vec![
                    (x0, 37.75),
                    (x0 + 0.02, 37.75),
                    (x0 + 0.02, 37.77),
                    (x0, 37.77),
                    (x0, 37.75),
                ]),
                vec![],
            )]),
        }
    }

    fn zones() -> BoundarySet {
        BoundarySet {
            name: "police_zones".to_string(),
            crs: Crs::Wgs84,
            boundaries: vec![zone(-87.12, Some("North")), zone(-87.10, None)],
        }
    }

    #[test]
    fn race_counts_fold_catch_all_values() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(&store);

        assert_eq!(
            stops_by_race(&stops).unwrap(),
            vec![
                (SubjectRace::White, 3),
                (SubjectRace::Black, 2),
                (SubjectRace::Hispanic, 1),
                (SubjectRace::OtherUnknown, 1),
            ]
        );
    }

    #[test]
    fn race_shares_sum_to_one() {
        let def = dataset("owensboro").unwrap();
        let table = race_table(
            &[(SubjectRace::White, 3), (SubjectRace::Black, 1)],
            "Owensboro, KY",
            &def.attribution,
        )
        .unwrap();

        assert_eq!(table.rows[0][2], Cell::Number(0.75));
        assert_eq!(table.rows[1][2], Cell::Number(0.25));
    }

    #[test]
    fn stops_are_attributed_to_zones() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(&store);

        let tally = stops_per_zone(&stops, &zones(), None).unwrap();

        assert_eq!(
            tally.zones,
            vec![
                ZoneCount {
                    zone: "North".to_string(),
                    stops: 2
                },
                ZoneCount {
                    zone: "Zone 2".to_string(),
                    stops: 3
                },
            ]
        );
        assert_eq!(tally.outside, 1);
        assert_eq!(tally.unlocated, 1);
    }

    #[test]
    fn race_points_skip_missing_coordinates() {
        let store = StopStore::open_in_memory().unwrap();
        let (_dir, stops) = load(&store);

        let points = race_points(&stops).unwrap();
        assert_eq!(points.len(), 6);
        assert_eq!(
            present_races(&points),
            vec!["White", "Black", "Hispanic", "Other/Unknown"]
        );
    }
}

//! Hartford, CT: arrest rates by race and sex, the first arrest of a female
//! driver in the South End, the age profile of stopped drivers, and a map
//! of arrests over the city's neighborhoods.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use stop_report_analytics::{
    AnalyticsError, arrest_rates, count, count_where, filter, first_date, format_long_date,
    frequency_polygon, missing_outcome_as_zero, stop_points,
};
use stop_report_analytics_models::{FrequencyPolygon, Predicate, RateRow};
use stop_report_database::Dataset;
use stop_report_geography_models::{BoundarySet, StopPoint, TaggedPoints};
use stop_report_render::chart::{ChartText, frequency_chart};
use stop_report_render::map::{MapPlan, MapText, render_map};
use stop_report_render::table::{Cell, Column, ColumnFormat, Table, format_integer, format_percent};
use stop_report_render::{RenderError, write_artifact};
use stop_report_source::source_def::{Attribution, DatasetDefinition};
use stop_report_stops_models::columns::{
    ARREST_MADE, DATE, DISTRICT, LAT, LNG, SUBJECT_AGE, SUBJECT_RACE, SUBJECT_SEX,
};
use stop_report_stops_models::{SubjectRace, SubjectSex};

use crate::summary::Section;
use crate::taxonomy::{fold_race, fold_sex, label_races, present_races, race_of, race_priority};
use crate::{QuestionError, ReportContext};

/// Bins in the age frequency polygon.
pub const AGE_BINS: usize = 30;

/// District the first-arrest question asks about.
pub const FIRST_ARREST_DISTRICT: &str = "SOUTH END";

const RATES_MD: &str = "arrest_rates.md";
const RATES_HTML: &str = "arrest_rates.html";
const AGE_CHART: &str = "age_by_sex.svg";
const ARRESTS_MAP: &str = "arrests_map.svg";

/// Stop and arrest counts for the whole dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTotals {
    /// Rows in the dataset.
    pub stops: u64,
    /// Rows with an arrest.
    pub arrests: u64,
}

/// Counts every stop and every arrest.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the arrest column is missing.
pub fn stop_totals(stops: &Dataset<'_>) -> Result<StopTotals, AnalyticsError> {
    Ok(StopTotals {
        stops: count(stops)?,
        arrests: count_where(stops, &[Predicate::eq(ARREST_MADE, true)])?,
    })
}

/// Arrest rate per (race, sex) group, with race and sex folded onto the
/// report categories. A missing arrest count is treated as zero.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a column is missing or the arrest column is
/// not boolean.
pub fn race_sex_arrest_rates(stops: &Dataset<'_>) -> Result<Vec<RateRow>, AnalyticsError> {
    arrest_rates(
        stops,
        &[SUBJECT_RACE, SUBJECT_SEX],
        ARREST_MADE,
        |key| fold_sex(fold_race(key, 0), 1),
        missing_outcome_as_zero,
    )
}

#[derive(Debug, Default)]
struct RaceRates {
    female: Option<f64>,
    male: Option<f64>,
    stops: u64,
}

/// Lays `rates` out with one row per race and one column per sex. Groups of
/// unknown sex are left out.
///
/// # Errors
///
/// Returns [`RenderError`] if a row cannot be added.
pub fn arrest_rate_table(
    rates: &[RateRow],
    place: &str,
    attribution: &Attribution,
) -> Result<Table, RenderError> {
    let mut by_race: BTreeMap<SubjectRace, RaceRates> = BTreeMap::new();
    for row in rates {
        let race = race_of(row.key.first().cloned().flatten().as_deref());
        let entry = by_race.entry(race).or_default();
        match SubjectSex::from_raw(row.key.get(1).cloned().flatten().as_deref()) {
            SubjectSex::Female => entry.female = Some(row.rate),
            SubjectSex::Male => entry.male = Some(row.rate),
            SubjectSex::Unknown => {
                log::debug!("Leaving out {} stops of unknown sex", row.counts.total());
                continue;
            }
        }
        entry.stops += row.counts.total();
    }

    let mut table = Table::new(
        &format!("Arrest rate by race and sex, {place}"),
        vec![
            Column::new("Race", ColumnFormat::Text),
            Column::new("Female", ColumnFormat::Percent),
            Column::new("Male", ColumnFormat::Percent),
            Column::new("Stops", ColumnFormat::Integer),
        ],
    )
    .with_footer(&attribution.source_note())
    .with_row_order(0, &race_priority());

    let rate_cell = |rate: Option<f64>| rate.map_or(Cell::Empty, Cell::Number);
    for (race, rates) in by_race.into_iter().filter(|(_, r)| r.stops > 0) {
        table.push_row(vec![
            Cell::Text(race.label().to_string()),
            rate_cell(rates.female),
            rate_cell(rates.male),
            Cell::Integer(rates.stops),
        ])?;
    }

    Ok(table)
}

/// Date of the first arrest of a female driver in
/// [`FIRST_ARREST_DISTRICT`].
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if no such arrest exists.
pub fn first_female_arrest(stops: &Dataset<'_>) -> Result<NaiveDate, AnalyticsError> {
    let arrests = filter(
        stops,
        &[
            Predicate::eq(DISTRICT, FIRST_ARREST_DISTRICT),
            Predicate::eq(SUBJECT_SEX, SubjectSex::Female.to_string()),
            Predicate::eq(ARREST_MADE, true),
        ],
    )?;
    first_date(&arrests, DATE)
}

/// Age frequency polygon with one series per sex, labeled for display.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the age column is missing, not numeric, or
/// entirely absent.
pub fn age_profile(stops: &Dataset<'_>) -> Result<FrequencyPolygon, AnalyticsError> {
    let mut polygon = frequency_polygon(stops, SUBJECT_AGE, Some(SUBJECT_SEX), AGE_BINS)?;
    for series in &mut polygon.series {
        if let Some(raw) = &series.label {
            series.label = Some(SubjectSex::from_raw(Some(raw)).label().to_string());
        }
    }
    Ok(polygon)
}

/// Locations of arrests, labeled by race.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a column is missing.
pub fn arrest_points(stops: &Dataset<'_>) -> Result<Vec<StopPoint>, AnalyticsError> {
    let arrests = filter(stops, &[Predicate::eq(ARREST_MADE, true)])?;
    let mut points = stop_points(&arrests, LAT, LNG, Some(SUBJECT_RACE))?;
    label_races(&mut points);
    Ok(points)
}

/// Answers every Hartford question, writes the artifacts, and returns the
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
    neighborhoods: &BoundarySet,
) -> Result<Section, QuestionError> {
    let place = def.place_name();
    let source = def.attribution.source_note();
    let mut section = Section::new(&place);

    let totals = stop_totals(stops)?;
    #[allow(clippy::cast_precision_loss)]
    let arrest_share = if totals.stops == 0 {
        0.0
    } else {
        totals.arrests as f64 / totals.stops as f64
    };
    section.push(format!(
        "{} stops by the {}, {} of which ended in an arrest ({}).",
        format_integer(totals.stops),
        def.name,
        format_integer(totals.arrests),
        format_percent(arrest_share)
    ));

    let rates = arrest_rate_table(&race_sex_arrest_rates(stops)?, &place, &def.attribution)?;
    write_artifact(&ctx.artifact_path(def, RATES_MD), &rates.to_markdown())?;
    write_artifact(&ctx.artifact_path(def, RATES_HTML), &rates.to_html(&ctx.theme))?;
    section.push(rates.to_markdown());
    section.push(format!(
        "[Arrest rates as HTML]({})",
        ReportContext::artifact_link(def, RATES_HTML)
    ));

    let first = first_female_arrest(stops)?;
    log::info!("First female arrest in {FIRST_ARREST_DISTRICT}: {first}");
    section.push(format!(
        "The first arrest of a female driver in the South End was on **{}**.",
        format_long_date(first)
    ));

    let ages = age_profile(stops)?;
    let chart = frequency_chart(
        &ages,
        &ChartText {
            title: "Age of stopped drivers by sex".to_string(),
            subtitle: Some(place.clone()),
            x_label: "Subject age".to_string(),
            y_label: "Stops".to_string(),
            caption: Some(source.clone()),
            legend_title: Some("Sex".to_string()),
        },
        &ctx.theme,
    )?;
    write_artifact(&ctx.artifact_path(def, AGE_CHART), &chart)?;
    section.push_image(
        "Age of stopped drivers by sex",
        &ReportContext::artifact_link(def, AGE_CHART),
    );

    let tagged = TaggedPoints::wgs84(arrest_points(stops)?);
    let races = present_races(&tagged.points);
    let labels: Vec<Option<String>> = neighborhoods
        .boundaries
        .iter()
        .map(|b| b.label(def.boundaries.label_field.as_deref()))
        .collect();
    let plan = MapPlan::build(
        neighborhoods,
        &tagged,
        MapPlan::panel_for(&ctx.theme, !races.is_empty()),
    )?
    .with_labels(neighborhoods, &labels);
    let map = render_map(
        &plan,
        &races,
        &MapText {
            title: "Arrests by race".to_string(),
            subtitle: Some(format!("{place} {}", def.boundaries.description)),
            caption: Some(source),
            legend_title: Some("Race".to_string()),
        },
        &ctx.theme,
    )?;
    write_artifact(&ctx.artifact_path(def, ARRESTS_MAP), &map)?;
    section.push_image("Arrests by race", &ReportContext::artifact_link(def, ARRESTS_MAP));
    if plan.dropped > 0 {
        section.push(format!(
            "{} arrests fall outside the {} and are not shown.",
            plan.dropped, def.boundaries.description
        ));
    }

    Ok(section)
}

//! The fixed report sequence: fetch, unpack, analyze, render.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use stop_report_database::{Dataset, StopStore};
use stop_report_geography_models::BoundarySet;
use stop_report_source::progress::ProgressCallback;
use stop_report_source::registry::all_datasets;
use stop_report_source::source_def::DatasetDefinition;
use stop_report_source::download_file;
use stop_report_unpack::artifact::ScopedArtifact;
use stop_report_unpack::{unpack_boundaries, unpack_stops};

use crate::summary::{Section, write_summary};
use crate::{QuestionError, ReportContext, ReportError, hartford, owensboro, paths};

/// Which set of questions a dataset answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Narrative {
    /// Arrest rates, first arrest, ages and an arrest map.
    Hartford,
    /// Stops by race and zone, and an animated map.
    Owensboro,
}

impl Narrative {
    /// The narrative for dataset `id`, if it has one.
    #[must_use]
    pub fn for_dataset(id: &str) -> Option<Self> {
        match id {
            "hartford" => Some(Self::Hartford),
            "owensboro" => Some(Self::Owensboro),
            _ => None,
        }
    }

    fn report(
        self,
        ctx: &ReportContext,
        def: &DatasetDefinition,
        stops: &Dataset<'_>,
        boundaries: &BoundarySet,
    ) -> Result<Section, QuestionError> {
        match self {
            Self::Hartford => hartford::report(ctx, def, stops, boundaries),
            Self::Owensboro => owensboro::report(ctx, def, stops, boundaries),
        }
    }
}

/// Runs the whole report: every registered dataset in order, then the
/// summary. `progress` is asked for one indicator per download.
///
/// Returns the path of the summary.
///
/// # Errors
///
/// Returns the first [`ReportError`] encountered; nothing after it runs.
pub async fn run<F>(ctx: &ReportContext, progress: F) -> Result<PathBuf, ReportError>
where
    F: Fn(&str) -> Arc<dyn ProgressCallback>,
{
    let store = StopStore::open_in_memory()?;
    let mut sections = Vec::new();

    for def in all_datasets() {
        log::info!("=== {} ===", def.place_name());
        let narrative = Narrative::for_dataset(&def.id)
            .ok_or_else(|| ReportError::UnknownDataset(def.id.clone()))?;

        // Each archive is fetched and consumed before the next download.
        let stops_archive = paths::stops_download_path(&ctx.work_dir, &def);
        fetch(&def, &def.stops.url, &stops_archive, progress(&format!("{} stops", def.city)))
            .await?;
        let stops = load_stops(&store, &def, &stops_archive)?;

        let boundaries_archive = paths::boundaries_download_path(&ctx.work_dir, &def);
        fetch(
            &def,
            &def.boundaries.url,
            &boundaries_archive,
            progress(&format!("{} {}", def.city, def.boundaries.description)),
        )
        .await?;
        let boundaries = load_boundaries(&def, &boundaries_archive)?;

        sections.push(answer(ctx, &def, narrative, &stops, &boundaries)?);
    }

    write_summary(&ctx.output_dir, &sections).map_err(|source| ReportError::Render {
        dataset: "summary".to_string(),
        source,
    })
}

async fn fetch(
    def: &DatasetDefinition,
    url: &str,
    dest: &Path,
    progress: Arc<dyn ProgressCallback>,
) -> Result<u64, ReportError> {
    download_file(url, dest, progress.as_ref())
        .await
        .map_err(|source| ReportError::Fetch {
            dataset: def.id.clone(),
            source,
        })
}

/// Unpacks both downloaded archives of `def` and answers its questions.
/// The stop table is named after the dataset id.
///
/// Both archives are deleted before this returns, whether it succeeds or
/// not.
///
/// # Errors
///
/// Returns [`ReportError::Unpack`] if an archive cannot be decoded, or the
/// analysis and presentation errors of the dataset's questions.
pub fn report_from_archives(
    ctx: &ReportContext,
    store: &StopStore,
    def: &DatasetDefinition,
    narrative: Narrative,
    stops_archive: &Path,
    boundaries_archive: &Path,
) -> Result<Section, ReportError> {
    let _boundaries_guard = ScopedArtifact::new(boundaries_archive);

    let stops = load_stops(store, def, stops_archive)?;
    let boundaries = load_boundaries(def, boundaries_archive)?;
    answer(ctx, def, narrative, &stops, &boundaries)
}

fn load_stops<'a>(
    store: &'a StopStore,
    def: &DatasetDefinition,
    archive: &Path,
) -> Result<Dataset<'a>, ReportError> {
    unpack_stops(store, &def.id, archive, def.stops.archive).map_err(|source| {
        ReportError::Unpack {
            dataset: def.id.clone(),
            source,
        }
    })
}

fn load_boundaries(def: &DatasetDefinition, archive: &Path) -> Result<BoundarySet, ReportError> {
    unpack_boundaries(archive, def.boundaries.layer.as_deref()).map_err(|source| {
        ReportError::Unpack {
            dataset: def.id.clone(),
            source,
        }
    })
}

fn answer(
    ctx: &ReportContext,
    def: &DatasetDefinition,
    narrative: Narrative,
    stops: &Dataset<'_>,
    boundaries: &BoundarySet,
) -> Result<Section, ReportError> {
    narrative
        .report(ctx, def, stops, boundaries)
        .map_err(|e| ReportError::question(&def.id, e))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
    use shapefile::{Point, Polygon, PolygonRing, Writer};
    use stop_report_source::registry::dataset;

    use super::*;
    use crate::summary::render_summary;

    const HARTFORD_STOPS: &str = "\
date,time,lat,lng,district,subject_age,subject_race,subject_sex,arrest_made
2014-05-01,10:00:00,41.74,-72.69,SOUTH END,25,white,female,TRUE
2014-03-02,14:30:00,41.735,-72.695,SOUTH END,34,black,female,TRUE
2014-01-15,09:00:00,41.78,-72.67,NORTH END,41,black,male,TRUE
2014-02-10,16:45:00,41.785,-72.665,NORTH END,19,hispanic,male,FALSE
2014-02-01,13:00:00,41.74,-72.69,NORTH END,28,white,female,TRUE
";

    const OWENSBORO_STOPS: &str = "\
date,lat,lng,subject_race,subject_sex
2017-01-01,37.76,-87.11,white,male
2017-01-03,37.76,-87.09,black,female
2017-01-04,NA,NA,hispanic,male
";

    fn write_zip(path: &Path, csv: &str) {
        let mut zip = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
        zip.start_file("stops.csv", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(csv.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    /// Writes a WGS 84 layer of `size`-degree squares, one per `(x, y,
    /// name)`, and bundles it as a `.tgz`.
    fn write_bundle(path: &Path, layer: &str, size: f64, squares: &[(f64, f64, &str)]) {
        let src = tempfile::tempdir().unwrap();
        let shp = src.path().join(format!("{layer}.shp"));
        let table = TableWriterBuilder::new()
            .add_character_field(FieldName::try_from("NAME").unwrap(), 32);
        let mut writer = Writer::from_path(&shp, table).unwrap();
        for (x, y, name) in squares {
            let polygon = Polygon::new(PolygonRing::Outer(vec![
                Point::new(*x, *y),
                Point::new(*x, *y + size),
                Point::new(*x + size, *y + size),
                Point::new(*x + size, *y),
                Point::new(*x, *y),
            ]));
            let mut record = Record::default();
            record.insert(
                "NAME".to_string(),
                FieldValue::Character(Some((*name).to_string())),
            );
            writer.write_shape_and_record(&polygon, &record).unwrap();
        }
        drop(writer);
        std::fs::write(
            shp.with_extension("prj"),
            r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984"]]"#,
        )
        .unwrap();

        let encoder = flate2::write::GzEncoder::new(
            std::fs::File::create(path).unwrap(),
            flate2::Compression::default(),
        );
        let mut builder = tar::Builder::new(encoder);
        builder.append_dir_all("bundle", src.path()).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn narratives_cover_every_registered_dataset() {
        for def in all_datasets() {
            assert!(Narrative::for_dataset(&def.id).is_some(), "{}", def.id);
        }
        assert_eq!(Narrative::for_dataset("springfield"), None);
    }

    #[test]
    fn hartford_archives_become_artifacts() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let ctx = ReportContext::new(out.path(), work.path());
        let def = dataset("hartford").unwrap();

        let stops_archive = paths::stops_download_path(work.path(), &def);
        let boundaries_archive = paths::boundaries_download_path(work.path(), &def);
        write_zip(&stops_archive, HARTFORD_STOPS);
        write_bundle(
            &boundaries_archive,
            "neighborhoods",
            0.02,
            &[(-72.70, 41.73, "South End"), (-72.68, 41.77, "North End")],
        );

        let store = StopStore::open_in_memory().unwrap();
        let section = report_from_archives(
            &ctx,
            &store,
            &def,
            Narrative::Hartford,
            &stops_archive,
            &boundaries_archive,
        )
        .unwrap();

        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
        for artifact in ["arrest_rates.md", "arrest_rates.html", "age_by_sex.svg", "arrests_map.svg"] {
            assert!(ctx.artifact_path(&def, artifact).is_file(), "{artifact}");
        }

        let summary = render_summary(&[section]);
        assert!(summary.contains("## Hartford, CT"));
        assert!(summary.contains("**March 2, 2014**"));
        assert!(summary.contains("![Arrests by race](hartford/arrests_map.svg)"));

        let map = std::fs::read_to_string(ctx.artifact_path(&def, "arrests_map.svg")).unwrap();
        let point_radius = format!(r#"r="{}""#, ctx.theme.point_radius);
        assert_eq!(map.matches(point_radius.as_str()).count(), 4);
        assert!(map.contains("South End"));
    }

    #[test]
    fn owensboro_archives_become_artifacts() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let ctx = ReportContext::new(out.path(), work.path());
        let def = dataset("owensboro").unwrap();

        let stops_archive = paths::stops_download_path(work.path(), &def);
        let boundaries_archive = paths::boundaries_download_path(work.path(), &def);
        write_zip(&stops_archive, OWENSBORO_STOPS);
        write_bundle(
            &boundaries_archive,
            "police_zones",
            0.02,
            &[(-87.12, 37.75, "Zone A"), (-87.10, 37.75, "Zone B")],
        );

        let store = StopStore::open_in_memory().unwrap();
        let section = report_from_archives(
            &ctx,
            &store,
            &def,
            Narrative::Owensboro,
            &stops_archive,
            &boundaries_archive,
        )
        .unwrap();

        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
        let zones_md =
            std::fs::read_to_string(ctx.artifact_path(&def, "stops_by_zone.md")).unwrap();
        assert!(zones_md.contains("Zone A"));
        assert!(zones_md.contains("Zone B"));

        let animation =
            std::fs::read_to_string(ctx.artifact_path(&def, "stops_by_race_animated.svg"))
                .unwrap();
        assert!(animation.contains(r#"id="state-0""#));
        assert!(animation.contains(r#"id="state-1""#));
        assert!(!animation.contains(r#"id="state-2""#));

        let summary = render_summary(&[section]);
        assert!(summary.contains("0 stops fall outside every zone and 1 have no location."));
    }

    #[test]
    fn unpack_failure_names_the_dataset() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let ctx = ReportContext::new(out.path(), work.path());
        let def = dataset("owensboro").unwrap();

        let store = StopStore::open_in_memory().unwrap();
        let err = report_from_archives(
            &ctx,
            &store,
            &def,
            Narrative::Owensboro,
            &work.path().join("missing.csv.zip"),
            &work.path().join("missing.tgz"),
        )
        .unwrap_err();

        assert!(matches!(err, ReportError::Unpack { ref dataset, .. } if dataset == "owensboro"));
    }

    #[test]
    fn corrupt_stop_archive_still_removes_the_boundary_bundle() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let ctx = ReportContext::new(out.path(), work.path());
        let def = dataset("owensboro").unwrap();

        let stops_archive = paths::stops_download_path(work.path(), &def);
        let boundaries_archive = paths::boundaries_download_path(work.path(), &def);
        std::fs::write(&stops_archive, b"PK but not really").unwrap();
        write_bundle(
            &boundaries_archive,
            "police_zones",
            0.02,
            &[(-87.12, 37.75, "Zone A")],
        );

        let store = StopStore::open_in_memory().unwrap();
        let err = report_from_archives(
            &ctx,
            &store,
            &def,
            Narrative::Owensboro,
            &stops_archive,
            &boundaries_archive,
        )
        .unwrap_err();

        assert!(matches!(err, ReportError::Unpack { .. }));
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }
}

//! Stop CSV archives into an in-memory [`Dataset`].

use std::path::{Path, PathBuf};

use stop_report_database::{Dataset, StopStore};
use stop_report_source::source_def::CsvArchive;

use crate::UnpackError;
use crate::archive::{extract_first_csv, gunzip_to};
use crate::artifact::ScopedArtifact;

/// Decodes the stop archive at `archive_path` into table `table` of
/// `store`.
///
/// The archive and any extracted file are deleted before this returns,
/// whether decoding succeeded or not.
///
/// # Errors
///
/// Returns [`UnpackError`] if the archive is missing, corrupt, holds no CSV,
/// or the CSV cannot be parsed.
pub fn unpack_stops<'a>(
    store: &'a StopStore,
    table: &str,
    archive_path: &Path,
    format: CsvArchive,
) -> Result<Dataset<'a>, UnpackError> {
    let archive = ScopedArtifact::new(archive_path);
    if !archive.path().exists() {
        return Err(UnpackError::ArchiveNotFound(
            archive_path.display().to_string(),
        ));
    }

    log::info!("Unpacking {} ({format:?})", archive_path.display());

    let extracted = match format {
        CsvArchive::Plain => None,
        CsvArchive::Gzip | CsvArchive::Zip => Some(ScopedArtifact::new(scratch_path(archive_path))),
    };

    let csv_path = match (&extracted, format) {
        (Some(scratch), CsvArchive::Gzip) => {
            gunzip_to(archive.path(), scratch.path())?;
            scratch.path().to_path_buf()
        }
        (Some(scratch), CsvArchive::Zip) => {
            extract_first_csv(archive.path(), scratch.path())?;
            scratch.path().to_path_buf()
        }
        _ => archive.path().to_path_buf(),
    };

    let dataset = store.load_csv(table, &csv_path)?;
    Ok(dataset)
}

/// Sibling path the decompressed CSV is written to.
fn scratch_path(archive_path: &Path) -> PathBuf {
    let name = archive_path
        .file_name()
        .map_or_else(|| "stops".to_string(), |n| n.to_string_lossy().into_owned());
    archive_path.with_file_name(format!("{name}.extracted.csv"))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    const CSV: &str = "\
date,subject_race,arrest_made
2014-03-02,white,TRUE
2014-03-03,black,FALSE
";

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn gzip_round_trip_leaves_nothing_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("stops.csv.gz");
        let mut encoder = flate2::write::GzEncoder::new(
            std::fs::File::create(&archive).unwrap(),
            flate2::Compression::default(),
        );
        encoder.write_all(CSV.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let store = StopStore::open_in_memory().unwrap();
        let stops = unpack_stops(&store, "stops", &archive, CsvArchive::Gzip).unwrap();

        assert_eq!(stops.row_count().unwrap(), 2);
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn zip_round_trip_leaves_nothing_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("stops.csv.zip");
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&archive).unwrap());
        writer
            .start_file("ct_hartford.csv", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(CSV.as_bytes()).unwrap();
        writer.finish().unwrap();

        let store = StopStore::open_in_memory().unwrap();
        let stops = unpack_stops(&store, "stops", &archive, CsvArchive::Zip).unwrap();

        assert_eq!(stops.row_count().unwrap(), 2);
        assert!(!archive.exists());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn plain_csv_is_loaded_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("stops.csv");
        std::fs::write(&archive, CSV).unwrap();

        let store = StopStore::open_in_memory().unwrap();
        let stops = unpack_stops(&store, "stops", &archive, CsvArchive::Plain).unwrap();

        assert_eq!(stops.row_count().unwrap(), 2);
        assert!(!archive.exists());
    }

    #[test]
    fn corrupt_archive_is_still_removed() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("stops.csv.zip");
        std::fs::write(&archive, b"PK but not really").unwrap();

        let store = StopStore::open_in_memory().unwrap();
        let err = unpack_stops(&store, "stops", &archive, CsvArchive::Zip).unwrap_err();

        assert!(matches!(err, UnpackError::Corrupt { .. }));
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn missing_archive_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = StopStore::open_in_memory().unwrap();
        let err = unpack_stops(
            &store,
            "stops",
            &dir.path().join("absent.zip"),
            CsvArchive::Zip,
        )
        .unwrap_err();

        assert!(matches!(err, UnpackError::ArchiveNotFound(_)));
    }
}

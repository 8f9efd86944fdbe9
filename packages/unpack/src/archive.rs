//! Low-level archive readers: gzip, zip and gzip-compressed tar.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::UnpackError;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> UnpackError + '_ {
    move |source| UnpackError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn corrupt(path: &Path, message: impl std::fmt::Display) -> UnpackError {
    UnpackError::Corrupt {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

fn open(path: &Path) -> Result<File, UnpackError> {
    if !path.exists() {
        return Err(UnpackError::ArchiveNotFound(path.display().to_string()));
    }
    File::open(path).map_err(io_err(path))
}

/// Decompresses the gzip file at `archive` into `dest`.
///
/// # Errors
///
/// Returns [`UnpackError::Corrupt`] if the stream is not valid gzip.
pub fn gunzip_to(archive: &Path, dest: &Path) -> Result<u64, UnpackError> {
    let mut decoder = flate2::read::GzDecoder::new(BufReader::new(open(archive)?));
    let mut out = File::create(dest).map_err(io_err(dest))?;

    let bytes = std::io::copy(&mut decoder, &mut out).map_err(|e| corrupt(archive, e))?;
    log::debug!("Decompressed {} ({bytes} bytes)", archive.display());

    Ok(bytes)
}

/// Copies the first `.csv` entry of the zip file at `archive` into `dest`.
///
/// # Errors
///
/// Returns [`UnpackError::Corrupt`] if the zip cannot be read, or
/// [`UnpackError::MissingEntry`] if it holds no CSV.
pub fn extract_first_csv(archive: &Path, dest: &Path) -> Result<String, UnpackError> {
    let mut zip = zip::ZipArchive::new(open(archive)?).map_err(|e| corrupt(archive, e))?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| corrupt(archive, e))?;
        let name = entry.name().to_string();

        if !entry.is_file() || !name.to_ascii_lowercase().ends_with(".csv") || is_resource_fork(&name)
        {
            continue;
        }

        let mut out = File::create(dest).map_err(io_err(dest))?;
        let bytes = std::io::copy(&mut entry, &mut out).map_err(|e| corrupt(archive, e))?;
        log::debug!("Extracted {name} from {} ({bytes} bytes)", archive.display());

        return Ok(name);
    }

    Err(UnpackError::MissingEntry {
        path: archive.display().to_string(),
        expected: ".csv",
    })
}

/// Unpacks the `.tgz` at `archive` into `dest_dir`.
///
/// # Errors
///
/// Returns [`UnpackError::Corrupt`] if the archive cannot be decoded.
pub fn extract_tgz(archive: &Path, dest_dir: &Path) -> Result<(), UnpackError> {
    std::fs::create_dir_all(dest_dir).map_err(io_err(dest_dir))?;

    let decoder = flate2::read::GzDecoder::new(BufReader::new(open(archive)?));
    let mut tar = tar::Archive::new(decoder);
    tar.unpack(dest_dir).map_err(|e| corrupt(archive, e))?;

    log::debug!("Unpacked {} into {}", archive.display(), dest_dir.display());
    Ok(())
}

/// Every `.shp` file under `dir`, recursively, in path order.
///
/// # Errors
///
/// Returns [`UnpackError::Io`] if a directory cannot be listed.
pub fn find_shapefiles(dir: &Path) -> Result<Vec<PathBuf>, UnpackError> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current).map_err(io_err(&current))? {
            let path = entry.map_err(io_err(&current))?.path();
            let name = path
                .file_name()
                .map_or_else(String::new, |n| n.to_string_lossy().into_owned());

            if is_resource_fork(&name) || name == "__MACOSX" {
                continue;
            }
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("shp"))
            {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

/// `AppleDouble` metadata files shipped inside archives built on macOS.
fn is_resource_fork(name: &str) -> bool {
    name.rsplit('/').next().is_some_and(|base| base.starts_with("._"))
        || name.starts_with("__MACOSX/")
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_first_csv_skipping_other_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("stops.zip");
        write_zip(
            &archive,
            &[
                ("README.txt", b"hello"),
                ("__MACOSX/._stops.csv", b"junk"),
                ("stops.csv", b"a,b\n1,2\n"),
            ],
        );

        let dest = dir.path().join("out.csv");
        let name = extract_first_csv(&archive, &dest).unwrap();

        assert_eq!(name, "stops.csv");
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn zip_without_csv_is_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("stops.zip");
        write_zip(&archive, &[("README.txt", b"hello")]);

        let err = extract_first_csv(&archive, &dir.path().join("out.csv")).unwrap_err();
        assert!(matches!(err, UnpackError::MissingEntry { expected: ".csv", .. }));
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("stops.zip");
        std::fs::write(&archive, b"definitely not a zip file").unwrap();

        let err = extract_first_csv(&archive, &dir.path().join("out.csv")).unwrap_err();
        assert!(matches!(err, UnpackError::Corrupt { .. }));
    }

    #[test]
    fn missing_archive_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = gunzip_to(&dir.path().join("nope.gz"), &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, UnpackError::ArchiveNotFound(_)));
    }

    #[test]
    fn finds_nested_shapefiles_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("bundle").join("layers");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("b.shp"), b"").unwrap();
        std::fs::write(nested.join("a.SHP"), b"").unwrap();
        std::fs::write(nested.join("._a.shp"), b"").unwrap();
        std::fs::write(nested.join("a.dbf"), b"").unwrap();

        let found = find_shapefiles(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.SHP", "b.shp"]);
    }
}

//! Canonical file paths for downloads and report artifacts.

use std::path::{Path, PathBuf};

use stop_report_source::source_def::DatasetDefinition;

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
#[must_use]
pub fn project_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .ancestors()
        .nth(2)
        .unwrap_or(manifest)
        .to_path_buf()
}

/// Default artifact directory: `output/` under the project root.
#[must_use]
pub fn default_output_dir() -> PathBuf {
    project_root().join("output")
}

/// Artifact directory for one dataset.
#[must_use]
pub fn dataset_output_dir(output_dir: &Path, def: &DatasetDefinition) -> PathBuf {
    output_dir.join(&def.id)
}

/// Where the stop archive of `def` is downloaded to.
#[must_use]
pub fn stops_download_path(work_dir: &Path, def: &DatasetDefinition) -> PathBuf {
    work_dir.join(def.stops_file_name())
}

/// Where the boundary bundle of `def` is downloaded to.
#[must_use]
pub fn boundaries_download_path(work_dir: &Path, def: &DatasetDefinition) -> PathBuf {
    work_dir.join(def.boundaries_file_name())
}

#[cfg(test)]
mod tests {
    use stop_report_source::registry::dataset;

    use super::*;

    #[test]
    fn project_root_holds_workspace_manifest() {
        assert!(project_root().join("Cargo.toml").exists());
        assert!(project_root().join("packages").is_dir());
    }

    #[test]
    fn download_paths_are_per_dataset() {
        let def = dataset("hartford").unwrap();
        let work = Path::new("/tmp/work");

        assert_eq!(
            stops_download_path(work, &def),
            work.join("hartford_stops.csv.zip")
        );
        assert_eq!(
            boundaries_download_path(work, &def),
            work.join("hartford_boundaries.tgz")
        );
        assert_eq!(
            dataset_output_dir(Path::new("out"), &def),
            Path::new("out").join("hartford")
        );
    }
}

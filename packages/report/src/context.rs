//! Explicit configuration threaded through every report stage.

use std::path::{Path, PathBuf};

use stop_report_render::ReportTheme;
use stop_report_source::source_def::DatasetDefinition;

/// Settings for one report run.
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Styling for every artifact.
    pub theme: ReportTheme,
    /// Directory artifacts are written to.
    pub output_dir: PathBuf,
    /// Directory downloads are written to (and deleted from).
    pub work_dir: PathBuf,
}

impl ReportContext {
    /// A context with the default theme.
    #[must_use]
    pub fn new(output_dir: &Path, work_dir: &Path) -> Self {
        Self {
            theme: ReportTheme::default(),
            output_dir: output_dir.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
        }
    }

    /// Path of artifact `name` for dataset `def`.
    #[must_use]
    pub fn artifact_path(&self, def: &DatasetDefinition, name: &str) -> PathBuf {
        crate::paths::dataset_output_dir(&self.output_dir, def).join(name)
    }

    /// `artifact_path` relative to the output directory, with `/`
    /// separators, for links from the summary.
    #[must_use]
    pub fn artifact_link(def: &DatasetDefinition, name: &str) -> String {
        format!("{}/{name}", def.id)
    }
}

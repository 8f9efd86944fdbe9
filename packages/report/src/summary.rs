//! The Markdown summary that links every artifact.

use std::path::{Path, PathBuf};

use stop_report_render::{RenderError, write_artifact};

/// File name of the summary inside the output directory.
pub const SUMMARY_FILE: &str = "summary.md";

/// One dataset's part of the summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// Heading.
    pub title: String,
    /// Markdown blocks, in order.
    pub blocks: Vec<String>,
}

impl Section {
    /// An empty section.
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            blocks: Vec::new(),
        }
    }

    /// Appends a Markdown block.
    pub fn push(&mut self, block: impl Into<String>) {
        self.blocks.push(block.into());
    }

    /// Appends an image link to an artifact.
    pub fn push_image(&mut self, alt: &str, link: &str) {
        self.push(format!("![{alt}]({link})"));
    }
}

/// Renders the whole summary document.
#[must_use]
pub fn render_summary(sections: &[Section]) -> String {
    let mut out = String::from("# Police stops report\n");
    for section in sections {
        out.push_str("\n## ");
        out.push_str(&section.title);
        out.push('\n');
        for block in &section.blocks {
            out.push('\n');
            out.push_str(block.trim_end());
            out.push('\n');
        }
    }
    out
}

/// Writes the summary to `output_dir` and returns its path.
///
/// # Errors
///
/// Returns [`RenderError::Io`] if the file cannot be written.
pub fn write_summary(output_dir: &Path, sections: &[Section]) -> Result<PathBuf, RenderError> {
    let path = output_dir.join(SUMMARY_FILE);
    write_artifact(&path, &render_summary(sections))?;
    log::info!("Wrote summary to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_render_in_order() {
        let mut first = Section::new("Hartford, CT");
        first.push("12 stops.\n");
        first.push_image("Map", "hartford/map.svg");
        let second = Section::new("Owensboro, KY");

        let doc = render_summary(&[first, second]);

        assert_eq!(
            doc,
            "# Police stops report\n\n## Hartford, CT\n\n12 stops.\n\n![Map](hartford/map.svg)\n\n## Owensboro, KY\n"
        );
    }

    #[test]
    fn writes_into_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_summary(&dir.path().join("out"), &[Section::new("A")]).unwrap();
        assert_eq!(path, dir.path().join("out").join(SUMMARY_FILE));
        assert!(std::fs::read_to_string(path).unwrap().contains("## A"));
    }
}

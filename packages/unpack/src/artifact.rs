//! Scoped on-disk artifacts.
//!
//! Downloads and extraction directories only live for the duration of one
//! unpack step. Wrapping them in a [`ScopedArtifact`] ties their lifetime to
//! a Rust scope: the path is removed when the guard drops, on the success
//! path and on every early return alike.

use std::path::{Path, PathBuf};

/// A file or directory deleted when this guard is dropped.
#[derive(Debug)]
pub struct ScopedArtifact {
    path: PathBuf,
}

impl ScopedArtifact {
    /// Takes ownership of `path`. Nothing is created.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The guarded path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedArtifact {
    fn drop(&mut self) {
        let result = if self.path.is_dir() {
            std::fs::remove_dir_all(&self.path)
        } else if self.path.exists() {
            std::fs::remove_file(&self.path)
        } else {
            return;
        };

        match result {
            Ok(()) => log::debug!("Removed {}", self.path.display()),
            Err(e) => log::warn!("Failed to remove {}: {e}", self.path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_file_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        std::fs::write(&path, b"bytes").unwrap();

        {
            let guard = ScopedArtifact::new(&path);
            assert!(guard.path().exists());
        }

        assert!(!path.exists());
    }

    #[test]
    fn removes_directory_tree_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("extracted");
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::write(root.join("nested").join("layer.shp"), b"x").unwrap();

        drop(ScopedArtifact::new(&root));

        assert!(!root.exists());
    }

    #[test]
    fn missing_path_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        drop(ScopedArtifact::new(dir.path().join("never-created")));
    }
}

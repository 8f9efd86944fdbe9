//! Boundary bundles (`.tgz` of shapefile layers) into a [`BoundarySet`].

use std::path::{Path, PathBuf};

use stop_report_geography::shp::load_layer;
use stop_report_geography_models::BoundarySet;

use crate::UnpackError;
use crate::archive::{extract_tgz, find_shapefiles};
use crate::artifact::ScopedArtifact;

/// Decodes the boundary bundle at `archive_path`.
///
/// Bundles may carry several layers. `layer_hint` selects the first `.shp`
/// whose file stem contains it (case-insensitive); without a hint, or when
/// nothing matches, the first layer in path order is used.
///
/// The archive and the extraction directory are deleted before this
/// returns, whether decoding succeeded or not.
///
/// # Errors
///
/// Returns [`UnpackError`] if the bundle is missing, corrupt, holds no
/// shapefile, or the layer cannot be decoded.
pub fn unpack_boundaries(
    archive_path: &Path,
    layer_hint: Option<&str>,
) -> Result<BoundarySet, UnpackError> {
    let archive = ScopedArtifact::new(archive_path);
    if !archive.path().exists() {
        return Err(UnpackError::ArchiveNotFound(
            archive_path.display().to_string(),
        ));
    }

    let scratch = ScopedArtifact::new(scratch_dir(archive_path));
    extract_tgz(archive.path(), scratch.path())?;

    let layers = find_shapefiles(scratch.path())?;
    log::debug!("{} contains {} layer(s)", archive_path.display(), layers.len());

    let Some(shp) = pick_layer(&layers, layer_hint) else {
        return Err(UnpackError::MissingEntry {
            path: archive_path.display().to_string(),
            expected: ".shp",
        });
    };

    let layer = load_layer(shp)?;
    Ok(layer)
}

fn pick_layer<'a>(layers: &'a [PathBuf], hint: Option<&str>) -> Option<&'a PathBuf> {
    if let Some(hint) = hint {
        let hint = hint.to_ascii_lowercase();
        let matched = layers.iter().find(|path| {
            path.file_stem()
                .is_some_and(|stem| stem.to_string_lossy().to_ascii_lowercase().contains(&hint))
        });
        if matched.is_some() {
            return matched;
        }
        log::warn!("No layer matches {hint:?}; using the first one");
    }
    layers.first()
}

fn scratch_dir(archive_path: &Path) -> PathBuf {
    let name = archive_path
        .file_name()
        .map_or_else(|| "boundaries".to_string(), |n| n.to_string_lossy().into_owned());
    archive_path.with_file_name(format!("{name}.extracted"))
}

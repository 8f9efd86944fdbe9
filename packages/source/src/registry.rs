//! Dataset registry: every dataset definition, from embedded TOML.
//!
//! Each `.toml` file in `packages/source/sources/` is baked into the binary
//! at compile time via [`include_str!`].

use crate::source_def::{DatasetDefinition, parse_dataset_toml};

/// TOML configs embedded at compile time, in report order.
const DATASET_TOMLS: &[(&str, &str)] = &[
    ("hartford", include_str!("../sources/hartford.toml")),
    ("owensboro", include_str!("../sources/owensboro.toml")),
];

/// Returns all configured dataset definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so
/// this is caught by the registry tests).
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_dataset_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up a dataset definition by id.
#[must_use]
pub fn dataset(id: &str) -> Option<DatasetDefinition> {
    all_datasets().into_iter().find(|d| d.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_datasets() {
        assert_eq!(all_datasets().len(), DATASET_TOMLS.len());
    }

    #[test]
    fn ids_match_file_names() {
        for ((name, _), def) in DATASET_TOMLS.iter().zip(all_datasets()) {
            assert_eq!(*name, def.id);
        }
    }

    #[test]
    fn all_datasets_have_urls() {
        for def in &all_datasets() {
            assert!(def.stops.url.starts_with("https://"), "{}: stops url", def.id);
            assert!(
                def.boundaries.url.ends_with(".tgz"),
                "{}: boundaries must be a tgz bundle",
                def.id
            );
        }
    }

    #[test]
    fn boundary_labels_name_a_field() {
        for def in &all_datasets() {
            assert!(def.boundaries.label_field.is_some(), "{}: label_field", def.id);
        }
    }

    #[test]
    fn finds_dataset_by_id() {
        assert_eq!(dataset("owensboro").map(|d| d.state), Some("KY".to_string()));
        assert!(dataset("gotham").is_none());
    }
}

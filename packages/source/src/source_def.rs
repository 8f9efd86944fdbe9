//! Config-driven dataset definition.
//!
//! [`DatasetDefinition`] captures where a city's stop file and boundary
//! bundle live and how they are packaged. The report code is identical for
//! every city; only these definitions differ.

use serde::Deserialize;

/// A complete dataset definition for one city.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetDefinition {
    /// Unique identifier (e.g., `"hartford"`).
    pub id: String,
    /// Human-readable agency name.
    pub name: String,
    /// City name used in titles.
    pub city: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Where the stop records come from.
    pub stops: StopsConfig,
    /// Where the boundary shapefile bundle comes from.
    pub boundaries: BoundariesConfig,
    /// Attribution shown in table footers and chart captions.
    pub attribution: Attribution,
}

impl DatasetDefinition {
    /// Returns `"City, ST"`.
    #[must_use]
    pub fn place_name(&self) -> String {
        format!("{}, {}", self.city, self.state)
    }

    /// File name the stop archive is downloaded to.
    #[must_use]
    pub fn stops_file_name(&self) -> String {
        format!("{}_stops.{}", self.id, self.stops.archive.extension())
    }

    /// File name the boundary bundle is downloaded to.
    #[must_use]
    pub fn boundaries_file_name(&self) -> String {
        format!("{}_boundaries.tgz", self.id)
    }
}

/// Location and packaging of the stop CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct StopsConfig {
    /// Download URL.
    pub url: String,
    /// How the CSV is packaged.
    pub archive: CsvArchive,
}

/// Packaging of a downloaded CSV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvArchive {
    /// Uncompressed `.csv`.
    Plain,
    /// Single gzip-compressed `.csv.gz`.
    Gzip,
    /// `.zip` holding one `.csv` entry.
    Zip,
}

impl CsvArchive {
    /// File extension used when saving the download.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Plain => "csv",
            Self::Gzip => "csv.gz",
            Self::Zip => "csv.zip",
        }
    }
}

/// Location of the boundary shapefile bundle (`.tgz`).
#[derive(Debug, Clone, Deserialize)]
pub struct BoundariesConfig {
    /// Download URL.
    pub url: String,
    /// What the polygons represent (e.g., `"neighborhoods"`).
    pub description: String,
    /// Substring of the `.shp` file stem to load when the bundle carries
    /// several layers. The first layer in name order is used otherwise.
    #[serde(default)]
    pub layer: Option<String>,
    /// Attribute holding each polygon's display name. The first text
    /// attribute is used otherwise.
    #[serde(default)]
    pub label_field: Option<String>,
}

/// Data attribution.
#[derive(Debug, Clone, Deserialize)]
pub struct Attribution {
    /// Verbatim attribution text.
    pub text: String,
    /// Landing page for the data provider.
    #[serde(default)]
    pub url: Option<String>,
}

impl Attribution {
    /// Footer line used under tables and charts.
    #[must_use]
    pub fn source_note(&self) -> String {
        format!("Source: {}", self.text)
    }
}

/// Parses a TOML string into a [`DatasetDefinition`].
///
/// # Errors
///
/// Returns an error string if the TOML is malformed or missing required
/// fields.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetDefinition, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}

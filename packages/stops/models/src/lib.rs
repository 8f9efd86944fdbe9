#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Subject demographic taxonomy and stop column names.
//!
//! The Open Policing Project publishes every city in one standardized
//! schema. This crate names the columns the report reads and defines the
//! canonical race/sex categories used for grouping and row ordering.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Standardized column names shared by every Open Policing stop file.
pub mod columns {
    /// Stop date (`DATE`).
    pub const DATE: &str = "date";
    /// Latitude in decimal degrees.
    pub const LAT: &str = "lat";
    /// Longitude in decimal degrees.
    pub const LNG: &str = "lng";
    /// Police district name.
    pub const DISTRICT: &str = "district";
    /// Subject age in years.
    pub const SUBJECT_AGE: &str = "subject_age";
    /// Subject race (standardized lowercase values).
    pub const SUBJECT_RACE: &str = "subject_race";
    /// Subject sex (`male` / `female`).
    pub const SUBJECT_SEX: &str = "subject_sex";
    /// Whether the stop ended in an arrest.
    pub const ARREST_MADE: &str = "arrest_made";
}

/// Race of the stopped subject, in report priority order.
///
/// The derived `Ord` follows declaration order, which is the row order used
/// by every rendered table: the explicit catch-all sorts last.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum SubjectRace {
    /// `white`
    #[strum(to_string = "white")]
    White,
    /// `black`
    #[strum(to_string = "black")]
    Black,
    /// `hispanic`
    #[strum(to_string = "hispanic")]
    Hispanic,
    /// `asian/pacific islander`
    #[strum(to_string = "asian/pacific islander")]
    AsianPacificIslander,
    /// `other`, `unknown`, `other/unknown`, or missing.
    #[strum(to_string = "other/unknown", serialize = "other", serialize = "unknown")]
    OtherUnknown,
}

impl SubjectRace {
    /// Maps a raw column value onto the taxonomy.
    ///
    /// Absent and unrecognized values fold into [`Self::OtherUnknown`].
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse().ok())
            .unwrap_or(Self::OtherUnknown)
    }

    /// Human-readable label used in table rows and legends.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
            Self::Hispanic => "Hispanic",
            Self::AsianPacificIslander => "Asian/Pacific Islander",
            Self::OtherUnknown => "Other/Unknown",
        }
    }

    /// Returns all variants in priority order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::White,
            Self::Black,
            Self::Hispanic,
            Self::AsianPacificIslander,
            Self::OtherUnknown,
        ]
    }
}

/// Sex of the stopped subject.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SubjectSex {
    /// `female`
    Female,
    /// `male`
    Male,
    /// Missing or unrecognized.
    Unknown,
}

impl SubjectSex {
    /// Maps a raw column value onto the taxonomy.
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse().ok())
            .unwrap_or(Self::Unknown)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
            Self::Unknown => "Unknown",
        }
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Boundary polygons, coordinate reference systems and tagged points.
//!
//! A [`BoundarySet`] is the decoded form of one shapefile layer: polygons,
//! their attribute rows, and the CRS declared by the bundle. Stop locations
//! are overlaid on it as [`TaggedPoints`], which carry the CRS their
//! coordinates were recorded in.

use std::collections::BTreeMap;

use geo::{BoundingRect as _, Coord, MultiPolygon, Rect};

/// Coordinate reference system of a boundary layer or a point set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crs {
    /// WGS 84 geographic coordinates (EPSG:4326).
    Wgs84,
    /// NAD83 geographic coordinates (EPSG:4269).
    Nad83,
    /// Some other geographic (degree-based) system.
    Geographic {
        /// Name from the WKT definition.
        name: String,
    },
    /// A projected (planar) system.
    Projected {
        /// Name from the WKT definition.
        name: String,
    },
    /// No `.prj` file, or one that could not be read.
    Unknown,
}

impl Crs {
    /// EPSG code, where one is known.
    #[must_use]
    pub const fn epsg(&self) -> Option<u32> {
        match self {
            Self::Wgs84 => Some(4326),
            Self::Nad83 => Some(4269),
            _ => None,
        }
    }

    /// Whether coordinates are longitude/latitude degrees.
    #[must_use]
    pub const fn is_geographic(&self) -> bool {
        matches!(self, Self::Wgs84 | Self::Nad83 | Self::Geographic { .. })
    }

    /// Whether coordinates in `self` and `other` can share one map.
    ///
    /// WGS 84 and NAD83 differ by about a meter, so they are treated as
    /// interchangeable. An unknown CRS is assumed to match.
    #[must_use]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Wgs84 | Self::Nad83, Self::Wgs84 | Self::Nad83)
            | (Self::Unknown, _)
            | (_, Self::Unknown) => true,
            _ => self == other,
        }
    }

    /// Short label for logs and captions.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Wgs84 => "WGS 84 (EPSG:4326)".to_string(),
            Self::Nad83 => "NAD83 (EPSG:4269)".to_string(),
            Self::Geographic { name } | Self::Projected { name } => name.clone(),
            Self::Unknown => "unknown CRS".to_string(),
        }
    }
}

/// A single attribute value from a shapefile's `.dbf` table.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Character field.
    Text(String),
    /// Any numeric field.
    Number(f64),
    /// Logical field.
    Bool(bool),
    /// Date field, as `YYYY-MM-DD`.
    Date(String),
    /// Empty field.
    Null,
}

impl AttributeValue {
    /// The value as display text, if it is not null.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) | Self::Date(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Null => None,
        }
    }
}

/// One polygon feature with its attribute row.
#[derive(Debug, Clone)]
pub struct Boundary {
    /// Attribute columns keyed by field name.
    pub attributes: BTreeMap<String, AttributeValue>,
    /// Polygon geometry (single polygons are stored as one-element
    /// multipolygons).
    pub geometry: MultiPolygon<f64>,
}

impl Boundary {
    /// Display name: the `field` attribute if the layer has it (matched
    /// case-insensitively), else the first non-empty text attribute by
    /// field name.
    #[must_use]
    pub fn label(&self, field: Option<&str>) -> Option<String> {
        if let Some(field) = field
            && let Some((_, value)) = self
                .attributes
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(field))
        {
            return value.as_text();
        }
        self.attributes.values().find_map(|value| match value {
            AttributeValue::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
    }
}

/// A decoded boundary layer.
#[derive(Debug, Clone)]
pub struct BoundarySet {
    /// Layer name (the `.shp` file stem).
    pub name: String,
    /// Declared CRS.
    pub crs: Crs,
    /// Polygon features.
    pub boundaries: Vec<Boundary>,
}

impl BoundarySet {
    /// Bounding rectangle of every polygon in the layer.
    #[must_use]
    pub fn extent(&self) -> Option<Rect<f64>> {
        self.boundaries
            .iter()
            .filter_map(|boundary| boundary.geometry.bounding_rect())
            .reduce(union_rect)
    }

    /// Number of polygon features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    /// Whether the layer has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }
}

/// One stop location.
#[derive(Debug, Clone, PartialEq)]
pub struct StopPoint {
    /// Longitude (x).
    pub lng: f64,
    /// Latitude (y).
    pub lat: f64,
    /// Category used for coloring or animation states.
    pub category: Option<String>,
}

/// Stop locations tagged with the CRS they are interpreted under.
#[derive(Debug, Clone)]
pub struct TaggedPoints {
    /// CRS of the coordinates.
    pub crs: Crs,
    /// The points.
    pub points: Vec<StopPoint>,
}

impl TaggedPoints {
    /// Tags `points` as WGS 84 longitude/latitude, the CRS stop records are
    /// published in.
    #[must_use]
    pub const fn wgs84(points: Vec<StopPoint>) -> Self {
        Self {
            crs: Crs::Wgs84,
            points,
        }
    }
}

/// Smallest rectangle covering both inputs.
#[must_use]
pub fn union_rect(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

/// Inclusive containment test for a rectangle.
#[must_use]
pub fn rect_contains(rect: &Rect<f64>, x: f64, y: f64) -> bool {
    x >= rect.min().x && x <= rect.max().x && y >= rect.min().y && y <= rect.max().y
}

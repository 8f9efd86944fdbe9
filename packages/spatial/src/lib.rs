#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for boundary attribution.
//!
//! Builds an R-tree over the polygons of a
//! [`BoundarySet`] and answers point-in-polygon lookups, used to attribute
//! stops to the neighborhood or police zone they happened in.

use geo::{Area as _, BoundingRect as _, Contains as _, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};
use stop_report_geography_models::{BoundarySet, TaggedPoints};

/// A polygon stored in the R-tree, pointing back at its layer position.
struct BoundaryEntry {
    index: usize,
    area: f64,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Point-in-polygon index over one boundary layer.
pub struct BoundaryIndex {
    tree: RTree<BoundaryEntry>,
}

impl std::fmt::Debug for BoundaryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryIndex")
            .field("size", &self.tree.size())
            .finish()
    }
}

impl BoundaryIndex {
    /// Builds the index from every polygon in `layer`.
    #[must_use]
    pub fn build(layer: &BoundarySet) -> Self {
        let entries: Vec<BoundaryEntry> = layer
            .boundaries
            .iter()
            .enumerate()
            .map(|(index, boundary)| BoundaryEntry {
                index,
                area: boundary.geometry.unsigned_area(),
                envelope: compute_envelope(&boundary.geometry),
                polygon: boundary.geometry.clone(),
            })
            .collect();

        let tree = RTree::bulk_load(entries);
        log::debug!("Indexed {} polygons of layer {}", tree.size(), layer.name);

        Self { tree }
    }

    /// Returns the layer position of the polygon containing the point.
    ///
    /// Layers can overlap; the smallest containing polygon wins.
    #[must_use]
    pub fn lookup(&self, lng: f64, lat: f64) -> Option<usize> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.contains(&point))
            .min_by(|a, b| a.area.total_cmp(&b.area))
            .map(|entry| entry.index)
    }

    /// Counts points per polygon. The result has one slot per layer
    /// position, plus the number of points that fell outside every polygon.
    #[must_use]
    pub fn count_points(&self, layer_len: usize, points: &TaggedPoints) -> (Vec<u64>, u64) {
        let mut counts = vec![0u64; layer_len];
        let mut outside = 0u64;

        for point in &points.points {
            match self.lookup(point.lng, point.lat) {
                Some(index) if index < layer_len => counts[index] += 1,
                _ => outside += 1,
            }
        }

        (counts, outside)
    }
}

/// Computes the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use geo::{LineString, Polygon};
    use stop_report_geography_models::{Boundary, Crs, StopPoint};

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Boundary {
        Boundary {
            attributes: BTreeMap::new(),
            geometry: MultiPolygon(vec![Polygon::new(
                LineString::from(vec![
                    (x0, y0),
                    (x0 + size, y0),
                    (x0 + size, y0 + size),
                    (x0, y0 + size),
                    (x0, y0),
                ]),
                vec![],
            )]),
        }
    }

    fn layer() -> BoundarySet {
        BoundarySet {
            name: "zones".to_string(),
            crs: Crs::Wgs84,
            boundaries: vec![square(0.0, 0.0, 10.0), square(2.0, 2.0, 2.0), square(20.0, 0.0, 5.0)],
        }
    }

    #[test]
    fn smallest_containing_polygon_wins() {
        let index = BoundaryIndex::build(&layer());
        assert_eq!(index.lookup(3.0, 3.0), Some(1));
        assert_eq!(index.lookup(8.0, 8.0), Some(0));
        assert_eq!(index.lookup(22.0, 1.0), Some(2));
    }

    #[test]
    fn point_outside_every_polygon() {
        let index = BoundaryIndex::build(&layer());
        assert_eq!(index.lookup(-5.0, -5.0), None);
    }

    #[test]
    fn counts_points_per_polygon() {
        let layer = layer();
        let index = BoundaryIndex::build(&layer);
        let point = |lng, lat| StopPoint {
            lng,
            lat,
            category: None,
        };
        let tagged = TaggedPoints::wgs84(vec![
            point(3.0, 3.0),
            point(8.0, 1.0),
            point(9.0, 9.0),
            point(50.0, 50.0),
        ]);

        let (counts, outside) = index.count_points(layer.len(), &tagged);
        assert_eq!(counts, vec![2, 1, 0]);
        assert_eq!(outside, 1);
    }
}

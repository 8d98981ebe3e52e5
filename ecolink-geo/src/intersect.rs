//! Boundary x region intersection resolution.
//!
//! Pairwise geometric testing is O(B x R), so candidate pairs are first
//! narrowed with an R-tree over boundary bounding boxes; only envelope hits
//! go through the exact `geo::Intersects` predicate. The predicate accepts
//! any shared area or boundary, not containment only.
//!
//! Results are a set of triples, so unioning the four typed subset
//! combinations deduplicates for free and is order-independent.

use crate::geometry::BBox;
use geo::Intersects;
use geo_types::Geometry;
use rstar::{RTree, RTreeObject, AABB};
use rustc_hash::FxHashSet;
use tracing::debug;

/// An administrative boundary shape offered to the engine.
#[derive(Debug, Clone)]
pub struct BoundaryShape {
    /// Resolved external identifier of the boundary.
    pub external_id: String,
    /// Display name of the boundary.
    pub name: String,
    /// Boundary geometry (polygon or multipolygon).
    pub geometry: Geometry<f64>,
}

/// An ecoregion shape offered to the engine.
#[derive(Debug, Clone)]
pub struct RegionShape {
    /// Contextual identifier of the region unit.
    pub key: String,
    /// Region geometry (polygon or multipolygon).
    pub geometry: Geometry<f64>,
}

/// One resolved intersection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntersectionTriple {
    /// External identifier of the intersecting boundary.
    pub boundary_external_id: String,
    /// Name of the intersecting boundary.
    pub boundary_name: String,
    /// Contextual identifier of the region.
    pub region_key: String,
}

/// R-tree entry: boundary index plus its envelope.
struct BoundaryEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for BoundaryEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn aabb_of(bbox: &BBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y])
}

/// Compute the set of intersection triples between two shape collections.
///
/// Empty geometries (no bounding box) never intersect anything and are
/// ignored on both sides.
pub fn intersect_sets(
    boundaries: &[BoundaryShape],
    regions: &[RegionShape],
) -> FxHashSet<IntersectionTriple> {
    let envelopes: Vec<BoundaryEnvelope> = boundaries
        .iter()
        .enumerate()
        .filter_map(|(index, b)| {
            BBox::from_geometry(&b.geometry).map(|bbox| BoundaryEnvelope {
                index,
                envelope: aabb_of(&bbox),
            })
        })
        .collect();
    let tree = RTree::bulk_load(envelopes);

    let mut triples = FxHashSet::default();
    let mut candidate_pairs = 0usize;

    for region in regions {
        let Some(bbox) = BBox::from_geometry(&region.geometry) else {
            continue;
        };
        for hit in tree.locate_in_envelope_intersecting(&aabb_of(&bbox)) {
            candidate_pairs += 1;
            let boundary = &boundaries[hit.index];
            if boundary.geometry.intersects(&region.geometry) {
                triples.insert(IntersectionTriple {
                    boundary_external_id: boundary.external_id.clone(),
                    boundary_name: boundary.name.clone(),
                    region_key: region.key.clone(),
                });
            }
        }
    }

    debug!(
        boundaries = boundaries.len(),
        regions = regions.len(),
        candidate_pairs,
        matches = triples.len(),
        "intersection pass complete"
    );
    triples
}

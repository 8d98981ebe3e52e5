//! Spatial store contract.
//!
//! Intersection resolution runs against a store loaded with typed shape
//! collections. The store contract mirrors a typed-geometry backend:
//! polygon and multipolygon subsets load separately, and intersections
//! are resolved across every subset combination so a pair is found no
//! matter which subset each side landed in.
//!
//! The bundled [`InProcessStore`] evaluates everything in memory with the
//! R-tree engine; a remote store would implement the same trait.

use crate::error::{PipelineError, Result};
use ecolink_geo::{intersect_sets, BoundaryShape, IntersectionTriple, Partitioned, RegionShape};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Backend holding typed shape collections for intersection resolution.
pub trait SpatialStore {
    fn load_boundaries(&mut self, boundaries: Partitioned<BoundaryShape>) -> Result<()>;
    fn load_regions(&mut self, regions: Partitioned<RegionShape>) -> Result<()>;

    /// Resolve all boundary x region intersections across the loaded
    /// collections. Fails unless both sides were loaded first.
    fn intersections(&self) -> Result<FxHashSet<IntersectionTriple>>;
}

/// In-memory store backed by the R-tree intersection engine.
#[derive(Default)]
pub struct InProcessStore {
    boundaries: Option<Partitioned<BoundaryShape>>,
    regions: Option<Partitioned<RegionShape>>,
}

impl InProcessStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpatialStore for InProcessStore {
    fn load_boundaries(&mut self, boundaries: Partitioned<BoundaryShape>) -> Result<()> {
        debug!(
            polygons = boundaries.polygons.len(),
            multi_polygons = boundaries.multi_polygons.len(),
            "loaded boundary collections"
        );
        self.boundaries = Some(boundaries);
        Ok(())
    }

    fn load_regions(&mut self, regions: Partitioned<RegionShape>) -> Result<()> {
        debug!(
            polygons = regions.polygons.len(),
            multi_polygons = regions.multi_polygons.len(),
            "loaded region collections"
        );
        self.regions = Some(regions);
        Ok(())
    }

    fn intersections(&self) -> Result<FxHashSet<IntersectionTriple>> {
        let boundaries = self
            .boundaries
            .as_ref()
            .ok_or_else(|| PipelineError::Store("boundaries not loaded".into()))?;
        let regions = self
            .regions
            .as_ref()
            .ok_or_else(|| PipelineError::Store("regions not loaded".into()))?;

        let mut triples = FxHashSet::default();
        for boundary_subset in [&boundaries.polygons, &boundaries.multi_polygons] {
            for region_subset in [&regions.polygons, &regions.multi_polygons] {
                triples.extend(intersect_sets(boundary_subset, region_subset));
            }
        }
        Ok(triples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecolink_geo::{parse_wkt, partition_by_kind};

    fn boundary(id: &str, name: &str, wkt: &str) -> BoundaryShape {
        BoundaryShape {
            external_id: id.to_string(),
            name: name.to_string(),
            geometry: parse_wkt(wkt).unwrap(),
        }
    }

    fn region(key: &str, wkt: &str) -> RegionShape {
        RegionShape {
            key: key.to_string(),
            geometry: parse_wkt(wkt).unwrap(),
        }
    }

    #[test]
    fn test_intersections_require_both_loads() {
        let store = InProcessStore::new();
        assert!(matches!(
            store.intersections().unwrap_err(),
            PipelineError::Store(_)
        ));

        let mut store = InProcessStore::new();
        store
            .load_boundaries(partition_by_kind(vec![], |b: &BoundaryShape| &b.geometry))
            .unwrap();
        assert!(matches!(
            store.intersections().unwrap_err(),
            PipelineError::Store(_)
        ));
    }

    #[test]
    fn test_pairs_found_across_subset_combinations() {
        // One polygon boundary, one multipolygon boundary; likewise for
        // regions. All four shapes overlap around the origin.
        let boundaries = vec![
            boundary("Q1", "Poly", "POLYGON((0 0, 4 0, 4 4, 0 4, 0 0))"),
            boundary(
                "Q2",
                "Multi",
                "MULTIPOLYGON(((1 1, 3 1, 3 3, 1 3, 1 1)), ((50 50, 51 50, 51 51, 50 51, 50 50)))",
            ),
        ];
        let regions = vec![
            region("R:poly", "POLYGON((2 2, 5 2, 5 5, 2 5, 2 2))"),
            region(
                "R:multi",
                "MULTIPOLYGON(((0 0, 2 0, 2 2, 0 2, 0 0)), ((80 80, 81 80, 81 81, 80 81, 80 80)))",
            ),
        ];

        let mut store = InProcessStore::new();
        store
            .load_boundaries(partition_by_kind(boundaries, |b| &b.geometry))
            .unwrap();
        store
            .load_regions(partition_by_kind(regions, |r| &r.geometry))
            .unwrap();

        let triples = store.intersections().unwrap();
        let pairs: FxHashSet<(String, String)> = triples
            .into_iter()
            .map(|t| (t.boundary_external_id, t.region_key))
            .collect();
        assert!(pairs.contains(&("Q1".into(), "R:poly".into())));
        assert!(pairs.contains(&("Q1".into(), "R:multi".into())));
        assert!(pairs.contains(&("Q2".into(), "R:poly".into())));
        assert!(pairs.contains(&("Q2".into(), "R:multi".into())));
        assert_eq!(pairs.len(), 4);
    }
}

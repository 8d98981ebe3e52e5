//! Dissolve-by-key aggregation.
//!
//! Groups input geometries by a contextual key and merges each group into a
//! single unioned shape (geometric union, not concatenation: abutting
//! fragments collapse into one outline). One output group per key, with a
//! representative point taken as the centroid of the dissolved shape. The
//! centroid is not corrected to point-on-surface for non-convex shapes.
//!
//! Dissolving an already-dissolved collection is a no-op: a single-row
//! group is normalized but never re-unioned, so output geometry is stable.

use crate::error::{GeoError, Result};
use crate::geometry::GeometryKind;
use geo::{BooleanOps, Centroid};
use geo_types::{Geometry, MultiPolygon};
use rustc_hash::FxHashMap;
use tracing::warn;

/// One dissolved group.
#[derive(Debug, Clone)]
pub struct DissolvedGroup {
    /// Grouping key.
    pub key: String,
    /// Unioned geometry: `Polygon` when the union has one outer ring,
    /// `MultiPolygon` otherwise.
    pub geometry: Geometry<f64>,
    /// Centroid (x, y) of the dissolved shape.
    pub centroid: (f64, f64),
    /// Index (into the input) of the group's first row, for attribute
    /// recovery by the caller.
    pub first_index: usize,
    /// Number of input rows merged into this group.
    pub merged_rows: usize,
}

/// Outcome of a dissolve pass.
#[derive(Debug)]
pub struct DissolveResult {
    /// Dissolved groups, ordered by first occurrence of their key.
    pub groups: Vec<DissolvedGroup>,
    /// Input rows skipped because their geometry was not areal.
    pub skipped_rows: usize,
}

/// Dissolve keyed geometries into one unioned shape per key.
///
/// Non-areal rows (points, lines) are skipped with a warning and counted;
/// a key whose rows are all non-areal produces no group. Output order is
/// first-occurrence order of keys, so repeated passes are stable.
pub fn dissolve_by_key(items: Vec<(String, Geometry<f64>)>) -> Result<DissolveResult> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: FxHashMap<String, Vec<(usize, MultiPolygon<f64>)>> = FxHashMap::default();
    let mut skipped_rows = 0usize;

    for (index, (key, geom)) in items.into_iter().enumerate() {
        let multi = match geom {
            Geometry::Polygon(p) => MultiPolygon(vec![p]),
            Geometry::MultiPolygon(mp) => mp,
            other => {
                warn!(
                    key = %key,
                    kind = ?GeometryKind::of(&other),
                    "skipping non-areal geometry during dissolve"
                );
                skipped_rows += 1;
                continue;
            }
        };
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push((index, multi));
    }

    let mut result = Vec::with_capacity(order.len());
    for key in order {
        let members = groups.remove(&key).expect("key registered with group");
        let first_index = members[0].0;
        let merged_rows = members.len();

        let mut iter = members.into_iter().map(|(_, mp)| mp);
        let first = iter.next().expect("group is non-empty");
        let unioned = iter.fold(first, |acc, mp| acc.union(&mp));

        let geometry = normalize_multi(unioned);
        let centroid = geometry
            .centroid()
            .map(|c| (c.x(), c.y()))
            .ok_or_else(|| {
                GeoError::InvalidGeometry(format!("dissolved group {} has no centroid", key))
            })?;

        result.push(DissolvedGroup {
            key,
            geometry,
            centroid,
            first_index,
            merged_rows,
        });
    }

    Ok(DissolveResult {
        groups: result,
        skipped_rows,
    })
}

/// Collapse a single-member multipolygon back to a polygon.
fn normalize_multi(mp: MultiPolygon<f64>) -> Geometry<f64> {
    if mp.0.len() == 1 {
        Geometry::Polygon(mp.0.into_iter().next().expect("length checked"))
    } else {
        Geometry::MultiPolygon(mp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::parse_wkt;

    fn poly(wkt: &str) -> Geometry<f64> {
        parse_wkt(wkt).unwrap()
    }

    #[test]
    fn test_three_disjoint_polygons_one_key() {
        let items = vec![
            (
                "US_L3CODE:7".to_string(),
                poly("POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))"),
            ),
            (
                "US_L3CODE:7".to_string(),
                poly("POLYGON((5 5, 6 5, 6 6, 5 6, 5 5))"),
            ),
            (
                "US_L3CODE:7".to_string(),
                poly("POLYGON((10 0, 11 0, 11 1, 10 1, 10 0))"),
            ),
        ];

        let out = dissolve_by_key(items).unwrap();
        assert_eq!(out.groups.len(), 1);
        assert_eq!(out.skipped_rows, 0);

        let group = &out.groups[0];
        assert_eq!(group.key, "US_L3CODE:7");
        assert_eq!(group.merged_rows, 3);
        match &group.geometry {
            Geometry::MultiPolygon(mp) => assert_eq!(mp.0.len(), 3),
            other => panic!("expected multipolygon, got {:?}", other),
        }
        // Centroid of three equal unit squares at (0.5,0.5) (5.5,5.5) (10.5,0.5).
        let (cx, cy) = group.centroid;
        assert!((cx - 5.5).abs() < 1e-9, "cx = {}", cx);
        assert!((cy - 2.166_666_666_666_667).abs() < 1e-9, "cy = {}", cy);
    }

    #[test]
    fn test_abutting_fragments_merge() {
        let items = vec![
            ("K:1".to_string(), poly("POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))")),
            ("K:1".to_string(), poly("POLYGON((1 0, 2 0, 2 1, 1 1, 1 0))")),
        ];

        let out = dissolve_by_key(items).unwrap();
        assert_eq!(out.groups.len(), 1);
        // Two abutting squares dissolve into a single 2x1 outline.
        assert!(matches!(out.groups[0].geometry, Geometry::Polygon(_)));
        let (cx, cy) = out.groups[0].centroid;
        assert!((cx - 1.0).abs() < 1e-9);
        assert!((cy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_keys_unique_after_dissolve() {
        let items = vec![
            ("A".to_string(), poly("POLYGON((0 0, 1 0, 1 1, 0 0))")),
            ("B".to_string(), poly("POLYGON((3 3, 4 3, 4 4, 3 3))")),
            ("A".to_string(), poly("POLYGON((5 5, 6 5, 6 6, 5 5))")),
            ("B".to_string(), poly("POLYGON((8 8, 9 8, 9 9, 8 8))")),
        ];

        let out = dissolve_by_key(items).unwrap();
        let mut keys: Vec<&str> = out.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B"]);
        keys.dedup();
        assert_eq!(keys.len(), out.groups.len());
    }

    #[test]
    fn test_dissolve_idempotent() {
        let items = vec![
            ("A".to_string(), poly("POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))")),
            ("A".to_string(), poly("POLYGON((5 5, 6 5, 6 6, 5 6, 5 5))")),
            ("B".to_string(), poly("POLYGON((9 9, 10 9, 10 10, 9 10, 9 9))")),
        ];

        let once = dissolve_by_key(items).unwrap();
        let again = dissolve_by_key(
            once.groups
                .iter()
                .map(|g| (g.key.clone(), g.geometry.clone()))
                .collect(),
        )
        .unwrap();

        assert_eq!(once.groups.len(), again.groups.len());
        for (a, b) in once.groups.iter().zip(again.groups.iter()) {
            assert_eq!(a.key, b.key);
            assert_eq!(a.geometry, b.geometry);
            assert_eq!(a.centroid, b.centroid);
        }
    }

    #[test]
    fn test_non_areal_rows_skipped() {
        let items = vec![
            ("A".to_string(), poly("POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))")),
            ("A".to_string(), poly("POINT(0.5 0.5)")),
            ("B".to_string(), poly("LINESTRING(0 0, 1 1)")),
        ];

        let out = dissolve_by_key(items).unwrap();
        assert_eq!(out.skipped_rows, 2);
        // Key B had only a non-areal row, so it yields no group.
        assert_eq!(out.groups.len(), 1);
        assert_eq!(out.groups[0].key, "A");
        assert_eq!(out.groups[0].merged_rows, 1);
    }
}

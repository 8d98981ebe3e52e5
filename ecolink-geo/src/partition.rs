//! Geometry-type partitioning.
//!
//! Downstream typed storage requires geometry-type-homogeneous collections,
//! so a mixed collection is split into a single-polygon subset and a
//! multi-polygon subset. Attributes ride along untouched; only the geometry
//! type decides the destination.
//!
//! Rows of any other geometry type (points, lines) are dropped with a
//! warning. The source system had no documented fallback for these either;
//! the count is surfaced so the gap is auditable rather than silent.

use crate::geometry::GeometryKind;
use geo_types::Geometry;
use tracing::warn;

/// A collection split by geometry type.
#[derive(Debug, Clone)]
pub struct Partitioned<T> {
    /// Rows whose geometry is a single polygon.
    pub polygons: Vec<T>,
    /// Rows whose geometry is a multi-polygon.
    pub multi_polygons: Vec<T>,
    /// Rows dropped because their geometry was neither.
    pub skipped_rows: usize,
}

impl<T> Partitioned<T> {
    /// Total rows retained across both subsets.
    pub fn retained(&self) -> usize {
        self.polygons.len() + self.multi_polygons.len()
    }
}

/// Split a collection into polygon and multipolygon subsets.
///
/// `geometry` projects each row to its geometry. Every areal row lands in
/// exactly one subset; non-areal rows are dropped with a warning.
pub fn partition_by_kind<T, F>(items: Vec<T>, geometry: F) -> Partitioned<T>
where
    F: Fn(&T) -> &Geometry<f64>,
{
    let mut polygons = Vec::new();
    let mut multi_polygons = Vec::new();
    let mut skipped_rows = 0usize;

    for item in items {
        let kind = GeometryKind::of(geometry(&item));
        if !kind.is_areal() {
            warn!(?kind, "dropping row with unsupported geometry type");
            skipped_rows += 1;
            continue;
        }
        if kind == GeometryKind::Polygon {
            polygons.push(item);
        } else {
            multi_polygons.push(item);
        }
    }

    Partitioned {
        polygons,
        multi_polygons,
        skipped_rows,
    }
}

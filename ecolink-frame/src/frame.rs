//! Columnar feature frames.
//!
//! A [`FeatureFrame`] stores attribute data in per-column vectors alongside
//! one geometry per row and a CRS tag for the whole collection. Attribute
//! cells are nullable text: the attribute tables behind shapefile dumps
//! carry codes, names and abbreviations, and every consumer downstream
//! wants them as strings.
//!
//! # Design
//!
//! - **Columnar storage**: attribute data is one `Vec` per column, not per-row
//! - **Name canonical**: columns are addressed by name through the schema
//! - **Uniform rows**: every column and the geometry vector share one length

use std::sync::Arc;

use crate::error::{FrameError, Result};
use ecolink_geo::{reproject_geometry, Crs};
use geo_types::Geometry;
use rustc_hash::FxHashMap;

/// Schema for a feature frame: ordered column names with index lookup.
#[derive(Debug, Clone)]
pub struct FrameSchema {
    names: Vec<String>,
    name_to_index: FxHashMap<String, usize>,
}

impl FrameSchema {
    /// Create a schema from column names. Duplicate names are rejected.
    pub fn new(names: Vec<String>) -> Result<Self> {
        let mut name_to_index = FxHashMap::default();
        for (i, name) in names.iter().enumerate() {
            if name_to_index.insert(name.clone(), i).is_some() {
                return Err(FrameError::Schema(format!("duplicate column '{}'", name)));
            }
        }
        Ok(Self {
            names,
            name_to_index,
        })
    }

    /// Get column index by name.
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Column names in schema order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of attribute columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the schema has no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl PartialEq for FrameSchema {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

/// A raw source table: attribute cells as text plus geometry as WKT,
/// exactly as handed over by the source retrieval collaborator.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Attribute column names.
    pub columns: Vec<String>,
    /// Attribute rows; each row has one cell per column.
    pub rows: Vec<Vec<Option<String>>>,
    /// WKT geometry text, one entry per row.
    pub geometry_wkt: Vec<String>,
    /// Native spatial reference of the source.
    pub crs: Crs,
}

impl RawTable {
    /// Create a raw table, validating row shape.
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
        geometry_wkt: Vec<String>,
        crs: Crs,
    ) -> Result<Self> {
        if rows.len() != geometry_wkt.len() {
            return Err(FrameError::Schema(format!(
                "row count mismatch: {} attribute rows, {} geometries",
                rows.len(),
                geometry_wkt.len()
            )));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(FrameError::Schema(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self {
            columns,
            rows,
            geometry_wkt,
            crs,
        })
    }

    /// Index of an attribute column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Columnar feature collection in a known spatial reference.
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    schema: Arc<FrameSchema>,
    columns: Vec<Vec<Option<String>>>,
    geometry: Vec<Geometry<f64>>,
    crs: Crs,
}

impl FeatureFrame {
    /// Create a frame, validating column counts and row lengths.
    pub fn new(
        schema: Arc<FrameSchema>,
        columns: Vec<Vec<Option<String>>>,
        geometry: Vec<Geometry<f64>>,
        crs: Crs,
    ) -> Result<Self> {
        if columns.len() != schema.len() {
            return Err(FrameError::Schema(format!(
                "column count mismatch: schema has {} columns, got {}",
                schema.len(),
                columns.len()
            )));
        }
        for (i, col) in columns.iter().enumerate() {
            if col.len() != geometry.len() {
                return Err(FrameError::Schema(format!(
                    "column '{}' has {} rows, expected {}",
                    schema.names()[i],
                    col.len(),
                    geometry.len()
                )));
            }
        }
        Ok(Self {
            schema,
            columns,
            geometry,
            crs,
        })
    }

    /// Frame schema.
    pub fn schema(&self) -> &Arc<FrameSchema> {
        &self.schema
    }

    /// Spatial reference of the collection.
    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Number of rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.geometry.len()
    }

    /// Check if the frame has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    /// Get a whole attribute column by name.
    pub fn column(&self, name: &str) -> Option<&[Option<String>]> {
        self.schema
            .index_of(name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Get a single attribute cell.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        self.column(column)
            .and_then(|col| col.get(row))
            .and_then(|cell| cell.as_deref())
    }

    /// Get geometry at a row.
    pub fn geometry(&self, row: usize) -> Option<&Geometry<f64>> {
        self.geometry.get(row)
    }

    /// All geometries in row order.
    pub fn geometries(&self) -> &[Geometry<f64>] {
        &self.geometry
    }

    /// Reproject every geometry into the target reference.
    ///
    /// Fails with `UnknownProjection` when the frame's reference is
    /// [`Crs::Unknown`].
    pub fn to_crs(&self, target: Crs) -> Result<Self> {
        if self.crs == target {
            return Ok(self.clone());
        }
        let geometry = self
            .geometry
            .iter()
            .map(|g| reproject_geometry(g, self.crs, target))
            .collect::<ecolink_geo::Result<Vec<_>>>()?;
        Ok(Self {
            schema: Arc::clone(&self.schema),
            columns: self.columns.clone(),
            geometry,
            crs: target,
        })
    }

    /// Concatenate frames sharing one schema and reference into one.
    ///
    /// All rows are preserved in input order; no deduplication happens
    /// here.
    pub fn concat(frames: Vec<FeatureFrame>) -> Result<FeatureFrame> {
        let mut iter = frames.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| FrameError::Combine("nothing to combine".into()))?;

        let mut columns = first.columns;
        let mut geometry = first.geometry;
        for frame in iter {
            if *frame.schema != *first.schema {
                return Err(FrameError::Combine(format!(
                    "schema mismatch: {:?} vs {:?}",
                    frame.schema.names(),
                    first.schema.names()
                )));
            }
            if frame.crs != first.crs {
                return Err(FrameError::Combine(
                    "all frames must share one spatial reference".into(),
                ));
            }
            for (dst, src) in columns.iter_mut().zip(frame.columns) {
                dst.extend(src);
            }
            geometry.extend(frame.geometry);
        }

        Ok(FeatureFrame {
            schema: first.schema,
            columns,
            geometry,
            crs: first.crs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecolink_geo::parse_wkt;

    fn schema(names: &[&str]) -> Arc<FrameSchema> {
        Arc::new(FrameSchema::new(names.iter().map(|s| s.to_string()).collect()).unwrap())
    }

    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(|s| s.to_string())).collect()
    }

    fn square(offset: f64) -> Geometry<f64> {
        parse_wkt(&format!(
            "POLYGON(({o} {o}, {x} {o}, {x} {x}, {o} {x}, {o} {o}))",
            o = offset,
            x = offset + 1.0
        ))
        .unwrap()
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let err = FrameSchema::new(vec!["a".into(), "a".into()]).unwrap_err();
        assert!(matches!(err, FrameError::Schema(_)));
    }

    #[test]
    fn test_frame_access() {
        let frame = FeatureFrame::new(
            schema(&["name", "code"]),
            vec![
                cells(&[Some("Alpha"), Some("Beta")]),
                cells(&[Some("01"), None]),
            ],
            vec![square(0.0), square(5.0)],
            Crs::Geographic,
        )
        .unwrap();

        assert_eq!(frame.num_rows(), 2);
        assert_eq!(frame.value(0, "name"), Some("Alpha"));
        assert_eq!(frame.value(1, "code"), None);
        assert_eq!(frame.value(0, "missing"), None);
    }

    #[test]
    fn test_ragged_column_rejected() {
        let err = FeatureFrame::new(
            schema(&["name"]),
            vec![cells(&[Some("only one")])],
            vec![square(0.0), square(1.0)],
            Crs::Geographic,
        )
        .unwrap_err();
        assert!(matches!(err, FrameError::Schema(_)));
    }

    #[test]
    fn test_concat_preserves_all_rows_in_order() {
        let s = schema(&["name"]);
        let a = FeatureFrame::new(
            Arc::clone(&s),
            vec![cells(&[Some("a1"), Some("a2")])],
            vec![square(0.0), square(1.0)],
            Crs::Geographic,
        )
        .unwrap();
        let b = FeatureFrame::new(
            Arc::clone(&s),
            vec![cells(&[Some("b1")])],
            vec![square(2.0)],
            Crs::Geographic,
        )
        .unwrap();

        let combined = FeatureFrame::concat(vec![a, b]).unwrap();
        assert_eq!(combined.num_rows(), 3);
        assert_eq!(combined.value(0, "name"), Some("a1"));
        assert_eq!(combined.value(2, "name"), Some("b1"));
    }

    #[test]
    fn test_concat_rejects_schema_mismatch() {
        let a = FeatureFrame::new(
            schema(&["name"]),
            vec![cells(&[Some("a")])],
            vec![square(0.0)],
            Crs::Geographic,
        )
        .unwrap();
        let b = FeatureFrame::new(
            schema(&["other"]),
            vec![cells(&[Some("b")])],
            vec![square(1.0)],
            Crs::Geographic,
        )
        .unwrap();

        let err = FeatureFrame::concat(vec![a, b]).unwrap_err();
        assert!(matches!(err, FrameError::Combine(_)));
    }

    #[test]
    fn test_to_crs_unknown_fails() {
        let frame = FeatureFrame::new(
            schema(&["name"]),
            vec![cells(&[Some("a")])],
            vec![square(0.0)],
            Crs::Unknown,
        )
        .unwrap();
        assert!(frame.to_crs(Crs::Geographic).is_err());
    }
}

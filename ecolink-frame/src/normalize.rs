//! Schema normalization.
//!
//! Each source dataset ships its own column vocabulary; a [`NormalizeSpec`]
//! maps it to the common schema by enumerating every retained column as an
//! explicit {source -> target} pair, plus constant columns to inject
//! (country tags, dataset tags, placeholder nulls). The mapping is a typed
//! configuration value built up front, not a runtime string filter: every
//! referenced source column is checked before any row is touched.

use std::sync::Arc;

use crate::error::{FrameError, Result};
use crate::frame::{FeatureFrame, FrameSchema, RawTable};
use ecolink_geo::parse_wkt;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One retained column: source name in the raw table, target name in the
/// common schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub source: String,
    pub target: String,
}

impl ColumnMapping {
    /// Map a source column to a new name.
    pub fn renamed(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Retain a column under its source name.
    pub fn kept(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source: name.clone(),
            target: name,
        }
    }
}

/// Normalization configuration for one source dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizeSpec {
    /// Columns to retain, with renames.
    pub mappings: Vec<ColumnMapping>,
    /// Constant columns to inject; `None` injects an all-null column
    /// (used when one source lacks a field the common schema carries).
    pub inject: Vec<(String, Option<String>)>,
}

impl NormalizeSpec {
    /// Start an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retain `source` as `target`.
    pub fn map(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.mappings.push(ColumnMapping::renamed(source, target));
        self
    }

    /// Retain a column unrenamed.
    pub fn keep(mut self, name: impl Into<String>) -> Self {
        self.mappings.push(ColumnMapping::kept(name));
        self
    }

    /// Inject a constant column.
    pub fn constant(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inject.push((name.into(), Some(value.into())));
        self
    }

    /// Inject an all-null column.
    pub fn null_column(mut self, name: impl Into<String>) -> Self {
        self.inject.push((name.into(), None));
        self
    }

    /// Apply the spec to a raw source table, producing a frame in the
    /// common schema. Any referenced source column that is absent fails
    /// with [`FrameError::SchemaMismatch`]; unparseable WKT is fatal for
    /// the source.
    pub fn apply(&self, source_id: &str, raw: &RawTable) -> Result<FeatureFrame> {
        // Resolve every source column before touching rows.
        let mut source_indices = Vec::with_capacity(self.mappings.len());
        for mapping in &self.mappings {
            let index = raw.column_index(&mapping.source).ok_or_else(|| {
                FrameError::SchemaMismatch {
                    column: mapping.source.clone(),
                    dataset: source_id.to_string(),
                }
            })?;
            source_indices.push(index);
        }

        let mut names: Vec<String> = self.mappings.iter().map(|m| m.target.clone()).collect();
        names.extend(self.inject.iter().map(|(name, _)| name.clone()));
        let schema = Arc::new(FrameSchema::new(names)?);

        let num_rows = raw.num_rows();
        let mut columns: Vec<Vec<Option<String>>> = source_indices
            .iter()
            .map(|&idx| raw.rows.iter().map(|row| row[idx].clone()).collect())
            .collect();
        for (_, value) in &self.inject {
            columns.push(vec![value.clone(); num_rows]);
        }

        let geometry = raw
            .geometry_wkt
            .iter()
            .map(|wkt| parse_wkt(wkt))
            .collect::<ecolink_geo::Result<Vec<_>>>()?;

        debug!(
            source = source_id,
            rows = num_rows,
            columns = schema.len(),
            "normalized source table"
        );
        FeatureFrame::new(schema, columns, geometry, raw.crs)
    }
}

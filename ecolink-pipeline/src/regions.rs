//! Region canonicalization and aggregation.
//!
//! Normalized region frames still speak per-level vocabulary: a `code`
//! column plus whatever ancestor code columns the level retains. This
//! module turns them into level-independent rows keyed by contextual
//! identifier, then dissolves the combined rows into one unit per key.
//!
//! Contextual identifiers are prefixed with the level's code tag, so the
//! same native code at two levels never collides and the combined
//! dissolve can run over all levels at once.

use crate::error::{PipelineError, Result};
use crate::model::{title_case, RegionLevel, RegionRecord};
use ecolink_frame::FeatureFrame;
use ecolink_geo::dissolve_by_key;
use geo_types::Geometry;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

/// One canonicalized region row, pre-dissolve.
#[derive(Debug, Clone)]
pub struct RegionRow {
    pub contextual_identifier: String,
    pub common_name: String,
    pub level: RegionLevel,
    /// `;`-joined ancestor contextual identifiers, top level first.
    pub part_of: Option<String>,
    pub geometry: Geometry<f64>,
}

/// Canonicalize a normalized region frame for one level.
///
/// Every row needs a non-null `code`; a row without one cannot be keyed
/// and fails the source. Display names are title-cased here, once, so
/// every level contributes the same name shape downstream.
pub fn canonicalize(frame: &FeatureFrame, level: RegionLevel) -> Result<Vec<RegionRow>> {
    let mut rows = Vec::with_capacity(frame.num_rows());
    for row in 0..frame.num_rows() {
        let code = frame.value(row, "code").ok_or_else(|| PipelineError::Source {
            dataset: level.as_str().to_string(),
            message: format!("row {} has no region code", row),
        })?;
        let common_name = title_case(frame.value(row, "common_name").unwrap_or(""));
        let part_of = ancestor_chain(frame, row, level);
        let geometry = frame
            .geometry(row)
            .cloned()
            .ok_or_else(|| PipelineError::Source {
                dataset: level.as_str().to_string(),
                message: format!("row {} has no geometry", row),
            })?;

        rows.push(RegionRow {
            contextual_identifier: level.contextual_id(code),
            common_name,
            level,
            part_of,
            geometry,
        });
    }
    debug!(level = level.as_str(), rows = rows.len(), "canonicalized region frame");
    Ok(rows)
}

/// Compose the ancestor chain from the retained ancestor code columns.
/// A missing ancestor cell drops that link with a warning; the chain
/// keeps hierarchy order either way.
fn ancestor_chain(frame: &FeatureFrame, row: usize, level: RegionLevel) -> Option<String> {
    let mut links = Vec::new();
    for tag in level.ancestor_tags() {
        match frame.value(row, tag) {
            Some(code) => links.push(format!("{}:{}", tag, code)),
            None => warn!(
                level = level.as_str(),
                row,
                ancestor = tag,
                "ancestor code missing; link dropped"
            ),
        }
    }
    (!links.is_empty()).then(|| links.join(";"))
}

/// Outcome of the combined dissolve pass.
#[derive(Debug)]
pub struct RegionUnits {
    pub records: Vec<RegionRecord>,
    pub skipped_rows: usize,
}

/// Dissolve canonicalized rows from all levels into one record per
/// contextual identifier. Attributes of a dissolved unit come from the
/// first row carrying its key.
pub fn dissolve_regions(rows: Vec<RegionRow>) -> Result<RegionUnits> {
    let mut attrs: FxHashMap<String, (String, RegionLevel, Option<String>)> =
        FxHashMap::default();
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        attrs
            .entry(row.contextual_identifier.clone())
            .or_insert((row.common_name, row.level, row.part_of));
        items.push((row.contextual_identifier, row.geometry));
    }

    let dissolved = dissolve_by_key(items)?;
    let mut records = Vec::with_capacity(dissolved.groups.len());
    for group in dissolved.groups {
        let (common_name, level, part_of) = attrs
            .remove(&group.key)
            .ok_or_else(|| PipelineError::Source {
                dataset: "regions".to_string(),
                message: format!("dissolved key {} has no attributes", group.key),
            })?;
        records.push(RegionRecord {
            contextual_identifier: group.key,
            common_name,
            source_dataset: level,
            part_of,
            representative_point: group.centroid,
            geometry: group.geometry,
            external_id: None,
        });
    }

    Ok(RegionUnits {
        records,
        skipped_rows: dissolved.skipped_rows,
    })
}

//! Result assembly.
//!
//! The final export is region-centric: one record per dissolved region
//! unit, carrying its identity, its ancestor chain as an ordered
//! sequence, and the administrative boundaries (and their countries) it
//! intersects. Intersection lists are sorted so the export is
//! deterministic regardless of set iteration order.

use crate::error::Result;
use crate::model::{BoundaryRecord, RegionLevel, RegionRecord};
use ecolink_geo::IntersectionTriple;
use ecolink_resolve::ExternalId;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Split a serialized ancestor chain into ordered identifiers.
pub fn split_part_of(chain: Option<&str>) -> Vec<String> {
    match chain {
        Some(s) if !s.is_empty() => s.split(';').map(|p| p.to_string()).collect(),
        _ => Vec::new(),
    }
}

/// Join ordered ancestor identifiers back into the serialized chain.
pub fn join_part_of(identifiers: &[String]) -> Option<String> {
    (!identifiers.is_empty()).then(|| identifiers.join(";"))
}

/// One exported region unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionExport {
    pub contextual_identifier: String,
    pub common_name: String,
    pub source_dataset: RegionLevel,
    /// Ancestor contextual identifiers, top level first.
    pub part_of_identifiers: Vec<String>,
    /// Centroid (x, y) of the dissolved geometry, in geographic
    /// coordinates.
    pub representative_point: (f64, f64),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<ExternalId>,
    /// Resolved boundaries this unit intersects, sorted.
    pub admin_intersects: Vec<ExternalId>,
    /// Countries of those boundaries, sorted and deduplicated.
    pub country_intersects: Vec<ExternalId>,
}

/// Assemble the export from resolved records and intersection triples.
pub fn assemble(
    regions: &[RegionRecord],
    boundaries: &[BoundaryRecord],
    triples: &FxHashSet<IntersectionTriple>,
) -> Vec<RegionExport> {
    // Country lookup by resolved boundary identifier.
    let country_of: FxHashMap<&str, &ExternalId> = boundaries
        .iter()
        .filter_map(|b| {
            match (b.external_id.as_ref(), b.country_external_id.as_ref()) {
                (Some(id), Some(country)) => Some((id.as_str(), country)),
                _ => None,
            }
        })
        .collect();

    let mut by_region: FxHashMap<&str, Vec<&IntersectionTriple>> = FxHashMap::default();
    for triple in triples {
        by_region
            .entry(triple.region_key.as_str())
            .or_default()
            .push(triple);
    }

    regions
        .iter()
        .map(|region| {
            let hits = by_region
                .get(region.contextual_identifier.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let mut admin: Vec<ExternalId> = hits
                .iter()
                .map(|t| ExternalId::new(t.boundary_external_id.clone()))
                .collect();
            admin.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            admin.dedup();

            let mut countries: Vec<ExternalId> = hits
                .iter()
                .filter_map(|t| country_of.get(t.boundary_external_id.as_str()))
                .map(|&c| c.clone())
                .collect();
            countries.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            countries.dedup();

            RegionExport {
                contextual_identifier: region.contextual_identifier.clone(),
                common_name: region.common_name.clone(),
                source_dataset: region.source_dataset,
                part_of_identifiers: split_part_of(region.part_of.as_deref()),
                representative_point: region.representative_point,
                external_id: region.external_id.clone(),
                admin_intersects: admin,
                country_intersects: countries,
            }
        })
        .collect()
}

/// Write the export as pretty-printed JSON.
pub fn write_export<W: Write>(writer: W, export: &[RegionExport]) -> Result<()> {
    serde_json::to_writer_pretty(writer, export)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Country;
    use ecolink_geo::parse_wkt;

    fn region(key: &str, part_of: Option<&str>) -> RegionRecord {
        RegionRecord {
            contextual_identifier: key.to_string(),
            common_name: "Great Plains".to_string(),
            source_dataset: RegionLevel::NaL1,
            part_of: part_of.map(|s| s.to_string()),
            representative_point: (1.0, 2.0),
            geometry: parse_wkt("POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap(),
            external_id: None,
        }
    }

    fn boundary(id: &str, country: Country) -> BoundaryRecord {
        BoundaryRecord {
            name: id.to_string(),
            identifier: None,
            abbreviation: None,
            country,
            geometry: parse_wkt("POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap(),
            external_id: Some(ExternalId::new(id)),
            country_external_id: Some(country.external_id()),
        }
    }

    fn triple(boundary_id: &str, region_key: &str) -> IntersectionTriple {
        IntersectionTriple {
            boundary_external_id: boundary_id.to_string(),
            boundary_name: boundary_id.to_string(),
            region_key: region_key.to_string(),
        }
    }

    #[test]
    fn test_part_of_roundtrip() {
        let chain = Some("NA_L1CODE:9;NA_L2CODE:9.4");
        let ids = split_part_of(chain);
        assert_eq!(ids, vec!["NA_L1CODE:9", "NA_L2CODE:9.4"]);
        assert_eq!(join_part_of(&ids).as_deref(), chain);

        assert!(split_part_of(None).is_empty());
        assert_eq!(join_part_of(&[]), None);
    }

    #[test]
    fn test_assemble_sorts_and_dedups_intersections() {
        let regions = vec![region("NA_L1CODE:9", Some("NA_L1CODE:9"))];
        let boundaries = vec![
            boundary("Q99", Country::Us),
            boundary("Q12", Country::Us),
            boundary("Q2009", Country::Ca),
        ];
        let mut triples = FxHashSet::default();
        triples.insert(triple("Q99", "NA_L1CODE:9"));
        triples.insert(triple("Q12", "NA_L1CODE:9"));
        triples.insert(triple("Q2009", "NA_L1CODE:9"));

        let export = assemble(&regions, &boundaries, &triples);
        assert_eq!(export.len(), 1);
        let admin: Vec<&str> = export[0].admin_intersects.iter().map(|i| i.as_str()).collect();
        assert_eq!(admin, vec!["Q12", "Q2009", "Q99"]);
        // Two US boundaries collapse to one country entry.
        let countries: Vec<&str> = export[0]
            .country_intersects
            .iter()
            .map(|i| i.as_str())
            .collect();
        assert_eq!(countries, vec!["Q16", "Q30"]);
    }

    #[test]
    fn test_region_without_hits_gets_empty_lists() {
        let regions = vec![region("NA_L1CODE:5", None)];
        let export = assemble(&regions, &[], &FxHashSet::default());
        assert!(export[0].admin_intersects.is_empty());
        assert!(export[0].country_intersects.is_empty());
        assert!(export[0].part_of_identifiers.is_empty());
    }

    #[test]
    fn test_export_json_roundtrip() {
        let regions = vec![region("NA_L1CODE:9", Some("NA_L1CODE:9"))];
        let boundaries = vec![boundary("Q99", Country::Us)];
        let mut triples = FxHashSet::default();
        triples.insert(triple("Q99", "NA_L1CODE:9"));

        let export = assemble(&regions, &boundaries, &triples);
        let json = serde_json::to_string(&export).unwrap();
        let back: Vec<RegionExport> = serde_json::from_str(&json).unwrap();
        assert_eq!(export, back);
        assert!(json.contains("\"NA-L1\""));
    }
}

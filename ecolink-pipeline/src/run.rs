//! Pipeline orchestration.
//!
//! One run is a strict stage sequence: ingest and normalize every source,
//! reproject to geographic coordinates, combine, aggregate regions,
//! prefetch the reference cache, resolve identifiers, partition by
//! geometry type, load the spatial store, resolve intersections, and
//! assemble the export. Per-record problems degrade (logged, counted);
//! a source that fails to ingest is skipped and counted while the rest
//! of the run proceeds; a prefetch failure aborts the run.

use std::sync::Arc;

use crate::assemble::{assemble, RegionExport};
use crate::error::{PipelineError, Result};
use crate::model::{BoundaryRecord, Country};
use crate::regions::{canonicalize, dissolve_regions, RegionRow};
use crate::sources::{SourceKind, SourceProvider, SourceSpec};
use crate::store::SpatialStore;
use ecolink_frame::FeatureFrame;
use ecolink_geo::{partition_by_kind, BoundaryShape, Crs, RegionShape};
use ecolink_resolve::{
    KnowledgeBase, ReferenceCache, ReferenceCategory, ResolveRequest, ResolveStrategy, Resolver,
};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{info, warn};

/// Counters surfaced after a run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub sources_ingested: usize,
    /// Sources skipped after a fetch, normalize, reprojection, or
    /// canonicalization failure.
    pub sources_failed: usize,
    pub boundary_rows: usize,
    pub region_rows: usize,
    /// Dissolved region units (one per contextual identifier).
    pub region_units: usize,
    pub dissolve_skipped_rows: usize,
    pub boundaries_resolved: usize,
    pub boundaries_unresolved: usize,
    pub regions_resolved: usize,
    pub regions_unresolved: usize,
    pub partition_skipped_rows: usize,
    pub intersection_pairs: usize,
}

/// Output of a run: the export plus its counters.
#[derive(Debug)]
pub struct RunOutput {
    pub export: Vec<RegionExport>,
    pub summary: RunSummary,
}

/// The integration pipeline, generic over its collaborators.
pub struct Pipeline<P, S> {
    provider: P,
    store: S,
    kb: Arc<dyn KnowledgeBase>,
    sources: Vec<SourceSpec>,
}

impl<P: SourceProvider, S: SpatialStore> Pipeline<P, S> {
    pub fn new(
        provider: P,
        store: S,
        kb: Arc<dyn KnowledgeBase>,
        sources: Vec<SourceSpec>,
    ) -> Self {
        Self {
            provider,
            store,
            kb,
            sources,
        }
    }

    /// Execute the full pipeline.
    pub async fn run(mut self) -> Result<RunOutput> {
        let mut summary = RunSummary::default();

        // Ingest, normalize, reproject.
        let mut boundary_frames: Vec<FeatureFrame> = Vec::new();
        let mut strategies: FxHashMap<Country, ResolveStrategy> = FxHashMap::default();
        let mut region_rows: Vec<RegionRow> = Vec::new();
        for spec in &self.sources {
            let ingested = self
                .provider
                .fetch(spec)
                .and_then(|raw| Ok(spec.normalize.apply(&spec.id, &raw)?))
                .and_then(|frame| Ok(frame.to_crs(Crs::Geographic)?));
            let frame = match ingested {
                Ok(frame) => frame,
                Err(error) => {
                    warn!(source = spec.id.as_str(), %error, "source failed; skipping");
                    summary.sources_failed += 1;
                    continue;
                }
            };
            let rows = frame.num_rows();

            match &spec.kind {
                SourceKind::Boundary { country, strategy } => {
                    strategies.insert(*country, strategy.clone());
                    boundary_frames.push(frame);
                }
                SourceKind::Region { level } => match canonicalize(&frame, *level) {
                    Ok(canonical) => region_rows.extend(canonical),
                    Err(error) => {
                        warn!(source = spec.id.as_str(), %error, "source failed; skipping");
                        summary.sources_failed += 1;
                        continue;
                    }
                },
            }
            info!(source = spec.id.as_str(), rows, "ingested source");
            summary.sources_ingested += 1;
        }

        // Combine boundary sources; the shared schema is validated here.
        let combined = FeatureFrame::concat(boundary_frames)?;
        summary.boundary_rows = combined.num_rows();
        let mut boundaries = boundary_records(&combined, &strategies)?;
        info!(rows = summary.boundary_rows, "combined boundary sources");

        // Aggregate regions across all levels.
        summary.region_rows = region_rows.len();
        let units = dissolve_regions(region_rows)?;
        summary.region_units = units.records.len();
        summary.dissolve_skipped_rows = units.skipped_rows;
        let mut regions = units.records;
        info!(
            rows = summary.region_rows,
            units = summary.region_units,
            skipped = summary.dissolve_skipped_rows,
            "dissolved region units"
        );

        // Prefetch reference sets once; failure here aborts the run.
        let cache = ReferenceCache::build(
            self.kb.as_ref(),
            &[
                ReferenceCategory::Us,
                ReferenceCategory::Mx,
                ReferenceCategory::Ca,
                ReferenceCategory::Ecoregions,
            ],
        )
        .await?;
        let resolver = Resolver::new(Arc::clone(&self.kb), Arc::new(cache));

        // Resolve boundaries with their per-country strategy.
        for record in &mut boundaries {
            let strategy = strategies
                .get(&record.country)
                .ok_or_else(|| PipelineError::Source {
                    dataset: "boundaries".to_string(),
                    message: format!("no strategy registered for {}", record.country.as_str()),
                })?;
            record.external_id = resolver
                .resolve(
                    strategy,
                    ResolveRequest {
                        category: record.country.reference_category(),
                        name: &record.name,
                        identifier: record.identifier.as_deref(),
                    },
                )
                .await;
            record.country_external_id = Some(record.country.external_id());
            match &record.external_id {
                Some(_) => summary.boundaries_resolved += 1,
                None => {
                    warn!(name = record.name.as_str(), "boundary left unresolved");
                    summary.boundaries_unresolved += 1;
                }
            }
        }

        // Resolve region units; only levels with knowledge-base coverage.
        for record in &mut regions {
            if !record.source_dataset.resolvable() {
                continue;
            }
            record.external_id = resolver
                .resolve(
                    &ResolveStrategy::Prefetch,
                    ResolveRequest {
                        category: ReferenceCategory::Ecoregions,
                        name: &record.common_name,
                        identifier: None,
                    },
                )
                .await;
            match &record.external_id {
                Some(_) => summary.regions_resolved += 1,
                None => summary.regions_unresolved += 1,
            }
        }
        info!(
            boundaries_resolved = summary.boundaries_resolved,
            boundaries_unresolved = summary.boundaries_unresolved,
            regions_resolved = summary.regions_resolved,
            regions_unresolved = summary.regions_unresolved,
            "identifier resolution complete"
        );

        // Partition and load the spatial store. Only resolved boundaries
        // can appear in intersection output, so unresolved ones stay out.
        let boundary_shapes: Vec<BoundaryShape> = boundaries
            .iter()
            .filter_map(|b| {
                b.external_id.as_ref().map(|id| BoundaryShape {
                    external_id: id.as_str().to_string(),
                    name: b.name.clone(),
                    geometry: b.geometry.clone(),
                })
            })
            .collect();
        let region_shapes: Vec<RegionShape> = regions
            .iter()
            .map(|r| RegionShape {
                key: r.contextual_identifier.clone(),
                geometry: r.geometry.clone(),
            })
            .collect();

        let boundary_parts = partition_by_kind(boundary_shapes, |b| &b.geometry);
        let region_parts = partition_by_kind(region_shapes, |r| &r.geometry);
        summary.partition_skipped_rows = boundary_parts.skipped_rows + region_parts.skipped_rows;
        info!(
            boundaries_retained = boundary_parts.retained(),
            regions_retained = region_parts.retained(),
            skipped = summary.partition_skipped_rows,
            "partitioned by geometry type"
        );
        self.store.load_boundaries(boundary_parts)?;
        self.store.load_regions(region_parts)?;

        let triples = self.store.intersections()?;
        summary.intersection_pairs = triples.len();
        info!(pairs = summary.intersection_pairs, "intersection resolution complete");

        let export = assemble(&regions, &boundaries, &triples);
        Ok(RunOutput { export, summary })
    }
}

/// Build boundary records from the combined frame.
fn boundary_records(
    frame: &FeatureFrame,
    strategies: &FxHashMap<Country, ResolveStrategy>,
) -> Result<Vec<BoundaryRecord>> {
    let mut records = Vec::with_capacity(frame.num_rows());
    for row in 0..frame.num_rows() {
        let name = frame
            .value(row, "name")
            .ok_or_else(|| PipelineError::Source {
                dataset: "boundaries".to_string(),
                message: format!("row {} has no name", row),
            })?
            .to_string();
        let tag = frame
            .value(row, "country")
            .ok_or_else(|| PipelineError::Source {
                dataset: "boundaries".to_string(),
                message: format!("row {} has no country tag", row),
            })?;
        let country = Country::from_tag(tag).ok_or_else(|| PipelineError::Source {
            dataset: "boundaries".to_string(),
            message: format!("row {} has unknown country tag '{}'", row, tag),
        })?;
        if !strategies.contains_key(&country) {
            return Err(PipelineError::Source {
                dataset: "boundaries".to_string(),
                message: format!("no source registered for country {}", country.as_str()),
            });
        }
        let geometry = frame
            .geometry(row)
            .cloned()
            .ok_or_else(|| PipelineError::Source {
                dataset: "boundaries".to_string(),
                message: format!("row {} has no geometry", row),
            })?;

        records.push(BoundaryRecord {
            name,
            identifier: frame.value(row, "identifier").map(|s| s.to_string()),
            abbreviation: frame.value(row, "abbreviation").map(|s| s.to_string()),
            country,
            geometry,
            external_id: None,
            country_external_id: None,
        });
    }
    Ok(records)
}

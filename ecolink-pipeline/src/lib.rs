//! Batch geospatial integration pipeline for Ecolink.
//!
//! Integrates administrative boundary datasets (US, CA, MX) with
//! ecoregion classification datasets into a single region-centric export,
//! linked to external knowledge-base identifiers.
//!
//! # Modules
//!
//! - [`sources`]: source dataset inventory and retrieval contract
//! - [`model`]: boundary and region record types
//! - [`regions`]: region canonicalization and dissolve
//! - [`store`]: spatial store contract and in-process implementation
//! - [`run`]: run orchestration
//! - [`assemble`]: export assembly
//! - [`error`]: error types

pub mod assemble;
pub mod error;
pub mod model;
pub mod regions;
pub mod run;
pub mod sources;
pub mod store;

pub use assemble::{assemble, join_part_of, split_part_of, write_export, RegionExport};
pub use error::{PipelineError, Result};
pub use model::{title_case, BoundaryRecord, Country, RegionLevel, RegionRecord};
pub use run::{Pipeline, RunOutput, RunSummary};
pub use sources::{builtin_sources, FileSourceProvider, SourceKind, SourceProvider, SourceSpec};
pub use store::{InProcessStore, SpatialStore};

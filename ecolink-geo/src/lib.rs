//! Geometry layer for the Ecolink integration pipeline.
//!
//! This crate provides the geometric operations the pipeline is built on:
//!
//! - **WKT parsing and classification** of source geometries
//! - **CRS unification** into geographic lon/lat (inverse Albers conic)
//! - **Dissolve-by-key** aggregation with representative points
//! - **Geometry-type partitioning** into typed subsets
//! - **Intersection resolution** with an R-tree bounding-box prefilter
//!
//! # Modules
//!
//! - [`geometry`]: WKT parsing, geometry kinds, bounding boxes
//! - [`crs`]: spatial references and reprojection
//! - [`dissolve`]: dissolve-by-key aggregation
//! - [`partition`]: geometry-type partitioning
//! - [`intersect`]: boundary x region intersection engine
//! - [`error`]: error types

pub mod crs;
pub mod dissolve;
pub mod error;
pub mod geometry;
pub mod intersect;
pub mod partition;

pub use crs::{reproject_geometry, AlbersParams, Crs};
pub use dissolve::{dissolve_by_key, DissolveResult, DissolvedGroup};
pub use error::{GeoError, Result};
pub use geometry::{parse_wkt, BBox, GeometryKind};
pub use intersect::{intersect_sets, BoundaryShape, IntersectionTriple, RegionShape};
pub use partition::{partition_by_kind, Partitioned};

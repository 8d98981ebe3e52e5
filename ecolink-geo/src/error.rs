//! Error types for the geometry layer.

use thiserror::Error;

/// Geometry layer errors.
#[derive(Error, Debug)]
pub enum GeoError {
    /// WKT parsing error.
    #[error("WKT parse error: {0}")]
    WktParse(String),

    /// Invalid geometry (empty group, degenerate shape, missing centroid).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Source spatial reference is unknown or unsupported.
    #[error("Unknown projection: {0}")]
    UnknownProjection(String),

    /// Coordinate falls outside the valid domain of a projection.
    #[error("Projection domain error: {0}")]
    ProjectionDomain(String),
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeoError>;

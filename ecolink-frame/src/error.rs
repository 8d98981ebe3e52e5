//! Error types for feature frames.

use thiserror::Error;

/// Feature frame errors.
#[derive(Error, Debug)]
pub enum FrameError {
    /// A referenced source column is absent from the input schema.
    #[error("schema mismatch: column '{column}' not found in dataset '{dataset}'")]
    SchemaMismatch { column: String, dataset: String },

    /// Structural invariant violation (row counts, duplicate columns).
    #[error("frame error: {0}")]
    Schema(String),

    /// Frames being combined do not share a schema or reference system.
    #[error("combine error: {0}")]
    Combine(String),

    /// Geometry-level failure (WKT parse, reprojection).
    #[error(transparent)]
    Geometry(#[from] ecolink_geo::GeoError),
}

/// Result type for frame operations.
pub type Result<T> = std::result::Result<T, FrameError>;

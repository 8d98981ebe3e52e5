//! Error types for the pipeline.

use thiserror::Error;

/// Pipeline errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Frame-level failure (schema mismatch, combine error).
    #[error(transparent)]
    Frame(#[from] ecolink_frame::FrameError),

    /// Geometry-level failure (WKT parse, unknown projection).
    #[error(transparent)]
    Geo(#[from] ecolink_geo::GeoError),

    /// Resolution failure that aborts the run (reference prefetch).
    #[error(transparent)]
    Resolve(#[from] ecolink_resolve::ResolveError),

    /// Source retrieval failure, fatal to that source.
    #[error("source '{dataset}': {message}")]
    Source { dataset: String, message: String },

    /// Spatial store misuse or failure.
    #[error("spatial store: {0}")]
    Store(String),

    /// IO failure reading sources or writing the export.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Export serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

//! Error types for identifier resolution.

use thiserror::Error;

/// Resolution errors.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Transport-level failure talking to the knowledge base.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with an unexpected status.
    #[error("remote query error: {0}")]
    Remote(String),

    /// The endpoint answered with a body we could not interpret.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Bulk reference prefetch failed. Fatal: every dependent resolution
    /// would be unreliable, so the run must abort.
    #[error("reference prefetch failed: {0}")]
    PrefetchFailure(String),
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

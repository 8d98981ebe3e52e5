//! Columnar feature frames for the Ecolink integration pipeline.
//!
//! This crate provides the tabular half of the pipeline's working state:
//! raw source tables, the common-schema [`FeatureFrame`], and the typed
//! normalization configuration that maps one into the other.

pub mod error;
pub mod frame;
pub mod normalize;

pub use error::{FrameError, Result};
pub use frame::{FeatureFrame, FrameSchema, RawTable};
pub use normalize::{ColumnMapping, NormalizeSpec};

//! Knowledge-base client contract.
//!
//! The pipeline depends on two operations only: an exact lookup by a known
//! identifier property, and a bulk listing of every candidate entity in a
//! reference category. Anything that can answer those two calls can serve
//! as the knowledge base, so tests run against an in-memory fake and
//! production runs against a SPARQL endpoint.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable identifier in the external knowledge base (e.g. `Q99`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference-entity category in the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceCategory {
    /// US states and counties (FIPS-coded).
    Us,
    /// Mexican states (INEGI-coded).
    Mx,
    /// Canadian provinces and territories (two type classes, no shared
    /// identifier property).
    Ca,
    /// Already-created ecoregion entities.
    Ecoregions,
}

impl ReferenceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceCategory::Us => "US",
            ReferenceCategory::Mx => "MX",
            ReferenceCategory::Ca => "CA",
            ReferenceCategory::Ecoregions => "Ecoregions",
        }
    }
}

/// One entity from a bulk reference listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub category: ReferenceCategory,
    /// Source-native code (FIPS etc.), absent for categories without a
    /// shared identifier property.
    pub code: Option<String>,
    /// English display label.
    pub label: String,
    pub external_id: ExternalId,
}

/// Client contract for the external knowledge base.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Exact lookup: the entity whose `property` equals `value`.
    async fn lookup_by_property(&self, property: &str, value: &str)
        -> Result<Option<ExternalId>>;

    /// Bulk listing of every candidate entity in a category.
    async fn list_references(&self, category: ReferenceCategory) -> Result<Vec<ReferenceEntry>>;
}

//! External identifier resolution for the Ecolink integration pipeline.
//!
//! Resolves boundary and region records to stable identifiers in an
//! external knowledge base, by exact property lookup or by prefetching
//! reference sets once per run and matching locally.
//!
//! # Modules
//!
//! - [`kb`]: knowledge-base client contract and reference types
//! - [`sparql`]: HTTP SPARQL client implementation
//! - [`cache`]: run-scoped bulk reference cache
//! - [`resolver`]: per-record resolution strategies
//! - [`error`]: error types

pub mod cache;
pub mod error;
pub mod kb;
pub mod resolver;
pub mod sparql;

pub use cache::ReferenceCache;
pub use error::{ResolveError, Result};
pub use kb::{ExternalId, KnowledgeBase, ReferenceCategory, ReferenceEntry};
pub use resolver::{ResolveRequest, ResolveStrategy, Resolver};
pub use sparql::HttpSparqlClient;

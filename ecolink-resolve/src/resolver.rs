//! Per-record identifier resolution.
//!
//! Two strategies, chosen explicitly per source dataset:
//!
//! - **Direct**: query the knowledge base for an exact identifier-property
//!   match (datasets with a regularly-used identifier scheme, e.g. FIPS
//!   codes). Falls back to a cached label match when a record carries no
//!   identifier.
//! - **Prefetch**: resolve against the bulk-fetched [`ReferenceCache`]
//!   only, by code then label (datasets with no single authoritative
//!   property).
//!
//! A record that resolves under both strategies resolves to the same
//! identifier: both paths key on the same property values the reference
//! listing exposes.
//!
//! A remote failure for one record never aborts the batch; it is logged
//! with the record context and treated as a miss.

use crate::cache::ReferenceCache;
use crate::kb::{ExternalId, KnowledgeBase, ReferenceCategory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// How a source dataset's records are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolveStrategy {
    /// Exact identifier-property lookup against the knowledge base.
    Direct { property: String },
    /// Local lookup against the prefetched reference cache.
    Prefetch,
}

/// One record to resolve.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub category: ReferenceCategory,
    pub name: &'a str,
    pub identifier: Option<&'a str>,
}

/// Resolves records to external identifiers.
pub struct Resolver {
    kb: Arc<dyn KnowledgeBase>,
    cache: Arc<ReferenceCache>,
}

impl Resolver {
    pub fn new(kb: Arc<dyn KnowledgeBase>, cache: Arc<ReferenceCache>) -> Self {
        Self { kb, cache }
    }

    /// The reference cache backing prefetch resolution.
    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    /// Resolve one record. A miss is `None`, never an error.
    pub async fn resolve(
        &self,
        strategy: &ResolveStrategy,
        request: ResolveRequest<'_>,
    ) -> Option<ExternalId> {
        match strategy {
            ResolveStrategy::Direct { property } => match request.identifier {
                Some(identifier) => {
                    match self.kb.lookup_by_property(property, identifier).await {
                        Ok(found) => found,
                        Err(error) => {
                            warn!(
                                name = request.name,
                                identifier,
                                property = property.as_str(),
                                %error,
                                "remote lookup failed; record left unresolved"
                            );
                            None
                        }
                    }
                }
                None => self
                    .cache
                    .lookup_label(request.category, request.name)
                    .cloned(),
            },
            ResolveStrategy::Prefetch => request
                .identifier
                .and_then(|code| self.cache.lookup_code(code))
                .or_else(|| self.cache.lookup_label(request.category, request.name))
                .cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ResolveError, Result};
    use crate::kb::ReferenceEntry;
    use async_trait::async_trait;
    use rustc_hash::FxHashMap;

    struct MemoryKb {
        by_property: FxHashMap<(String, String), ExternalId>,
        references: Vec<ReferenceEntry>,
        fail_lookups: bool,
        fail_listing: bool,
    }

    impl MemoryKb {
        fn sample() -> Self {
            let mut by_property = FxHashMap::default();
            by_property.insert(
                ("P5087".to_string(), "06".to_string()),
                ExternalId::new("Q99"),
            );
            Self {
                by_property,
                references: vec![
                    ReferenceEntry {
                        category: ReferenceCategory::Us,
                        code: Some("06".to_string()),
                        label: "California".to_string(),
                        external_id: ExternalId::new("Q99"),
                    },
                    ReferenceEntry {
                        category: ReferenceCategory::Ca,
                        code: None,
                        label: "Yukon".to_string(),
                        external_id: ExternalId::new("Q2009"),
                    },
                ],
                fail_lookups: false,
                fail_listing: false,
            }
        }
    }

    #[async_trait]
    impl KnowledgeBase for MemoryKb {
        async fn lookup_by_property(
            &self,
            property: &str,
            value: &str,
        ) -> Result<Option<ExternalId>> {
            if self.fail_lookups {
                return Err(ResolveError::Remote("endpoint down".into()));
            }
            Ok(self
                .by_property
                .get(&(property.to_string(), value.to_string()))
                .cloned())
        }

        async fn list_references(
            &self,
            category: ReferenceCategory,
        ) -> Result<Vec<ReferenceEntry>> {
            if self.fail_listing {
                return Err(ResolveError::Remote("endpoint down".into()));
            }
            Ok(self
                .references
                .iter()
                .filter(|e| e.category == category)
                .cloned()
                .collect())
        }
    }

    async fn resolver_from(kb: MemoryKb) -> Resolver {
        let cache = ReferenceCache::build(
            &kb,
            &[ReferenceCategory::Us, ReferenceCategory::Ca],
        )
        .await
        .unwrap();
        Resolver::new(Arc::new(kb), Arc::new(cache))
    }

    #[tokio::test]
    async fn test_direct_resolution_by_identifier() {
        let resolver = resolver_from(MemoryKb::sample()).await;
        let id = resolver
            .resolve(
                &ResolveStrategy::Direct {
                    property: "P5087".into(),
                },
                ResolveRequest {
                    category: ReferenceCategory::Us,
                    name: "California",
                    identifier: Some("06"),
                },
            )
            .await;
        assert_eq!(id.unwrap().as_str(), "Q99");
    }

    #[tokio::test]
    async fn test_direct_falls_back_to_label_without_identifier() {
        let resolver = resolver_from(MemoryKb::sample()).await;
        let id = resolver
            .resolve(
                &ResolveStrategy::Direct {
                    property: "P5087".into(),
                },
                ResolveRequest {
                    category: ReferenceCategory::Us,
                    name: "California",
                    identifier: None,
                },
            )
            .await;
        assert_eq!(id.unwrap().as_str(), "Q99");
    }

    #[tokio::test]
    async fn test_prefetch_resolution_by_code_then_label() {
        let resolver = resolver_from(MemoryKb::sample()).await;

        let by_code = resolver
            .resolve(
                &ResolveStrategy::Prefetch,
                ResolveRequest {
                    category: ReferenceCategory::Us,
                    name: "wrong name on purpose",
                    identifier: Some("06"),
                },
            )
            .await;
        assert_eq!(by_code.unwrap().as_str(), "Q99");

        let by_label = resolver
            .resolve(
                &ResolveStrategy::Prefetch,
                ResolveRequest {
                    category: ReferenceCategory::Ca,
                    name: "Yukon",
                    identifier: None,
                },
            )
            .await;
        assert_eq!(by_label.unwrap().as_str(), "Q2009");
    }

    #[tokio::test]
    async fn test_strategies_agree_when_both_apply() {
        let resolver = resolver_from(MemoryKb::sample()).await;
        let request = ResolveRequest {
            category: ReferenceCategory::Us,
            name: "California",
            identifier: Some("06"),
        };

        let direct = resolver
            .resolve(
                &ResolveStrategy::Direct {
                    property: "P5087".into(),
                },
                request,
            )
            .await;
        let prefetch = resolver.resolve(&ResolveStrategy::Prefetch, request).await;
        assert_eq!(direct, prefetch);
        assert!(direct.is_some());
    }

    #[tokio::test]
    async fn test_remote_failure_is_a_miss_not_an_error() {
        let mut kb = MemoryKb::sample();
        kb.fail_lookups = true;
        let resolver = resolver_from(kb).await;

        let id = resolver
            .resolve(
                &ResolveStrategy::Direct {
                    property: "P5087".into(),
                },
                ResolveRequest {
                    category: ReferenceCategory::Us,
                    name: "California",
                    identifier: Some("06"),
                },
            )
            .await;
        assert!(id.is_none());
    }

    #[tokio::test]
    async fn test_prefetch_failure_is_fatal() {
        let mut kb = MemoryKb::sample();
        kb.fail_listing = true;
        let err = ReferenceCache::build(&kb, &[ReferenceCategory::Us])
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::PrefetchFailure(_)));
    }

    #[tokio::test]
    async fn test_unknown_record_is_a_miss() {
        let resolver = resolver_from(MemoryKb::sample()).await;
        let id = resolver
            .resolve(
                &ResolveStrategy::Prefetch,
                ResolveRequest {
                    category: ReferenceCategory::Us,
                    name: "Atlantis",
                    identifier: Some("99"),
                },
            )
            .await;
        assert!(id.is_none());
    }
}

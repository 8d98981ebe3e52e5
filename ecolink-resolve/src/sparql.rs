//! SPARQL knowledge-base client.
//!
//! Talks to a Wikidata-style SPARQL endpoint over HTTP, asking for JSON
//! results. Calls carry a bounded timeout so a slow endpoint degrades to
//! "unresolved" instead of stalling the run.

use crate::error::{ResolveError, Result};
use crate::kb::{ExternalId, KnowledgeBase, ReferenceCategory, ReferenceEntry};
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const LABEL_SERVICE: &str =
    r#"SERVICE wikibase:label { bd:serviceParam wikibase:language "en". }"#;

/// US states carry FIPS 5-2 alpha codes under P5087.
const PROP_US_STATE_FIPS: &str = "P5087";
/// US counties carry FIPS 6-4 codes under P882.
const PROP_US_COUNTY_FIPS: &str = "P882";
/// Mexican states carry INEGI codes under P901.
const PROP_MX_STATE_CODE: &str = "P901";

/// Canadian province / territory type classes.
const CLASS_CA_PROVINCE: &str = "Q11828004";
const CLASS_CA_TERRITORY: &str = "Q3750285";
/// Ecoregion type classes (EPA level III / level IV).
const CLASS_ECOREGION_L3: &str = "Q52111338";
const CLASS_ECOREGION_L4: &str = "Q52111409";

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<FxHashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

/// The entity identifier is the tail of its URI.
fn id_from_uri(uri: &str) -> ExternalId {
    ExternalId::new(uri.rsplit('/').next().unwrap_or(uri))
}

/// HTTP SPARQL client.
pub struct HttpSparqlClient {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpSparqlClient {
    /// Create a client for an endpoint with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout.
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ecolink/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    async fn query(&self, query: &str) -> Result<SparqlResponse> {
        debug!(endpoint = %self.endpoint, "issuing sparql query");
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[("query", query), ("format", "json")])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ResolveError::Remote(format!(
                "endpoint returned status {}",
                resp.status()
            )));
        }
        resp.json::<SparqlResponse>()
            .await
            .map_err(|e| ResolveError::Malformed(e.to_string()))
    }

    /// Entities holding `property`, with their code and label.
    async fn list_by_property(
        &self,
        category: ReferenceCategory,
        property: &str,
    ) -> Result<Vec<ReferenceEntry>> {
        let query = format!(
            "SELECT ?item ?itemLabel ?value WHERE {{ ?item wdt:{} ?value . {} }}",
            property, LABEL_SERVICE
        );
        let response = self.query(&query).await?;
        Ok(response
            .results
            .bindings
            .into_iter()
            .filter_map(|b| {
                let item = b.get("item")?;
                let label = b.get("itemLabel")?;
                Some(ReferenceEntry {
                    category,
                    code: b.get("value").map(|t| t.value.clone()),
                    label: label.value.clone(),
                    external_id: id_from_uri(&item.value),
                })
            })
            .collect())
    }

    /// Entities that are instances of any of the given classes. These
    /// categories have no shared identifier property, so entries carry
    /// labels only.
    async fn list_by_classes(
        &self,
        category: ReferenceCategory,
        classes: &[&str],
    ) -> Result<Vec<ReferenceEntry>> {
        let unions = classes
            .iter()
            .map(|class| format!("{{ ?item wdt:P31 wd:{}. }}", class))
            .collect::<Vec<_>>()
            .join(" UNION ");
        let query = format!(
            "SELECT ?item ?itemLabel WHERE {{ {} {} }}",
            unions, LABEL_SERVICE
        );
        let response = self.query(&query).await?;
        Ok(response
            .results
            .bindings
            .into_iter()
            .filter_map(|b| {
                let item = b.get("item")?;
                let label = b.get("itemLabel")?;
                Some(ReferenceEntry {
                    category,
                    code: None,
                    label: label.value.clone(),
                    external_id: id_from_uri(&item.value),
                })
            })
            .collect())
    }
}

#[async_trait]
impl KnowledgeBase for HttpSparqlClient {
    async fn lookup_by_property(
        &self,
        property: &str,
        value: &str,
    ) -> Result<Option<ExternalId>> {
        // The value is embedded in a quoted literal.
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        let query = format!(
            "SELECT ?item WHERE {{ ?item wdt:{} \"{}\" }} LIMIT 1",
            property, escaped
        );
        let response = self.query(&query).await?;
        Ok(response
            .results
            .bindings
            .first()
            .and_then(|b| b.get("item"))
            .map(|t| id_from_uri(&t.value)))
    }

    async fn list_references(&self, category: ReferenceCategory) -> Result<Vec<ReferenceEntry>> {
        match category {
            ReferenceCategory::Us => {
                let mut entries = self
                    .list_by_property(category, PROP_US_STATE_FIPS)
                    .await?;
                entries.extend(
                    self.list_by_property(category, PROP_US_COUNTY_FIPS)
                        .await?,
                );
                Ok(entries)
            }
            ReferenceCategory::Mx => self.list_by_property(category, PROP_MX_STATE_CODE).await,
            ReferenceCategory::Ca => {
                self.list_by_classes(category, &[CLASS_CA_TERRITORY, CLASS_CA_PROVINCE])
                    .await
            }
            ReferenceCategory::Ecoregions => {
                self.list_by_classes(category, &[CLASS_ECOREGION_L3, CLASS_ECOREGION_L4])
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_uri() {
        assert_eq!(
            id_from_uri("http://www.wikidata.org/entity/Q99").as_str(),
            "Q99"
        );
        assert_eq!(id_from_uri("Q99").as_str(), "Q99");
    }

    #[test]
    fn test_sparql_response_parsing() {
        let body = r#"{
            "results": {
                "bindings": [
                    {
                        "item": {"type": "uri", "value": "http://www.wikidata.org/entity/Q99"},
                        "itemLabel": {"type": "literal", "value": "California"},
                        "value": {"type": "literal", "value": "06"}
                    }
                ]
            }
        }"#;
        let parsed: SparqlResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results.bindings.len(), 1);
        let binding = &parsed.results.bindings[0];
        assert_eq!(binding.get("value").unwrap().value, "06");
        assert_eq!(
            id_from_uri(&binding.get("item").unwrap().value).as_str(),
            "Q99"
        );
    }
}

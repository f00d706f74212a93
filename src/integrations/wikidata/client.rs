// src/integrations/wikidata/client.rs
//
// Wikidata SPARQL Integration
//
// Bulk cross-reference source: resolves source catalog ids to TMDB ids via
// the public linked-data graph. Free but rate-sensitive, so lookups are
// batched; exact-match only, no ranking involved.
//
// CRITICAL RULES:
// - A failed chunk degrades to "no mapping found" for that chunk
// - Malformed bindings are skipped, never fatal

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

/// Batched exact-match lookup of source id → TMDB id mappings.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CrossRefGraph: Send + Sync {
    /// Best-effort mapping for the given ids. Ids without a mapping, and
    /// ids from failed chunks, are simply absent from the result.
    async fn tmdb_mappings(&self, source_ids: &[u64]) -> HashMap<u64, u64>;
}

const SPARQL_ENDPOINT: &str = "https://query.wikidata.org/sparql";
const USER_AGENT: &str = "kinoboxd/0.1 (+https://github.com/kinoboxd/kinoboxd)";

/// Protocol/URL-length ceiling for a single VALUES clause.
const MAX_IDS_PER_QUERY: usize = 500;

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<SparqlBinding>,
}

#[derive(Debug, Deserialize)]
struct SparqlBinding {
    #[serde(rename = "kpId")]
    kp_id: Option<SparqlValue>,
    #[serde(rename = "tmdbId")]
    tmdb_id: Option<SparqlValue>,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

/// Wikidata SPARQL client
pub struct WikidataClient {
    endpoint: String,
    http_client: Client,
}

impl WikidataClient {
    pub fn new() -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: SPARQL_ENDPOINT.to_string(),
            http_client,
        }
    }

    /// Client pointed at a different endpoint (test servers).
    pub fn with_endpoint(endpoint: String) -> Self {
        let mut client = Self::new();
        client.endpoint = endpoint;
        client
    }

    fn build_sparql_query(ids: &[u64]) -> String {
        let values = ids
            .iter()
            .map(|id| format!("\"{}\"", id))
            .collect::<Vec<_>>()
            .join(" ");

        // P2603 = Kinopoisk film ID, P4947 = TMDB movie ID
        format!(
            "SELECT ?kpId ?tmdbId WHERE {{\n  VALUES ?kpId {{ {} }}\n  ?film wdt:P2603 ?kpId .\n  OPTIONAL {{ ?film wdt:P4947 ?tmdbId . }}\n}}",
            values
        )
    }

    async fn query_chunk(&self, chunk: &[u64]) -> Result<Vec<(u64, u64)>, reqwest::Error> {
        let sparql = Self::build_sparql_query(chunk);

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .form(&[("query", sparql)])
            .send()
            .await?
            .error_for_status()?;

        let parsed: SparqlResponse = response.json().await?;

        let mut pairs = Vec::new();
        for binding in parsed.results.bindings {
            let kp = binding.kp_id.and_then(|v| v.value.parse::<u64>().ok());
            let tmdb = binding.tmdb_id.and_then(|v| v.value.parse::<u64>().ok());
            if let (Some(kp), Some(tmdb)) = (kp, tmdb) {
                pairs.push((kp, tmdb));
            }
        }

        Ok(pairs)
    }
}

impl Default for WikidataClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrossRefGraph for WikidataClient {
    async fn tmdb_mappings(&self, source_ids: &[u64]) -> HashMap<u64, u64> {
        let mut result = HashMap::new();
        if source_ids.is_empty() {
            return result;
        }

        for chunk in source_ids.chunks(MAX_IDS_PER_QUERY) {
            match self.query_chunk(chunk).await {
                Ok(pairs) => {
                    for (kp, tmdb) in pairs {
                        result.insert(kp, tmdb);
                    }
                }
                Err(e) => {
                    // Degrade this chunk to "no mapping found"
                    log::warn!(
                        "Wikidata query failed for a chunk of {} ids: {}",
                        chunk.len(),
                        e
                    );
                }
            }
        }

        result
    }
}

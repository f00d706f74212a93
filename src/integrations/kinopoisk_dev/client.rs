// src/integrations/kinopoisk_dev/client.rs
//
// Kinopoisk.dev API Integration
//
// Commercial catalog source: accurate per-item lookups gated behind a
// user-supplied X-API-KEY token (users obtain one from the provider's bot).
// The free plan is tightly rate-limited, so calls are spaced by a fixed
// delay and must stay strictly serialized.
//
// CRITICAL RULES:
// - A lookup failure for one item never aborts the batch: it maps to None
// - Non-movie payloads map to None (the target format has no series)

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[cfg(test)]
use mockall::automock;

/// Per-item token-gated lookup of source id → TMDB id.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommercialCatalog: Send + Sync {
    /// Resolves one source id. Returns None on a miss, a non-movie record,
    /// or any transport/parse failure.
    async fn tmdb_id_for(&self, source_id: u64, token: &str) -> Option<u64>;
}

const BASE_URL: &str = "https://api.kinopoisk.dev/v1.4";

/// Fixed inter-call delay to stay within the free plan's rate limit.
const MIN_CALL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
struct MovieResponse {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(rename = "externalId")]
    external_id: Option<ExternalIds>,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    tmdb: Option<u64>,
    #[allow(dead_code)] // Part of the provider's response schema
    imdb: Option<String>,
}

/// Rate limiter state
struct RateLimiter {
    last_request: Mutex<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(Instant::now() - Duration::from_secs(60)),
            min_interval,
        }
    }

    async fn wait_if_needed(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            tokio::time::sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }
}

/// Kinopoisk.dev API client
pub struct KinopoiskDevClient {
    base_url: String,
    http_client: Client,
    rate_limiter: RateLimiter,
}

impl KinopoiskDevClient {
    pub fn new() -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: BASE_URL.to_string(),
            http_client,
            rate_limiter: RateLimiter::new(MIN_CALL_INTERVAL),
        }
    }

    /// Client pointed at a different base URL (test servers).
    pub fn with_base_url(base_url: String) -> Self {
        let mut client = Self::new();
        client.base_url = base_url;
        client
    }

    async fn fetch_once(&self, source_id: u64, token: &str) -> Result<Option<u64>, reqwest::Error> {
        let url = format!("{}/movie/{}", self.base_url, source_id);

        let response: MovieResponse = self
            .http_client
            .get(&url)
            .header("X-API-KEY", token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.kind.as_deref() != Some("movie") {
            return Ok(None);
        }

        Ok(response.external_id.and_then(|ids| ids.tmdb))
    }
}

impl Default for KinopoiskDevClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommercialCatalog for KinopoiskDevClient {
    async fn tmdb_id_for(&self, source_id: u64, token: &str) -> Option<u64> {
        self.rate_limiter.wait_if_needed().await;

        match self.fetch_once(source_id, token).await {
            Ok(mapped) => mapped,
            Err(e) => {
                // Authentication problems and 404s are the common cases;
                // both are non-fatal for the pipeline.
                log::warn!("Kinopoisk.dev request failed for id {}: {}", source_id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_payload_parsing() {
        let payload = r#"{"id": 326, "type": "movie", "externalId": {"tmdb": 278, "imdb": "tt0111161"}}"#;
        let parsed: MovieResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.kind.as_deref(), Some("movie"));
        assert_eq!(parsed.external_id.unwrap().tmdb, Some(278));
    }

    #[test]
    fn test_non_movie_and_sparse_payloads() {
        let series: MovieResponse =
            serde_json::from_str(r#"{"id": 77044, "type": "tv-series"}"#).unwrap();
        assert_eq!(series.kind.as_deref(), Some("tv-series"));
        assert!(series.external_id.is_none());

        let sparse: MovieResponse = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(sparse.kind.is_none());
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_calls() {
        let limiter = RateLimiter::new(Duration::from_millis(30));

        let start = Instant::now();
        limiter.wait_if_needed().await; // first call is free
        limiter.wait_if_needed().await;
        limiter.wait_if_needed().await;

        assert!(start.elapsed() >= Duration::from_millis(60));
    }
}

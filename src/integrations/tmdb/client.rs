// src/integrations/tmdb/client.rs
//
// TMDB Search Integration
//
// Fuzzy search source: queries "search/movie" by title and a ±1 year
// window, returning ranked candidates rather than a single answer. This is
// the only stage of the pipeline that can produce ambiguity.
//
// CRITICAL RULES:
// - Returns candidates, never writes identifiers
// - A failed or malformed query degrades to an empty batch

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use crate::domain::CandidateMatch;

/// Title/year search returning raw candidate guesses.
///
/// Results may contain duplicates across the year window; the domain layer
/// ranks, dedupes and caps them when they are attached to an entry.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FuzzySearch: Send + Sync {
    async fn candidates_for(&self, title: &str, release_year: Option<i32>) -> Vec<CandidateMatch>;
}

const BASE_URL: &str = "https://api.themoviedb.org/3";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: u64,
    title: String,
    popularity: Option<f64>,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

/// TMDB API client
pub struct TmdbSearchClient {
    base_url: String,
    http_client: Client,
    api_token: String,
}

impl TmdbSearchClient {
    pub fn new(api_token: String) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: BASE_URL.to_string(),
            http_client,
            api_token,
        }
    }

    /// Client pointed at a different base URL (test servers).
    pub fn with_base_url(api_token: String, base_url: String) -> Self {
        let mut client = Self::new(api_token);
        client.base_url = base_url;
        client
    }

    async fn search_once(&self, title: &str, year: Option<i32>) -> Vec<TmdbMovie> {
        let url = format!("{}/search/movie", self.base_url);

        let mut params: Vec<(&str, String)> = vec![("query", title.to_string())];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }

        let response = self
            .http_client
            .get(&url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.api_token),
            )
            .header(header::ACCEPT, "application/json")
            .query(&params)
            .send()
            .await;

        let response = match response.and_then(|r| r.error_for_status()) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("TMDB search failed for \"{}\": {}", title, e);
                return Vec::new();
            }
        };

        match response.json::<SearchResponse>().await {
            Ok(parsed) => parsed.results,
            Err(e) => {
                // Malformed payload is treated as zero results
                log::warn!("TMDB payload for \"{}\" did not parse: {}", title, e);
                Vec::new()
            }
        }
    }

    fn to_candidate(movie: TmdbMovie) -> CandidateMatch {
        let release_year = movie
            .release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse::<i32>().ok());

        CandidateMatch {
            title: movie.title,
            release_year,
            tmdb_id: movie.id,
            popularity: movie.popularity,
            synopsis: movie.overview,
            poster_path: movie.poster_path,
        }
    }
}

#[async_trait]
impl FuzzySearch for TmdbSearchClient {
    async fn candidates_for(&self, title: &str, release_year: Option<i32>) -> Vec<CandidateMatch> {
        // Release years in the source catalog are occasionally off by one
        // against TMDB, so a known year is widened to a ±1 window.
        let years: Vec<Option<i32>> = match release_year {
            Some(year) => vec![Some(year), Some(year + 1), Some(year - 1)],
            None => vec![None],
        };

        let mut collected = Vec::new();
        for year in years {
            let batch = self.search_once(title, year).await;
            collected.extend(batch.into_iter().map(Self::to_candidate));
        }

        collected
    }
}

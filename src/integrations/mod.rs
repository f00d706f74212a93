// src/integrations/mod.rs
//
// External service integrations.
//
// CRITICAL RULES:
// - Integrations are INFRASTRUCTURE, not DOMAIN
// - They map external payloads to DTOs/domain value objects
// - They never mutate domain state
// - Per-item failures are logged and degraded, never propagated

pub mod kinopoisk_dev;
pub mod tmdb;
pub mod wikidata;

pub use kinopoisk_dev::{CommercialCatalog, KinopoiskDevClient};
pub use tmdb::{FuzzySearch, TmdbSearchClient};
pub use wikidata::{CrossRefGraph, WikidataClient};

#[cfg(test)]
pub use kinopoisk_dev::MockCommercialCatalog;
#[cfg(test)]
pub use tmdb::MockFuzzySearch;
#[cfg(test)]
pub use wikidata::MockCrossRefGraph;

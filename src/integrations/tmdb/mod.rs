// src/integrations/tmdb/mod.rs

pub mod client;

pub use client::{FuzzySearch, TmdbSearchClient};

#[cfg(test)]
pub use client::MockFuzzySearch;

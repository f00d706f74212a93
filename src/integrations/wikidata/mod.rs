// src/integrations/wikidata/mod.rs

pub mod client;

pub use client::{CrossRefGraph, WikidataClient};

#[cfg(test)]
pub use client::MockCrossRefGraph;

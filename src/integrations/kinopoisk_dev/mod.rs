// src/integrations/kinopoisk_dev/mod.rs

pub mod client;

pub use client::{CommercialCatalog, KinopoiskDevClient};

#[cfg(test)]
pub use client::MockCommercialCatalog;

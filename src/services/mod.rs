// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod disambiguation_service;
pub mod export_report;
pub mod resolution_pipeline;

#[cfg(test)]
mod disambiguation_service_tests;

// Re-export all services and their types
pub use resolution_pipeline::{
    PipelineOutcome,
    ResolutionPipeline,
};

pub use disambiguation_service::{
    Decision,
    DisambiguationService,
    EntryCard,
    Prompt,
    StartOutcome,
    SKIP_ALL_MIN_REMAINING,
};

pub use export_report::{compute_export_stats, ExportStats};

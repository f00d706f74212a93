// src/events/mod.rs
//
// Internal Event System - Public API
//
// CRITICAL: EventHandler is INTERNAL and must NOT be exported

pub mod bus;
pub mod types;

pub use types::DomainEvent;

pub use types::{
    // Workflow
    EntryConfirmed,
    EntrySkipped,
    // Pipeline
    PipelineCompleted,
    PipelinePaused,
    SelectionQueueCompleted,
    StageCompleted,
};

pub use bus::{EventBus, EventLogEntry};

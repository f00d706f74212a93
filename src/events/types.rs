// src/events/types.rs
//
// All domain events in the system.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// RESOLUTION PIPELINE EVENTS
// ============================================================================

/// Emitted after each pipeline stage finishes, resolved anything or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageCompleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub stage: &'static str,
    /// Entries the stage was invoked with
    pub attempted: usize,
    /// Entries the stage enriched: a cross-reference id for the identifier
    /// stages, a candidate list for the fuzzy-search stage
    pub newly_resolved: usize,
}

impl StageCompleted {
    pub fn new(stage: &'static str, attempted: usize, newly_resolved: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            stage,
            attempted,
            newly_resolved,
        }
    }
}

impl DomainEvent for StageCompleted {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "StageCompleted"
    }
}

/// Emitted when the pipeline ran every stage to the end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCompleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub total_entries: usize,
    pub resolved: usize,
    pub ambiguous: usize,
    pub unresolved: usize,
}

impl PipelineCompleted {
    pub fn new(total_entries: usize, resolved: usize, ambiguous: usize, unresolved: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            total_entries,
            resolved,
            ambiguous,
            unresolved,
        }
    }
}

impl DomainEvent for PipelineCompleted {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "PipelineCompleted"
    }
}

/// Emitted when the pipeline stopped at the commercial catalog boundary
/// because no credential was available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelinePaused {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    /// Unresolved movie entries still waiting for the paused stage
    pub pending_entries: usize,
}

impl PipelinePaused {
    pub fn new(pending_entries: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            pending_entries,
        }
    }
}

impl DomainEvent for PipelinePaused {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "PipelinePaused"
    }
}

// ============================================================================
// DISAMBIGUATION WORKFLOW EVENTS
// ============================================================================

/// Emitted when a user confirms a candidate for an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConfirmed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub user_id: i64,
    pub source_id: u64,
    pub tmdb_id: u64,
}

impl EntryConfirmed {
    pub fn new(user_id: i64, source_id: u64, tmdb_id: u64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            user_id,
            source_id,
            tmdb_id,
        }
    }
}

impl DomainEvent for EntryConfirmed {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "EntryConfirmed"
    }
}

/// Emitted when a user skips an entry (single skip or as part of skip-all).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySkipped {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub user_id: i64,
    pub source_id: u64,
}

impl EntrySkipped {
    pub fn new(user_id: i64, source_id: u64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            user_id,
            source_id,
        }
    }
}

impl DomainEvent for EntrySkipped {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "EntrySkipped"
    }
}

/// Emitted exactly once, when the selection queue drains and the final
/// entry set is handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionQueueCompleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub user_id: i64,
    pub confirmed: usize,
    pub skipped: usize,
}

impl SelectionQueueCompleted {
    pub fn new(user_id: i64, confirmed: usize, skipped: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            user_id,
            confirmed,
            skipped,
        }
    }
}

impl DomainEvent for SelectionQueueCompleted {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "SelectionQueueCompleted"
    }
}

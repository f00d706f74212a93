// src/lib.rs
// KinoBoxd - catalog migration engine
//
// Architecture:
// - Domain-centric: identity and queue rules live in the domain layer
// - Event-driven: services report progress through the event bus
// - Explicit: no implicit behavior, no magic
// - Layered: repositories and integrations are dumb edges; services orchestrate

// ============================================================================
// MODULES
// ============================================================================

pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod integrations;
pub mod repositories;
pub mod services;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    validate_catalog_entry,
    CandidateMatch,
    CatalogEntry,
    Identity,
    MediaKind,
    SelectionQueue,
    UserSession,
    MAX_CANDIDATES,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    DomainEvent,
    EntryConfirmed,
    EntrySkipped,
    EventBus,
    EventLogEntry,
    PipelineCompleted,
    PipelinePaused,
    SelectionQueueCompleted,
    StageCompleted,
};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, ConnectionPool};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{
    MemorySessionRepository,
    ReferenceRepository,
    SessionRepository,
    SqliteReferenceRepository,
};

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{
    CommercialCatalog,
    CrossRefGraph,
    FuzzySearch,
    KinopoiskDevClient,
    TmdbSearchClient,
    WikidataClient,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    compute_export_stats,
    // Disambiguation Workflow
    Decision,
    DisambiguationService,
    EntryCard,
    // Export Report
    ExportStats,
    // Resolution Pipeline
    PipelineOutcome,
    Prompt,
    ResolutionPipeline,
    StartOutcome,
    SKIP_ALL_MIN_REMAINING,
};

// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod catalog_entry;
pub mod session;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Catalog Entry Domain
pub use catalog_entry::{
    validate_catalog_entry, CandidateMatch, CatalogEntry, Identity, MediaKind, MAX_CANDIDATES,
};

// Session Domain
pub use session::{SelectionQueue, UserSession};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;

// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement
// - NO event emission
// - Explicit SQL only

pub mod reference_repository;
pub mod session_repository;

pub use reference_repository::{ReferenceRepository, SqliteReferenceRepository};
pub use session_repository::{MemorySessionRepository, SessionRepository};

#[cfg(test)]
pub use reference_repository::MockReferenceRepository;
#[cfg(test)]
pub use session_repository::MockSessionRepository;

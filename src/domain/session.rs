// src/domain/session.rs
//
// Per-user session state persisted between chat turns.
//
// CRITICAL RULES:
// - One session per user, never shared
// - Serializable losslessly: the workflow must survive process restarts
// - The cursor only ever moves forward

use serde::{Deserialize, Serialize};

use crate::domain::catalog_entry::CatalogEntry;

/// The resumable cursor over ambiguous entries awaiting a human decision.
///
/// `pending` holds indexes into `entries`, in the order the pipeline
/// discovered the ambiguity. `cursor` indexes into `pending` and is
/// monotonically increasing; the queue is complete once it reaches
/// `pending.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionQueue {
    /// Full post-pipeline entry set, resolved and unresolved alike
    pub entries: Vec<CatalogEntry>,

    /// Indexes into `entries` that still need a decision
    pub pending: Vec<usize>,

    /// Position within `pending` of the entry currently being decided
    pub cursor: usize,
}

impl SelectionQueue {
    /// Builds a queue from a post-pipeline entry set, collecting the
    /// ambiguous entries in discovery order. When nothing needs
    /// disambiguation the entries are handed back untouched.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, Vec<CatalogEntry>> {
        let pending: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.identity.is_ambiguous())
            .map(|(idx, _)| idx)
            .collect();

        if pending.is_empty() {
            return Err(entries);
        }

        Ok(Self {
            entries,
            pending,
            cursor: 0,
        })
    }

    /// Index (into `entries`) of the entry currently awaiting a decision,
    /// or None once the queue is complete.
    pub fn current_index(&self) -> Option<usize> {
        self.pending.get(self.cursor).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.pending.len()
    }

    /// Entries still awaiting a decision, the current one included.
    pub fn remaining(&self) -> usize {
        self.pending.len().saturating_sub(self.cursor)
    }
}

/// Single object persisted per user id. Loaded at the beginning of each
/// interaction and written back after every transition, so the workflow
/// loses at most the in-flight prompt on a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    /// Present only while the disambiguation workflow is active
    pub selection: Option<SelectionQueue>,

    /// Commercial catalog API token supplied by the user
    pub catalog_token: Option<String>,

    /// Set while the pipeline is paused waiting for the user to send a token
    pub awaiting_token: bool,
}

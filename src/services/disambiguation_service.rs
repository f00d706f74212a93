// src/services/disambiguation_service.rs
//
// Disambiguation Workflow - per-user manual selection state machine
//
// Walks the pipeline's ambiguous entries one at a time, collects a human
// decision for each and settles the entry accordingly. States per user:
//
//   Idle -> AwaitingDecision (start, >=1 ambiguous entry)
//   AwaitingDecision -> AwaitingDecision (confirm / skip, cursor advances)
//   AwaitingDecision -> Idle (cursor reaches the end, queue cleared)
//
// CRITICAL RULES:
// - No module-level state: sessions live behind the injected repository
// - Every transition persists the session before returning, so a restart
//   loses at most the in-flight prompt
// - The cursor only moves forward; an action naming a position the cursor
//   has passed is stale and is rejected without changing state
// - The final entry set is handed back exactly once, as a return value

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{CandidateMatch, CatalogEntry, SelectionQueue, UserSession};
use crate::error::{AppError, AppResult};
use crate::events::{EntryConfirmed, EntrySkipped, EventBus, SelectionQueueCompleted};
use crate::repositories::SessionRepository;

/// "Skip all remaining" is offered while at least this many entries still
/// need a decision. UI policy, not a correctness invariant.
pub const SKIP_ALL_MIN_REMAINING: usize = 2;

/// Snapshot of the entry a prompt is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryCard {
    pub title: String,
    pub release_year: Option<i32>,
}

impl EntryCard {
    fn for_entry(entry: &CatalogEntry) -> Self {
        Self {
            title: entry.title.clone(),
            release_year: entry.release_year,
        }
    }
}

/// Abstract prompt handed to the chat transport. The transport renders it
/// however it likes; the workflow never formats platform markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prompt {
    /// Exactly one candidate: ask for a yes/no confirmation.
    SingleConfirm {
        /// Cursor position this prompt belongs to; actions must echo it
        position: usize,
        entry: EntryCard,
        candidate: CandidateMatch,
        offer_skip_all: bool,
    },

    /// Several candidates: ask for a numbered choice or a skip.
    MultiChoice {
        position: usize,
        entry: EntryCard,
        candidates: Vec<CandidateMatch>,
        offer_skip_all: bool,
    },

    /// Free-text request for the commercial catalog token.
    CredentialRequest,
}

/// Result of starting the workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    /// No entry is ambiguous; the set is already settled.
    NothingToResolve(Vec<CatalogEntry>),

    /// A queue was created; present this prompt to the user.
    AwaitingDecision(Prompt),
}

/// Result of a user decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// More entries await; present this prompt next.
    Next(Prompt),

    /// The queue drained. Carries the full entry set, every entry settled;
    /// returned exactly once per queue.
    Complete(Vec<CatalogEntry>),

    /// There was no active queue to act on (skip-all on an empty queue).
    Idle,
}

pub struct DisambiguationService {
    sessions: Arc<dyn SessionRepository>,
    event_bus: Arc<EventBus>,
}

impl DisambiguationService {
    pub fn new(sessions: Arc<dyn SessionRepository>, event_bus: Arc<EventBus>) -> Self {
        Self { sessions, event_bus }
    }

    // ========================================================================
    // WORKFLOW TRANSITIONS
    // ========================================================================

    /// Partitions `entries` and, when any are ambiguous, builds the
    /// selection queue and enters AwaitingDecision.
    pub async fn start(
        &self,
        user_id: i64,
        entries: Vec<CatalogEntry>,
    ) -> AppResult<StartOutcome> {
        let queue = match SelectionQueue::new(entries) {
            Err(entries) => return Ok(StartOutcome::NothingToResolve(entries)),
            Ok(queue) => queue,
        };

        let prompt = Self::prompt_for(&queue)
            .ok_or_else(|| AppError::Other("fresh selection queue has no prompt".to_string()))?;

        let mut session = self.load(user_id).await?;
        session.selection = Some(queue);
        self.sessions.save(user_id, &session).await?;

        Ok(StartOutcome::AwaitingDecision(prompt))
    }

    /// The prompt for the entry currently awaiting a decision, or None when
    /// the user has no active queue.
    pub async fn current_prompt(&self, user_id: i64) -> AppResult<Option<Prompt>> {
        let session = self.load(user_id).await?;
        Ok(session.selection.as_ref().and_then(Self::prompt_for))
    }

    /// Applies the candidate at `candidate_index` to the entry at the
    /// active cursor position and advances.
    ///
    /// `position` must echo the prompt's cursor position; a stale or
    /// unknown position is rejected with `InvalidSelection` and the state
    /// is left unchanged.
    pub async fn confirm(
        &self,
        user_id: i64,
        position: usize,
        candidate_index: usize,
    ) -> AppResult<Decision> {
        let mut session = self.load(user_id).await?;
        let queue = Self::active_queue(&mut session, position)?;

        let entry_idx = queue
            .current_index()
            .ok_or_else(Self::no_active_selection)?;

        let candidate = queue.entries[entry_idx]
            .identity
            .candidates()
            .get(candidate_index)
            .cloned()
            .ok_or_else(|| {
                AppError::InvalidSelection(format!("no candidate at index {}", candidate_index))
            })?;

        let confirmed = queue.entries[entry_idx].clone().confirmed(&candidate);
        let source_id = confirmed.source_id;
        queue.entries[entry_idx] = confirmed;
        queue.cursor += 1;

        self.event_bus
            .emit(EntryConfirmed::new(user_id, source_id, candidate.tmdb_id));

        self.advance(user_id, session).await
    }

    /// Leaves the current entry's identifiers untouched (it settles as
    /// Unresolved for reporting) and advances. Covers both declining a
    /// single match and skipping one of many.
    pub async fn skip_current(&self, user_id: i64, position: usize) -> AppResult<Decision> {
        let mut session = self.load(user_id).await?;
        let queue = Self::active_queue(&mut session, position)?;

        let entry_idx = queue
            .current_index()
            .ok_or_else(Self::no_active_selection)?;

        let settled = queue.entries[entry_idx].clone().settled_unresolved();
        let source_id = settled.source_id;
        queue.entries[entry_idx] = settled;
        queue.cursor += 1;

        self.event_bus.emit(EntrySkipped::new(user_id, source_id));

        self.advance(user_id, session).await
    }

    /// Bulk abandon: settles every remaining entry as Unresolved and jumps
    /// the cursor to the end. Idempotent — with no active queue this is a
    /// no-op, not an error.
    pub async fn skip_all(&self, user_id: i64) -> AppResult<Decision> {
        let mut session = self.load(user_id).await?;

        let queue = match session.selection.as_mut() {
            Some(queue) => queue,
            None => return Ok(Decision::Idle),
        };

        let mut skipped_ids = Vec::new();
        for &entry_idx in &queue.pending[queue.cursor..] {
            let settled = queue.entries[entry_idx].clone().settled_unresolved();
            skipped_ids.push(settled.source_id);
            queue.entries[entry_idx] = settled;
        }
        queue.cursor = queue.pending.len();

        for source_id in skipped_ids {
            self.event_bus.emit(EntrySkipped::new(user_id, source_id));
        }

        self.advance(user_id, session).await
    }

    // ========================================================================
    // CREDENTIAL HAND-OFF (pipeline pause support)
    // ========================================================================

    /// Marks the session as waiting for the commercial catalog token and
    /// returns the free-text prompt to present.
    pub async fn request_credential(&self, user_id: i64) -> AppResult<Prompt> {
        let mut session = self.load(user_id).await?;
        session.awaiting_token = true;
        self.sessions.save(user_id, &session).await?;
        Ok(Prompt::CredentialRequest)
    }

    /// Stores a token the user sent. Returns false when no token was being
    /// waited for (the message was ordinary chat, not a credential).
    pub async fn supply_credential(&self, user_id: i64, token: String) -> AppResult<bool> {
        let mut session = self.load(user_id).await?;
        if !session.awaiting_token {
            return Ok(false);
        }
        session.awaiting_token = false;
        session.catalog_token = Some(token);
        self.sessions.save(user_id, &session).await?;
        Ok(true)
    }

    /// The stored commercial catalog token, if any.
    pub async fn credential(&self, user_id: i64) -> AppResult<Option<String>> {
        Ok(self.load(user_id).await?.catalog_token)
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    async fn load(&self, user_id: i64) -> AppResult<UserSession> {
        Ok(self.sessions.get(user_id).await?.unwrap_or_default())
    }

    fn no_active_selection() -> AppError {
        AppError::InvalidSelection("no active selection".to_string())
    }

    /// Fetches the queue and validates that `position` is the live cursor.
    /// An active queue always has a live cursor: a drained queue is removed
    /// from the session the moment it completes.
    fn active_queue(
        session: &mut UserSession,
        position: usize,
    ) -> AppResult<&mut SelectionQueue> {
        let queue = session
            .selection
            .as_mut()
            .ok_or_else(Self::no_active_selection)?;

        if position != queue.cursor {
            return Err(Self::no_active_selection());
        }

        Ok(queue)
    }

    fn prompt_for(queue: &SelectionQueue) -> Option<Prompt> {
        let entry_idx = queue.current_index()?;
        let entry = &queue.entries[entry_idx];
        let candidates = entry.identity.candidates();
        let offer_skip_all = queue.remaining() >= SKIP_ALL_MIN_REMAINING;

        let prompt = if candidates.len() == 1 {
            Prompt::SingleConfirm {
                position: queue.cursor,
                entry: EntryCard::for_entry(entry),
                candidate: candidates[0].clone(),
                offer_skip_all,
            }
        } else {
            Prompt::MultiChoice {
                position: queue.cursor,
                entry: EntryCard::for_entry(entry),
                candidates: candidates.to_vec(),
                offer_skip_all,
            }
        };

        Some(prompt)
    }

    /// Persists the session, then either surfaces the next prompt or, when
    /// the queue has drained, clears it and hands the entries back.
    async fn advance(&self, user_id: i64, mut session: UserSession) -> AppResult<Decision> {
        let completed = match &session.selection {
            Some(queue) if queue.is_complete() => {
                let confirmed = queue
                    .pending
                    .iter()
                    .filter(|&&idx| queue.entries[idx].is_resolved())
                    .count();
                Some((confirmed, queue.pending.len() - confirmed))
            }
            Some(_) => None,
            None => return Ok(Decision::Idle),
        };

        if let Some((confirmed, skipped)) = completed {
            let entries = session
                .selection
                .take()
                .map(|queue| queue.entries)
                .unwrap_or_default();
            self.sessions.save(user_id, &session).await?;

            self.event_bus
                .emit(SelectionQueueCompleted::new(user_id, confirmed, skipped));

            return Ok(Decision::Complete(entries));
        }

        self.sessions.save(user_id, &session).await?;

        let prompt = session
            .selection
            .as_ref()
            .and_then(Self::prompt_for)
            .ok_or_else(|| AppError::Other("selection queue lost its cursor".to_string()))?;

        Ok(Decision::Next(prompt))
    }
}

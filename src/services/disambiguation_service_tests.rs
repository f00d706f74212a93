// src/services/disambiguation_service_tests.rs
//
// Disambiguation Workflow unit tests.
//
// INVARIANTS TESTED:
// - Starting with no ambiguous entry hands the set straight back
// - The queue visits ambiguous entries in stable order and skips the rest
// - Actions must echo the live cursor position; stale replays are rejected
//   without mutating state
// - Skip-all settles everything remaining and is idempotent
// - Completion is surfaced exactly once, after which the queue is gone
// - Every transition is persisted (a fresh service over the same store
//   resumes where the last one stopped)
// - The credential sub-dialogue only accepts a token it asked for

#[cfg(test)]
mod workflow_tests {
    use std::sync::Arc;

    use crate::domain::{CandidateMatch, CatalogEntry, Identity, MediaKind};
    use crate::error::AppError;
    use crate::events::EventBus;
    use crate::repositories::{MemorySessionRepository, SessionRepository};
    use crate::services::disambiguation_service::{
        Decision, DisambiguationService, Prompt, StartOutcome,
    };

    // ========================================================================
    // TEST HELPERS
    // ========================================================================

    const USER: i64 = 42;

    fn candidate(tmdb_id: u64) -> CandidateMatch {
        CandidateMatch {
            title: format!("Candidate {}", tmdb_id),
            release_year: Some(2005),
            tmdb_id,
            popularity: Some(tmdb_id as f64),
            synopsis: None,
            poster_path: None,
        }
    }

    fn resolved_movie(source_id: u64) -> CatalogEntry {
        CatalogEntry::new(source_id, format!("Resolved {}", source_id), MediaKind::Movie)
            .with_tmdb_id(source_id * 1000)
    }

    fn ambiguous_movie(source_id: u64, candidate_count: u64) -> CatalogEntry {
        let candidates = (1..=candidate_count)
            .map(|i| candidate(source_id * 100 + i))
            .collect();
        CatalogEntry::new(source_id, format!("Ambiguous {}", source_id), MediaKind::Movie)
            .with_candidates(candidates)
    }

    fn setup() -> (DisambiguationService, Arc<MemorySessionRepository>, Arc<EventBus>) {
        let store = Arc::new(MemorySessionRepository::new());
        let bus = Arc::new(EventBus::new());
        let service = DisambiguationService::new(
            Arc::clone(&store) as Arc<dyn SessionRepository>,
            Arc::clone(&bus),
        );
        (service, store, bus)
    }

    /// Eight entries where only indices 2, 5 and 7 carry candidates.
    fn mixed_entries() -> Vec<CatalogEntry> {
        (0..8u64)
            .map(|i| match i {
                2 | 5 | 7 => ambiguous_movie(i, 3),
                _ => resolved_movie(i),
            })
            .collect()
    }

    fn prompt_position(prompt: &Prompt) -> usize {
        match prompt {
            Prompt::SingleConfirm { position, .. } | Prompt::MultiChoice { position, .. } => {
                *position
            }
            Prompt::CredentialRequest => panic!("credential prompt has no position"),
        }
    }

    fn prompt_title(prompt: &Prompt) -> &str {
        match prompt {
            Prompt::SingleConfirm { entry, .. } | Prompt::MultiChoice { entry, .. } => {
                &entry.title
            }
            Prompt::CredentialRequest => panic!("credential prompt has no entry"),
        }
    }

    fn awaiting(outcome: StartOutcome) -> Prompt {
        match outcome {
            StartOutcome::AwaitingDecision(prompt) => prompt,
            other => panic!("expected AwaitingDecision, got {:?}", other),
        }
    }

    fn next(decision: Decision) -> Prompt {
        match decision {
            Decision::Next(prompt) => prompt,
            other => panic!("expected Next, got {:?}", other),
        }
    }

    fn completed(decision: Decision) -> Vec<CatalogEntry> {
        match decision {
            Decision::Complete(entries) => entries,
            other => panic!("expected Complete, got {:?}", other),
        }
    }

    fn is_invalid_selection(err: &AppError) -> bool {
        matches!(err, AppError::InvalidSelection(_))
    }

    // ========================================================================
    // STARTING
    // ========================================================================

    #[tokio::test]
    async fn test_start_with_nothing_ambiguous_hands_entries_back() {
        let (service, _, _) = setup();
        let entries = vec![resolved_movie(1), resolved_movie(2)];

        match service.start(USER, entries.clone()).await.unwrap() {
            StartOutcome::NothingToResolve(returned) => assert_eq!(returned, entries),
            other => panic!("expected NothingToResolve, got {:?}", other),
        }

        assert!(service.current_prompt(USER).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_prompts_for_the_first_ambiguous_entry() {
        let (service, _, _) = setup();

        let prompt = awaiting(service.start(USER, mixed_entries()).await.unwrap());
        assert_eq!(prompt_position(&prompt), 0);
        assert_eq!(prompt_title(&prompt), "Ambiguous 2");
    }

    #[tokio::test]
    async fn test_single_candidate_yields_a_confirm_prompt() {
        let (service, _, _) = setup();
        let entries = vec![ambiguous_movie(1, 1), ambiguous_movie(2, 3)];

        let prompt = awaiting(service.start(USER, entries).await.unwrap());
        match prompt {
            Prompt::SingleConfirm { candidate, offer_skip_all, .. } => {
                assert_eq!(candidate.tmdb_id, 101);
                assert!(offer_skip_all);
            }
            other => panic!("expected SingleConfirm, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_skip_all_is_not_offered_for_the_last_entry() {
        let (service, _, _) = setup();
        let entries = vec![ambiguous_movie(1, 3)];

        let prompt = awaiting(service.start(USER, entries).await.unwrap());
        match prompt {
            Prompt::MultiChoice { offer_skip_all, .. } => assert!(!offer_skip_all),
            other => panic!("expected MultiChoice, got {:?}", other),
        }
    }

    // ========================================================================
    // QUEUE WALK
    // ========================================================================

    #[tokio::test]
    async fn test_queue_visits_ambiguous_entries_in_order() {
        let (service, _, _) = setup();
        service.start(USER, mixed_entries()).await.unwrap();

        let second = next(service.confirm(USER, 0, 0).await.unwrap());
        assert_eq!(prompt_position(&second), 1);
        assert_eq!(prompt_title(&second), "Ambiguous 5");

        let third = next(service.confirm(USER, 1, 0).await.unwrap());
        assert_eq!(prompt_position(&third), 2);
        assert_eq!(prompt_title(&third), "Ambiguous 7");

        let entries = completed(service.confirm(USER, 2, 1).await.unwrap());
        assert_eq!(entries.len(), 8);

        // Confirmed entries carry the chosen candidate's identity and title.
        // Candidates are ranked by popularity descending, so index 0 is the
        // most popular one.
        let entry_two = entries.iter().find(|e| e.source_id == 2).unwrap();
        assert_eq!(entry_two.identity.tmdb_id(), Some(203));
        assert_eq!(entry_two.title, "Candidate 203");

        let entry_seven = entries.iter().find(|e| e.source_id == 7).unwrap();
        assert_eq!(entry_seven.identity.tmdb_id(), Some(702));

        // Untouched entries pass through unchanged.
        let entry_zero = entries.iter().find(|e| e.source_id == 0).unwrap();
        assert_eq!(entry_zero.identity.tmdb_id(), Some(0));
    }

    #[tokio::test]
    async fn test_skip_settles_the_entry_as_unresolved() {
        let (service, _, bus) = setup();
        let entries = vec![ambiguous_movie(1, 2), ambiguous_movie(2, 2)];
        service.start(USER, entries).await.unwrap();

        let second = next(service.skip_current(USER, 0).await.unwrap());
        assert_eq!(prompt_title(&second), "Ambiguous 2");

        let entries = completed(service.skip_current(USER, 1).await.unwrap());
        assert!(entries.iter().all(|e| e.identity == Identity::Unresolved));

        let skips = bus
            .get_event_log()
            .iter()
            .filter(|e| e.event_type == "EntrySkipped")
            .count();
        assert_eq!(skips, 2);
    }

    // ========================================================================
    // STALE AND INVALID ACTIONS
    // ========================================================================

    #[tokio::test]
    async fn test_stale_position_is_rejected_without_advancing() {
        let (service, _, _) = setup();
        service.start(USER, mixed_entries()).await.unwrap();
        service.confirm(USER, 0, 0).await.unwrap();

        // Replay of the already-consumed first prompt.
        let err = service.confirm(USER, 0, 0).await.unwrap_err();
        assert!(is_invalid_selection(&err));

        // The live prompt is still the second entry.
        let prompt = service.current_prompt(USER).await.unwrap().unwrap();
        assert_eq!(prompt_position(&prompt), 1);
        assert_eq!(prompt_title(&prompt), "Ambiguous 5");
    }

    #[tokio::test]
    async fn test_action_without_a_queue_is_rejected() {
        let (service, _, _) = setup();

        let err = service.confirm(USER, 0, 0).await.unwrap_err();
        assert!(is_invalid_selection(&err));

        let err = service.skip_current(USER, 0).await.unwrap_err();
        assert!(is_invalid_selection(&err));
    }

    #[tokio::test]
    async fn test_out_of_range_candidate_index_is_rejected_without_advancing() {
        let (service, _, _) = setup();
        service.start(USER, vec![ambiguous_movie(1, 2), ambiguous_movie(2, 2)]).await.unwrap();

        let err = service.confirm(USER, 0, 9).await.unwrap_err();
        assert!(is_invalid_selection(&err));

        let prompt = service.current_prompt(USER).await.unwrap().unwrap();
        assert_eq!(prompt_position(&prompt), 0);
        assert_eq!(prompt_title(&prompt), "Ambiguous 1");
    }

    // ========================================================================
    // SKIP-ALL
    // ========================================================================

    #[tokio::test]
    async fn test_skip_all_settles_everything_remaining() {
        let (service, _, bus) = setup();
        service.start(USER, mixed_entries()).await.unwrap();
        service.confirm(USER, 0, 0).await.unwrap();

        let entries = completed(service.skip_all(USER).await.unwrap());

        let entry_two = entries.iter().find(|e| e.source_id == 2).unwrap();
        assert!(entry_two.is_resolved());
        for id in [5u64, 7] {
            let entry = entries.iter().find(|e| e.source_id == id).unwrap();
            assert_eq!(entry.identity, Identity::Unresolved);
        }

        let log = bus.get_event_log();
        let skips = log.iter().filter(|e| e.event_type == "EntrySkipped").count();
        assert_eq!(skips, 2);
        assert_eq!(
            log.iter()
                .filter(|e| e.event_type == "SelectionQueueCompleted")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_skip_all_without_a_queue_is_a_quiet_no_op() {
        let (service, _, _) = setup();

        assert_eq!(service.skip_all(USER).await.unwrap(), Decision::Idle);

        // Idempotent after a completed run too.
        service.start(USER, vec![ambiguous_movie(1, 2)]).await.unwrap();
        completed(service.skip_all(USER).await.unwrap());
        assert_eq!(service.skip_all(USER).await.unwrap(), Decision::Idle);
    }

    // ========================================================================
    // COMPLETION
    // ========================================================================

    #[tokio::test]
    async fn test_completion_is_surfaced_exactly_once() {
        let (service, _, _) = setup();
        service.start(USER, vec![ambiguous_movie(1, 2)]).await.unwrap();

        let entries = completed(service.confirm(USER, 0, 0).await.unwrap());
        assert_eq!(entries.len(), 1);

        // The queue is gone: no prompt, and further actions are stale.
        assert!(service.current_prompt(USER).await.unwrap().is_none());
        let err = service.confirm(USER, 1, 0).await.unwrap_err();
        assert!(is_invalid_selection(&err));
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    #[tokio::test]
    async fn test_a_fresh_service_resumes_from_the_stored_session() {
        let (service, store, _) = setup();
        service.start(USER, mixed_entries()).await.unwrap();
        service.confirm(USER, 0, 0).await.unwrap();
        drop(service);

        let resumed = DisambiguationService::new(
            Arc::clone(&store) as Arc<dyn SessionRepository>,
            Arc::new(EventBus::new()),
        );

        let prompt = resumed.current_prompt(USER).await.unwrap().unwrap();
        assert_eq!(prompt_position(&prompt), 1);
        assert_eq!(prompt_title(&prompt), "Ambiguous 5");

        let third = next(resumed.skip_current(USER, 1).await.unwrap());
        assert_eq!(prompt_position(&third), 2);
    }

    #[tokio::test]
    async fn test_users_do_not_share_queues() {
        let (service, _, _) = setup();
        service.start(USER, vec![ambiguous_movie(1, 2)]).await.unwrap();

        assert!(service.current_prompt(99).await.unwrap().is_none());
        let err = service.confirm(99, 0, 0).await.unwrap_err();
        assert!(is_invalid_selection(&err));

        // The original user's queue is untouched.
        assert!(service.current_prompt(USER).await.unwrap().is_some());
    }

    // ========================================================================
    // CREDENTIAL HAND-OFF
    // ========================================================================

    #[tokio::test]
    async fn test_credential_round_trip() {
        let (service, _, _) = setup();

        let prompt = service.request_credential(USER).await.unwrap();
        assert_eq!(prompt, Prompt::CredentialRequest);

        assert!(service.supply_credential(USER, "a-token".to_string()).await.unwrap());
        assert_eq!(
            service.credential(USER).await.unwrap().as_deref(),
            Some("a-token")
        );
    }

    #[tokio::test]
    async fn test_unsolicited_token_is_treated_as_ordinary_chat() {
        let (service, _, _) = setup();

        assert!(!service.supply_credential(USER, "noise".to_string()).await.unwrap());
        assert!(service.credential(USER).await.unwrap().is_none());

        // A second send after consuming the request is ordinary chat again.
        service.request_credential(USER).await.unwrap();
        assert!(service.supply_credential(USER, "real".to_string()).await.unwrap());
        assert!(!service.supply_credential(USER, "late".to_string()).await.unwrap());
        assert_eq!(
            service.credential(USER).await.unwrap().as_deref(),
            Some("real")
        );
    }

    #[tokio::test]
    async fn test_credential_dialogue_does_not_disturb_an_active_queue() {
        let (service, _, _) = setup();
        service.start(USER, vec![ambiguous_movie(1, 2), ambiguous_movie(2, 2)]).await.unwrap();

        service.request_credential(USER).await.unwrap();
        service.supply_credential(USER, "tok".to_string()).await.unwrap();

        let prompt = service.current_prompt(USER).await.unwrap().unwrap();
        assert_eq!(prompt_position(&prompt), 0);
        assert_eq!(prompt_title(&prompt), "Ambiguous 1");
    }
}

// src/services/resolution_pipeline.rs
//
// Resolution Pipeline - Identity Resolution Orchestrator
//
// Chains four lookup sources over a working set of catalog entries,
// narrowing the set at each stage:
//   1. Local reference table  (fast, bounded coverage, sets IMDb id)
//   2. Cross-reference graph  (batched, free, exact-match, sets TMDB id)
//   3. Commercial catalog     (token-gated, throttled, sets TMDB id)
//   4. Fuzzy search           (ranked candidates only, never sets ids)
//
// CRITICAL RULES:
// - Consumes entries, produces fresh records: enrichment never mutates
// - Deterministic given identical external responses
// - Series never reach a lookup stage
// - A stage with an empty subset makes no external calls
// - Nothing here is fatal to the run: the worst outcome for an entry is
//   "remains unresolved", which is a reportable terminal state
// - Holds no cross-call state: re-invoking after a credential pause picks
//   up exactly where the working set left off

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;

use crate::domain::{CatalogEntry, MediaKind};
use crate::error::AppResult;
use crate::events::{EventBus, PipelineCompleted, PipelinePaused, StageCompleted};
use crate::integrations::{CommercialCatalog, CrossRefGraph, FuzzySearch};
use crate::repositories::ReferenceRepository;

const STAGE_LOCAL_REFERENCE: &str = "local_reference";
const STAGE_CROSS_REFERENCE: &str = "cross_reference_graph";
const STAGE_COMMERCIAL_CATALOG: &str = "commercial_catalog";
const STAGE_FUZZY_SEARCH: &str = "fuzzy_search";

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Every stage ran; each entry is in exactly one terminal state
    /// (Resolved / Ambiguous / Unresolved).
    Complete(Vec<CatalogEntry>),

    /// The commercial catalog stage needs a user-supplied token. Carries
    /// the partially-resolved set so the caller can re-invoke `resolve`
    /// with it once a token arrives; stage 1–2 results are preserved in it.
    CredentialRequired(Vec<CatalogEntry>),
}

pub struct ResolutionPipeline {
    reference_repo: Arc<dyn ReferenceRepository>,
    cross_ref_graph: Arc<dyn CrossRefGraph>,
    commercial_catalog: Arc<dyn CommercialCatalog>,
    fuzzy_search: Arc<dyn FuzzySearch>,
    event_bus: Arc<EventBus>,
}

impl ResolutionPipeline {
    pub fn new(
        reference_repo: Arc<dyn ReferenceRepository>,
        cross_ref_graph: Arc<dyn CrossRefGraph>,
        commercial_catalog: Arc<dyn CommercialCatalog>,
        fuzzy_search: Arc<dyn FuzzySearch>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            reference_repo,
            cross_ref_graph,
            commercial_catalog,
            fuzzy_search,
            event_bus,
        }
    }

    /// Runs the stages in fixed order over the given entries.
    ///
    /// `credential` gates the commercial catalog stage: when it is absent
    /// and that stage still has work, the run pauses and returns
    /// [`PipelineOutcome::CredentialRequired`] with the set as resolved so
    /// far.
    pub async fn resolve(
        &self,
        entries: Vec<CatalogEntry>,
        credential: Option<&str>,
    ) -> AppResult<PipelineOutcome> {
        // Keyed by source_id so stage results merge back deterministically.
        let mut working: BTreeMap<u64, CatalogEntry> = entries
            .into_iter()
            .map(|entry| (entry.source_id, entry))
            .collect();

        self.run_local_reference(&mut working);
        self.run_cross_reference(&mut working).await;

        let pending = Self::stage_targets(&working);
        if !pending.is_empty() {
            match credential {
                Some(token) => self.run_commercial_catalog(&mut working, token).await,
                None => {
                    log::info!(
                        "{}: pausing, {} entries need the token-gated stage",
                        STAGE_COMMERCIAL_CATALOG,
                        pending.len()
                    );
                    self.event_bus.emit(PipelinePaused::new(pending.len()));
                    return Ok(PipelineOutcome::CredentialRequired(
                        working.into_values().collect(),
                    ));
                }
            }
        } else {
            self.event_bus
                .emit(StageCompleted::new(STAGE_COMMERCIAL_CATALOG, 0, 0));
        }

        self.run_fuzzy_search(&mut working).await;

        let final_entries: Vec<CatalogEntry> = working.into_values().collect();

        let resolved = final_entries.iter().filter(|e| e.is_resolved()).count();
        let ambiguous = final_entries
            .iter()
            .filter(|e| e.identity.is_ambiguous())
            .count();
        let unresolved = final_entries.len() - resolved - ambiguous;

        self.event_bus.emit(PipelineCompleted::new(
            final_entries.len(),
            resolved,
            ambiguous,
            unresolved,
        ));

        Ok(PipelineOutcome::Complete(final_entries))
    }

    // ========================================================================
    // STAGES
    // ========================================================================

    /// Stage filter: only unresolved movies are ever sent to a lookup
    /// source. Series stay in the working set for reporting but the target
    /// format cannot import them.
    fn needs_lookup(entry: &CatalogEntry) -> bool {
        !entry.identity.is_resolved() && entry.kind == MediaKind::Movie
    }

    fn stage_targets(working: &BTreeMap<u64, CatalogEntry>) -> Vec<u64> {
        working
            .values()
            .filter(|e| Self::needs_lookup(e))
            .map(|e| e.source_id)
            .collect()
    }

    fn run_local_reference(&self, working: &mut BTreeMap<u64, CatalogEntry>) {
        let targets = Self::stage_targets(working);
        let attempted = targets.len();
        let mut newly_resolved = 0;

        for source_id in targets {
            match self.reference_repo.imdb_id_for(source_id) {
                Ok(Some(imdb_id)) => {
                    if let Some(entry) = working.remove(&source_id) {
                        working.insert(source_id, entry.with_imdb_id(imdb_id));
                        newly_resolved += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    // The local store being broken is never fatal; the
                    // entry just moves on to the next stage.
                    log::warn!(
                        "{}: lookup failed for id {}: {}",
                        STAGE_LOCAL_REFERENCE,
                        source_id,
                        e
                    );
                }
            }
        }

        self.report_stage(STAGE_LOCAL_REFERENCE, attempted, newly_resolved);
    }

    async fn run_cross_reference(&self, working: &mut BTreeMap<u64, CatalogEntry>) {
        let targets = Self::stage_targets(working);
        let attempted = targets.len();
        let mut newly_resolved = 0;

        if !targets.is_empty() {
            let mappings = self.cross_ref_graph.tmdb_mappings(&targets).await;

            for (source_id, tmdb_id) in mappings {
                if let Some(entry) = working.remove(&source_id) {
                    // Only fields this stage owns: a TMDB id
                    working.insert(source_id, entry.with_tmdb_id(tmdb_id));
                    newly_resolved += 1;
                }
            }
        }

        self.report_stage(STAGE_CROSS_REFERENCE, attempted, newly_resolved);
    }

    /// Deliberately serialized: the provider enforces a hard rate limit and
    /// the client spaces consecutive calls by a fixed delay.
    async fn run_commercial_catalog(&self, working: &mut BTreeMap<u64, CatalogEntry>, token: &str) {
        let targets = Self::stage_targets(working);
        let attempted = targets.len();
        let mut newly_resolved = 0;

        for source_id in targets {
            if let Some(tmdb_id) = self.commercial_catalog.tmdb_id_for(source_id, token).await {
                if let Some(entry) = working.remove(&source_id) {
                    working.insert(source_id, entry.with_tmdb_id(tmdb_id));
                    newly_resolved += 1;
                }
            }
        }

        self.report_stage(STAGE_COMMERCIAL_CATALOG, attempted, newly_resolved);
    }

    /// Never resolves anything by itself: title/year search is heuristic,
    /// so even a single candidate must be confirmed by a human.
    async fn run_fuzzy_search(&self, working: &mut BTreeMap<u64, CatalogEntry>) {
        let targets: Vec<(u64, String, Option<i32>)> = working
            .values()
            .filter(|e| Self::needs_lookup(e))
            .map(|e| (e.source_id, e.title.clone(), e.release_year))
            .collect();
        let attempted = targets.len();
        let mut gained_candidates = 0;

        let searches = targets.iter().map(|(source_id, title, year)| {
            let search = Arc::clone(&self.fuzzy_search);
            async move { (*source_id, search.candidates_for(title, *year).await) }
        });

        for (source_id, candidates) in join_all(searches).await {
            if let Some(entry) = working.remove(&source_id) {
                let enriched = entry.with_candidates(candidates);
                if enriched.identity.is_ambiguous() {
                    gained_candidates += 1;
                }
                working.insert(source_id, enriched);
            }
        }

        self.report_stage(STAGE_FUZZY_SEARCH, attempted, gained_candidates);
    }

    fn report_stage(&self, stage: &'static str, attempted: usize, newly_resolved: usize) {
        log::info!(
            "{}: {} attempted, {} enriched",
            stage,
            attempted,
            newly_resolved
        );
        self.event_bus
            .emit(StageCompleted::new(stage, attempted, newly_resolved));
    }
}

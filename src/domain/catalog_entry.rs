// src/domain/catalog_entry.rs
//
// Catalog Entry - the unit flowing through the resolution pipeline.
//
// CRITICAL INVARIANTS:
// - `source_id` is unique within a working set
// - Identity is a closed state space: Resolved / Ambiguous / Unresolved
// - Resolved always carries at least one cross-reference id
// - Ambiguous always carries a non-empty, ranked candidate list
// - Enrichment never mutates in place: `with_*` builders return new values

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Practical limit of a single-screen choice UI.
pub const MAX_CANDIDATES: usize = 9;

/// Kind of catalog entry. Series are carried through for reporting but the
/// target import format does not support them, so no lookup stage ever
/// receives one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Series,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Series => write!(f, "series"),
        }
    }
}

/// One ranked guess produced by the fuzzy-search stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub title: String,
    pub release_year: Option<i32>,
    pub tmdb_id: u64,
    pub popularity: Option<f64>,
    pub synopsis: Option<String>,
    pub poster_path: Option<String>,
}

impl CandidateMatch {
    /// Direct link to the movie page on TMDB.
    pub fn tmdb_url(&self) -> String {
        format!("https://www.themoviedb.org/movie/{}", self.tmdb_id)
    }
}

/// The identity status of an entry. Exactly one variant holds at any time;
/// after the pipeline completes this is the entry's terminal state unless
/// the disambiguation workflow settles an Ambiguous entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Identity {
    /// At least one cross-reference id is known.
    Resolved {
        imdb_id: Option<String>,
        tmdb_id: Option<u64>,
    },

    /// No id yet, but the fuzzy-search stage produced ranked candidates
    /// awaiting human confirmation.
    Ambiguous { candidates: Vec<CandidateMatch> },

    /// No id and no candidates.
    Unresolved,
}

impl Identity {
    /// Builds an Ambiguous identity from raw search results, enforcing the
    /// candidate invariants: sorted by popularity descending, deduplicated
    /// by TMDB id, capped at [`MAX_CANDIDATES`]. An empty list collapses to
    /// Unresolved.
    pub fn ambiguous(candidates: Vec<CandidateMatch>) -> Self {
        let ranked = rank_candidates(candidates);
        if ranked.is_empty() {
            Identity::Unresolved
        } else {
            Identity::Ambiguous { candidates: ranked }
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Identity::Resolved { .. })
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Identity::Ambiguous { .. })
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Identity::Unresolved)
    }

    pub fn imdb_id(&self) -> Option<&str> {
        match self {
            Identity::Resolved { imdb_id, .. } => imdb_id.as_deref(),
            _ => None,
        }
    }

    pub fn tmdb_id(&self) -> Option<u64> {
        match self {
            Identity::Resolved { tmdb_id, .. } => *tmdb_id,
            _ => None,
        }
    }

    /// Candidate list, empty unless Ambiguous.
    pub fn candidates(&self) -> &[CandidateMatch] {
        match self {
            Identity::Ambiguous { candidates } => candidates,
            _ => &[],
        }
    }
}

/// Sorts by popularity descending, drops duplicate TMDB ids (keeping the
/// more popular occurrence) and truncates to the UI cap.
fn rank_candidates(mut candidates: Vec<CandidateMatch>) -> Vec<CandidateMatch> {
    candidates.sort_by(|a, b| {
        let pa = a.popularity.unwrap_or(f64::NEG_INFINITY);
        let pb = b.popularity.unwrap_or(f64::NEG_INFINITY);
        pb.partial_cmp(&pa).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut seen: Vec<u64> = Vec::with_capacity(candidates.len());
    candidates.retain(|c| {
        if seen.contains(&c.tmdb_id) {
            false
        } else {
            seen.push(c.tmdb_id);
            true
        }
    });

    candidates.truncate(MAX_CANDIDATES);
    candidates
}

/// One watched/rated item from the source catalog, enriched through the
/// pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stable key from the source catalog, unique within a run
    pub source_id: u64,

    /// Best-effort title as extracted from the source pages
    pub title: String,

    /// Release year, when the source page carried one
    pub release_year: Option<i32>,

    /// User rating on the source's 1..=10 scale; 0 or absent means unrated
    pub user_rating: Option<u8>,

    /// ISO watched date, when known
    pub watched_date: Option<chrono::NaiveDate>,

    /// Movie or series
    pub kind: MediaKind,

    /// Current identity status
    pub identity: Identity,
}

impl CatalogEntry {
    /// Creates a fresh, unresolved entry.
    pub fn new(source_id: u64, title: String, kind: MediaKind) -> Self {
        Self {
            source_id,
            title,
            release_year: None,
            user_rating: None,
            watched_date: None,
            kind,
            identity: Identity::Unresolved,
        }
    }

    /// Direct link to the film/series page on the source catalog.
    pub fn source_url(&self) -> String {
        let segment = match self.kind {
            MediaKind::Movie => "film",
            MediaKind::Series => "series",
        };
        format!("https://www.kinopoisk.ru/{}/{}", segment, self.source_id)
    }

    /// Direct link to the movie page on TMDB, when resolved there.
    pub fn tmdb_url(&self) -> Option<String> {
        self.identity
            .tmdb_id()
            .map(|id| format!("https://www.themoviedb.org/movie/{}", id))
    }

    /// Direct link to the title page on IMDb, when resolved there.
    pub fn imdb_url(&self) -> Option<String> {
        self.identity
            .imdb_id()
            .map(|id| format!("https://www.imdb.com/title/{}", id))
    }

    pub fn is_resolved(&self) -> bool {
        self.identity.is_resolved()
    }

    /// Returns a new entry carrying the given IMDb id. Any TMDB id already
    /// resolved is preserved; pending candidates are discarded since the
    /// entry no longer needs confirmation.
    pub fn with_imdb_id(mut self, imdb_id: String) -> Self {
        let tmdb_id = self.identity.tmdb_id();
        self.identity = Identity::Resolved {
            imdb_id: Some(imdb_id),
            tmdb_id,
        };
        self
    }

    /// Returns a new entry carrying the given TMDB id, preserving a known
    /// IMDb id.
    pub fn with_tmdb_id(mut self, tmdb_id: u64) -> Self {
        let imdb_id = self.identity.imdb_id().map(str::to_owned);
        self.identity = Identity::Resolved {
            imdb_id,
            tmdb_id: Some(tmdb_id),
        };
        self
    }

    /// Returns a new entry carrying ranked candidates. A resolved entry is
    /// returned unchanged: candidates never downgrade a settled identity.
    pub fn with_candidates(mut self, candidates: Vec<CandidateMatch>) -> Self {
        if !self.identity.is_resolved() {
            self.identity = Identity::ambiguous(candidates);
        }
        self
    }

    /// Returns a new entry with the chosen candidate applied: title and
    /// TMDB id are copied, the release year only when the candidate knows
    /// it (a confirmed match never erases a previously known year), and the
    /// candidate list is cleared.
    pub fn confirmed(mut self, candidate: &CandidateMatch) -> Self {
        self.title = candidate.title.clone();
        if let Some(year) = candidate.release_year {
            self.release_year = Some(year);
        }
        self.identity = Identity::Resolved {
            imdb_id: None,
            tmdb_id: Some(candidate.tmdb_id),
        };
        self
    }

    /// Returns a new entry settled as Unresolved: identifiers untouched,
    /// pending candidates dropped. Used when the user skips an entry.
    pub fn settled_unresolved(mut self) -> Self {
        if self.identity.is_ambiguous() {
            self.identity = Identity::Unresolved;
        }
        self
    }
}

/// Validates CatalogEntry invariants
pub fn validate_catalog_entry(entry: &CatalogEntry) -> DomainResult<()> {
    if entry.title.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Catalog entry title cannot be empty".to_string(),
        ));
    }

    if let Some(rating) = entry.user_rating {
        if rating > 10 {
            return Err(DomainError::InvariantViolation(format!(
                "User rating {} exceeds the 0..=10 scale",
                rating
            )));
        }
    }

    match &entry.identity {
        Identity::Resolved { imdb_id, tmdb_id } => {
            if imdb_id.is_none() && tmdb_id.is_none() {
                return Err(DomainError::InvariantViolation(
                    "Resolved entry must carry at least one cross-reference id".to_string(),
                ));
            }
        }
        Identity::Ambiguous { candidates } => {
            if candidates.is_empty() {
                return Err(DomainError::InvariantViolation(
                    "Ambiguous entry must carry at least one candidate".to_string(),
                ));
            }
            if candidates.len() > MAX_CANDIDATES {
                return Err(DomainError::InvariantViolation(format!(
                    "Candidate list exceeds the cap of {}",
                    MAX_CANDIDATES
                )));
            }
        }
        Identity::Unresolved => {}
    }

    Ok(())
}

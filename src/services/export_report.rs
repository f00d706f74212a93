// src/services/export_report.rs
//
// Terminal-status statistics over a settled entry set. Presentation is the
// reporting collaborator's job; this only does the arithmetic.

use serde::{Deserialize, Serialize};

use crate::domain::{CatalogEntry, MediaKind};

/// What the export will and will not carry, for the final user report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportStats {
    /// All entries found in the uploaded profile
    pub total_entries: usize,
    /// Entries that will be exported (carry at least one id)
    pub exportable: usize,
    /// Entries left behind (no id at all)
    pub skipped: usize,
    /// Series among the skipped (the target format has none)
    pub series: usize,
    /// Movies no lookup source could identify
    pub unmatched_movies: usize,
    /// Exportable entries carrying a user rating
    pub rated: usize,
    /// Exportable entries without one
    pub unrated: usize,
    /// Mean user rating over the rated exportable entries, 0 when none
    pub average_rating: f64,
}

pub fn compute_export_stats(entries: &[CatalogEntry]) -> ExportStats {
    let has_rating = |e: &CatalogEntry| e.user_rating.map(|r| r > 0).unwrap_or(false);

    let exportable = entries.iter().filter(|e| e.is_resolved()).count();
    let skipped = entries.len() - exportable;
    let series = entries
        .iter()
        .filter(|e| e.kind == MediaKind::Series)
        .count();
    let unmatched_movies = entries
        .iter()
        .filter(|e| e.kind == MediaKind::Movie && !e.is_resolved())
        .count();

    let rated_entries: Vec<&CatalogEntry> = entries
        .iter()
        .filter(|e| e.is_resolved() && has_rating(e))
        .collect();
    let rated = rated_entries.len();
    let unrated = exportable - rated;

    let average_rating = if rated == 0 {
        0.0
    } else {
        let sum: u32 = rated_entries
            .iter()
            .map(|e| u32::from(e.user_rating.unwrap_or(0)))
            .sum();
        f64::from(sum) / rated as f64
    };

    ExportStats {
        total_entries: entries.len(),
        exportable,
        skipped,
        series,
        unmatched_movies,
        rated,
        unrated,
        average_rating,
    }
}

// src/repositories/reference_repository.rs

use rusqlite::params;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::db::ConnectionPool;
use crate::error::{AppError, AppResult};

/// Offline lookup of IMDb identifiers keyed by source catalog id.
///
/// Backed by a mapping table shipped with the service, so coverage is
/// bounded but lookups are fast and free.
#[cfg_attr(test, automock)]
pub trait ReferenceRepository: Send + Sync {
    fn imdb_id_for(&self, source_id: u64) -> AppResult<Option<String>>;
}

pub struct SqliteReferenceRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteReferenceRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

impl ReferenceRepository for SqliteReferenceRepository {
    fn imdb_id_for(&self, source_id: u64) -> AppResult<Option<String>> {
        let conn = self.pool.get()?;

        // Historical schema: the `tmdbId` column of `kinopoisk_mapping`
        // actually stores the IMDb id in the ttXXXXXXX format.
        let mut stmt = conn.prepare(
            "SELECT tmdbId AS imdbId FROM kinopoisk_mapping WHERE kinopoiskId = ?1 LIMIT 1",
        )?;

        match stmt.query_row(params![source_id], |row| row.get::<_, String>("imdbId")) {
            Ok(imdb_id) => Ok(Some(imdb_id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

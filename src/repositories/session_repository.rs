// src/repositories/session_repository.rs

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[cfg(test)]
use mockall::automock;

use crate::domain::UserSession;
use crate::error::AppResult;

/// Key-value persistence for per-user sessions.
///
/// The workflow writes the session back after every transition, so any
/// implementation must round-trip [`UserSession`] losslessly. Keys are user
/// ids; sessions of different users never interact.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn get(&self, user_id: i64) -> AppResult<Option<UserSession>>;
    async fn save(&self, user_id: i64, session: &UserSession) -> AppResult<()>;
    async fn delete(&self, user_id: i64) -> AppResult<()>;
}

/// In-memory store for local development and tests.
///
/// Values are kept JSON-serialized so the semantics match an external
/// key-value backend: what you read back is what survived serialization,
/// not a shared in-process object.
pub struct MemorySessionRepository {
    data: RwLock<HashMap<i64, String>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn get(&self, user_id: i64) -> AppResult<Option<UserSession>> {
        let data = self.data.read().await;
        match data.get(&user_id) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, user_id: i64, session: &UserSession) -> AppResult<()> {
        let json = serde_json::to_string(session)?;
        let mut data = self.data.write().await;
        data.insert(user_id, json);
        Ok(())
    }

    async fn delete(&self, user_id: i64) -> AppResult<()> {
        let mut data = self.data.write().await;
        data.remove(&user_id);
        Ok(())
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tracing::{debug, warn};

use super::{MemorySessionStore, SessionRecord, SessionStore};
use crate::{
    db::{errors::Result, models::user_sessions::UserSessionCreateDBRequest, store::SessionBackend},
    types::{SessionToken, UserId, abbrev_token, abbrev_uuid},
};

/// Memory map with write-through to a durable backend.
///
/// Memory is a cache in front of the backend: a miss falls back to the backend and repopulates
/// memory, so sessions survive a restart. No map guard is held across a backend call.
///
/// A repopulating lookup can race a destroy of the same token: the lookup reads the row, the
/// destroy deletes it, and the lookup then caches what it read. Every destroy bumps
/// `destroy_epoch`, and a lookup that cached a row re-checks the epoch afterwards, dropping its
/// entry and reading again if a destroy happened meanwhile.
pub struct PersistedSessionStore<B> {
    memory: MemorySessionStore,
    backend: B,
    destroy_epoch: AtomicU64,
}

impl<B: SessionBackend> PersistedSessionStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            memory: MemorySessionStore::new(),
            backend,
            destroy_epoch: AtomicU64::new(0),
        }
    }

    pub fn memory(&self) -> &MemorySessionStore {
        &self.memory
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait::async_trait]
impl<B: SessionBackend> SessionStore for PersistedSessionStore<B> {
    async fn create(&self, owner: UserId) -> Result<SessionToken> {
        let created_at = Utc::now();
        let token = self.memory.insert_new(SessionRecord::new(owner, created_at));

        let request = UserSessionCreateDBRequest {
            user_id: owner,
            session_id: token.clone(),
            created_at,
        };
        if let Err(e) = self.backend.insert(&request).await {
            // Never leave a session that exists only in memory
            self.memory.remove(&token);
            warn!(user_id = %abbrev_uuid(&owner), "Failed to persist session: {e}");
            return Err(e);
        }

        debug!(user_id = %abbrev_uuid(&owner), session = %abbrev_token(&token), "Created persisted session");
        Ok(token)
    }

    async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>> {
        loop {
            if let Some(record) = self.memory.get(token) {
                return Ok(Some(record));
            }

            let epoch = self.destroy_epoch.load(Ordering::SeqCst);
            let Some(row) = self.backend.find_by_session_id(token).await? else {
                return Ok(None);
            };

            let record = SessionRecord::new(row.user_id, row.created_at);
            self.memory.put(row.session_id, record);

            // Any destroy that bumps the epoch after this check also removes the entry above
            if self.destroy_epoch.load(Ordering::SeqCst) == epoch {
                debug!(session = %abbrev_token(token), "Recovered session from durable store");
                return Ok(Some(record));
            }

            debug!(session = %abbrev_token(token), "Session destroyed during recovery, reading again");
            self.memory.remove(token);
        }
    }

    async fn destroy(&self, token: &str) -> Result<bool> {
        // Durable row first: if that fails the session stays intact in both places
        let in_backend = self.backend.delete_by_session_id(token).await?;
        self.destroy_epoch.fetch_add(1, Ordering::SeqCst);
        let in_memory = self.memory.remove(token);
        Ok(in_backend || in_memory)
    }
}

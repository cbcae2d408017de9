use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use tracing::debug;

use super::{SessionRecord, SessionStore, generate_session_token};
use crate::{
    db::errors::Result,
    types::{SessionToken, UserId, abbrev_token, abbrev_uuid},
};

/// In-process session table.
///
/// DashMap shards give per-key atomicity; no guard is held past a single call.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<SessionToken, SessionRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` under a newly generated token that is not currently live.
    pub fn insert_new(&self, record: SessionRecord) -> SessionToken {
        loop {
            let token = generate_session_token();
            if let Entry::Vacant(slot) = self.sessions.entry(token.clone()) {
                slot.insert(record);
                return token;
            }
        }
    }

    pub fn get(&self, token: &str) -> Option<SessionRecord> {
        self.sessions.get(token).map(|entry| *entry.value())
    }

    /// Places a known record, e.g. one recovered from durable storage.
    pub fn put(&self, token: SessionToken, record: SessionRecord) {
        self.sessions.insert(token, record);
    }

    pub fn remove(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, owner: UserId) -> Result<SessionToken> {
        let token = self.insert_new(SessionRecord::new(owner, Utc::now()));
        debug!(user_id = %abbrev_uuid(&owner), session = %abbrev_token(&token), "Created session");
        Ok(token)
    }

    async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>> {
        Ok(self.get(token))
    }

    async fn destroy(&self, token: &str) -> Result<bool> {
        Ok(self.remove(token))
    }
}

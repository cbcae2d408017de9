use chrono::{DateTime, Utc};
use tracing::debug;

use super::{SessionRecord, SessionStore};
use crate::{
    config::SessionDuration,
    db::errors::Result,
    types::{SessionToken, UserId, abbrev_token},
};

/// Expiry policy layered over another store.
///
/// A record is live while `now <= created_at + duration`. Once past that instant, or when the
/// record has no creation time, the lookup destroys it and reports no session. A non-positive
/// duration disables expiry entirely.
#[derive(Debug)]
pub struct ExpiringSessionStore<S> {
    inner: S,
    duration: SessionDuration,
}

impl<S: SessionStore> ExpiringSessionStore<S> {
    pub fn new(inner: S, duration: SessionDuration) -> Self {
        Self { inner, duration }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn duration(&self) -> SessionDuration {
        self.duration
    }

    /// [`SessionStore::lookup`] evaluated at an explicit instant.
    pub async fn lookup_at(&self, token: &str, now: DateTime<Utc>) -> Result<Option<SessionRecord>> {
        let Some(record) = self.inner.lookup(token).await? else {
            return Ok(None);
        };

        let Some(ttl) = self.duration.ttl() else {
            return Ok(Some(record));
        };

        let Some(created_at) = record.created_at else {
            debug!(session = %abbrev_token(token), "Session has no creation time, treating as expired");
            self.inner.destroy(token).await?;
            return Ok(None);
        };

        let Some(expires_at) = created_at.checked_add_signed(ttl) else {
            return Ok(Some(record));
        };
        if now > expires_at {
            debug!(session = %abbrev_token(token), %expires_at, "Session expired");
            self.inner.destroy(token).await?;
            return Ok(None);
        }

        Ok(Some(SessionRecord {
            expires_at: Some(expires_at),
            ..record
        }))
    }
}

#[async_trait::async_trait]
impl<S: SessionStore> SessionStore for ExpiringSessionStore<S> {
    async fn create(&self, owner: UserId) -> Result<SessionToken> {
        self.inner.create(owner).await
    }

    async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>> {
        self.lookup_at(token, Utc::now()).await
    }

    async fn destroy(&self, token: &str) -> Result<bool> {
        self.inner.destroy(token).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::*;
    use crate::auth::session::MemorySessionStore;

    fn created_at(store: &ExpiringSessionStore<MemorySessionStore>, token: &str) -> DateTime<Utc> {
        store.inner().get(token).and_then(|r| r.created_at).expect("record has creation time")
    }

    #[tokio::test]
    async fn test_session_valid_until_duration_elapses() {
        let store = ExpiringSessionStore::new(MemorySessionStore::new(), SessionDuration::from_secs(5));
        let owner = Uuid::new_v4();
        let token = store.create(owner).await.unwrap();
        let t = created_at(&store, &token);

        let record = store.lookup_at(&token, t + Duration::seconds(4)).await.unwrap().expect("still live at T+4s");
        assert_eq!(record.owner, owner);
        assert_eq!(record.expires_at, Some(t + Duration::seconds(5)));

        // Exactly at the expiry instant is still live
        assert!(store.lookup_at(&token, t + Duration::seconds(5)).await.unwrap().is_some());

        assert!(store.lookup_at(&token, t + Duration::seconds(6)).await.unwrap().is_none());
        // Expired lookups remove the record
        assert!(store.inner().get(&token).is_none());
        assert!(store.lookup_at(&token, t).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_zero_duration_never_expires() {
        let store = ExpiringSessionStore::new(MemorySessionStore::new(), SessionDuration::from_secs(0));
        let token = store.create(Uuid::new_v4()).await.unwrap();
        let t = created_at(&store, &token);

        let record = store
            .lookup_at(&token, t + Duration::days(3650))
            .await
            .unwrap()
            .expect("no expiry with zero duration");
        assert!(record.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_negative_duration_never_expires() {
        let store = ExpiringSessionStore::new(MemorySessionStore::new(), SessionDuration::from_secs(-30));
        let token = store.create(Uuid::new_v4()).await.unwrap();
        let t = created_at(&store, &token);

        assert!(store.lookup_at(&token, t + Duration::hours(1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unrepresentable_expiry_never_expires() {
        for secs in [10_000_000_000_000, i64::MAX] {
            let store = ExpiringSessionStore::new(MemorySessionStore::new(), SessionDuration::from_secs(secs));
            let token = store.create(Uuid::new_v4()).await.unwrap();
            let t = created_at(&store, &token);

            let record = store
                .lookup_at(&token, t + Duration::days(3650))
                .await
                .unwrap()
                .expect("still live far in the future");
            assert!(record.expires_at.is_none());
        }
    }

    #[tokio::test]
    async fn test_missing_creation_time_is_expired() {
        let memory = MemorySessionStore::new();
        memory.put(
            "legacy".to_string(),
            SessionRecord {
                owner: Uuid::new_v4(),
                created_at: None,
                expires_at: None,
            },
        );
        let store = ExpiringSessionStore::new(memory, SessionDuration::from_secs(60));

        assert!(store.lookup("legacy").await.unwrap().is_none());
        assert!(store.inner().get("legacy").is_none());
    }

    #[tokio::test]
    async fn test_missing_creation_time_ignored_without_expiry() {
        let memory = MemorySessionStore::new();
        memory.put(
            "legacy".to_string(),
            SessionRecord {
                owner: Uuid::new_v4(),
                created_at: None,
                expires_at: None,
            },
        );
        let store = ExpiringSessionStore::new(memory, SessionDuration::default());

        assert!(store.lookup("legacy").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_destroy_delegates() {
        let store = ExpiringSessionStore::new(MemorySessionStore::new(), SessionDuration::from_secs(5));
        let token = store.create(Uuid::new_v4()).await.unwrap();

        assert!(store.destroy(&token).await.unwrap());
        assert!(!store.destroy(&token).await.unwrap());
        assert!(store.lookup(&token).await.unwrap().is_none());
    }
}

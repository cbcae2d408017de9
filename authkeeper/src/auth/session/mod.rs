//! Server-side session storage.
//!
//! A [`SessionStore`] maps opaque session tokens to [`SessionRecord`]s. Stores compose as
//! layers rather than subclasses:
//!
//! - [`MemorySessionStore`]: concurrent in-process map, the base layer
//! - [`PersistedSessionStore`]: memory map written through to a [`SessionBackend`]
//! - [`ExpiringSessionStore`]: wraps any store and denies records older than the configured
//!   duration
//!
//! Expiry is lazy: a record is checked, and removed if stale, only when it is looked up. No
//! background sweep exists.
//!
//! [`SessionBackend`]: crate::db::store::SessionBackend

use chrono::{DateTime, Utc};

use crate::{
    db::errors::Result,
    types::{SessionToken, UserId},
};

pub mod expiring;
pub mod memory;
pub mod persisted;

pub use expiring::ExpiringSessionStore;
pub use memory::MemorySessionStore;
pub use persisted::PersistedSessionStore;

/// State bound to a live session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRecord {
    pub owner: UserId,
    /// Missing creation time makes the record count as expired under an expiry policy.
    pub created_at: Option<DateTime<Utc>>,
    /// Filled in by [`ExpiringSessionStore`] when a duration is configured.
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn new(owner: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            owner,
            created_at: Some(created_at),
            expires_at: None,
        }
    }
}

/// Token to session mapping shared by all request handlers.
///
/// Errors are reserved for backing-store failures; an unknown token is `Ok(None)` or
/// `Ok(false)`.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Binds a fresh random token to `owner` and returns it.
    async fn create(&self, owner: UserId) -> Result<SessionToken>;

    async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>>;

    /// Removes the record. Returns whether anything was removed.
    async fn destroy(&self, token: &str) -> Result<bool>;
}

/// Session tokens are v4 UUIDs: 122 random bits from the OS CSPRNG.
pub(crate) fn generate_session_token() -> SessionToken {
    uuid::Uuid::new_v4().to_string()
}

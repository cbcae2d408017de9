//! Pool-backed stores consumed by the auth core.
//!
//! The auth layer never touches repositories directly. It talks to [`UserStore`] (identity
//! records) and [`SessionBackend`] (durable session rows), which acquire a connection per call
//! so no connection is held across unrelated awaits.

use sqlx::SqlitePool;
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::{Repository, UserSessions, Users},
        models::{
            user_sessions::{UserSession, UserSessionCreateDBRequest},
            users::{User, UserCreateDBRequest, UserFilter, UserUpdateDBRequest},
        },
    },
    types::UserId,
};

/// Abstract user-record store.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// All users matching every set field of the filter.
    async fn find(&self, filter: &UserFilter) -> Result<Vec<User>>;

    async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>> {
        Ok(self.find(filter).await?.into_iter().next())
    }

    async fn save(&self, request: &UserCreateDBRequest) -> Result<User>;

    /// Applies all field changes in one write. Unknown ids yield [`DbError::NotFound`].
    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<User>;
}

/// Durable storage for session rows, keyed by session token.
#[async_trait::async_trait]
pub trait SessionBackend: Send + Sync {
    async fn insert(&self, request: &UserSessionCreateDBRequest) -> Result<UserSession>;

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<UserSession>>;

    async fn delete_by_session_id(&self, session_id: &str) -> Result<bool>;
}

#[derive(Clone, Debug)]
pub struct SqlUserStore {
    pool: SqlitePool,
}

impl SqlUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for SqlUserStore {
    #[instrument(skip(self, filter), err)]
    async fn find(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).list(filter).await
    }

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn save(&self, request: &UserCreateDBRequest) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).create(request).await
    }

    #[instrument(skip(self, request), err)]
    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        let mut repo = Users::new(&mut conn);
        if request.is_empty() {
            return repo.get_by_id(id).await?.ok_or(DbError::NotFound);
        }
        repo.update(id, request).await
    }
}

#[derive(Clone, Debug)]
pub struct SqlSessionBackend {
    pool: SqlitePool,
}

impl SqlSessionBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionBackend for SqlSessionBackend {
    async fn insert(&self, request: &UserSessionCreateDBRequest) -> Result<UserSession> {
        let mut conn = self.pool.acquire().await?;
        UserSessions::new(&mut conn).create(request).await
    }

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<UserSession>> {
        let mut conn = self.pool.acquire().await?;
        UserSessions::new(&mut conn).get_by_session_id(session_id).await
    }

    async fn delete_by_session_id(&self, session_id: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        UserSessions::new(&mut conn).delete_by_session_id(session_id).await
    }
}

//! Database repository for durable session rows.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::user_sessions::{UserSession, UserSessionCreateDBRequest},
    },
    types::{SessionToken, UserId, abbrev_token, abbrev_uuid},
};

/// Filter for listing session rows
#[derive(Debug, Clone, Default)]
pub struct UserSessionFilter {
    pub user_id: Option<UserId>,
    pub session_id: Option<SessionToken>,
}

pub struct UserSessions<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for UserSessions<'c> {
    type CreateRequest = UserSessionCreateDBRequest;
    // Session rows are immutable once written
    type UpdateRequest = ();
    type Response = UserSession;
    type Id = Uuid;
    type Filter = UserSessionFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), session = %abbrev_token(&request.session_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let row = sqlx::query_as::<_, UserSession>(
            "INSERT INTO user_sessions (id, user_id, session_id, created_at) VALUES (?, ?, ?, ?) \
             RETURNING id, user_id, session_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.session_id)
        .bind(request.created_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let row = sqlx::query_as::<_, UserSession>("SELECT id, user_id, session_id, created_at FROM user_sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(row)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT id, user_id, session_id, created_at FROM user_sessions WHERE 1=1");
        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(session_id) = &filter.session_id {
            query.push(" AND session_id = ").push_bind(session_id.clone());
        }
        query.push(" ORDER BY created_at ASC");

        Ok(query.build_query_as::<UserSession>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update(&mut self, id: Self::Id, _request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Nothing to change on a session row, so this is a fetch
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}

impl<'c> UserSessions<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, session_id), fields(session = %abbrev_token(session_id)), err)]
    pub async fn get_by_session_id(&mut self, session_id: &str) -> Result<Option<UserSession>> {
        let row = sqlx::query_as::<_, UserSession>(
            "SELECT id, user_id, session_id, created_at FROM user_sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self, session_id), fields(session = %abbrev_token(session_id)), err)]
    pub async fn delete_by_session_id(&mut self, session_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

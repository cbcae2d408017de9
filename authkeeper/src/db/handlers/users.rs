//! Database repository for users.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::users::{User, UserCreateDBRequest, UserFilter, UserUpdateDBRequest},
    },
    types::{UserId, abbrev_uuid},
};

const USER_COLUMNS: &str = "id, email, password_hash, session_id, reset_token, created_at, updated_at";

pub struct Users<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = User;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        // Always generate a new ID for users
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1=1"));

        if let Some(id) = filter.id {
            query.push(" AND id = ").push_bind(id);
        }
        if let Some(email) = &filter.email {
            query.push(" AND email = ").push_bind(email.clone());
        }
        if let Some(session_id) = &filter.session_id {
            query.push(" AND session_id = ").push_bind(session_id.clone());
        }
        if let Some(reset_token) = &filter.reset_token {
            query.push(" AND reset_token = ").push_bind(reset_token.clone());
        }
        query.push(" ORDER BY created_at ASC");

        let users = query.build_query_as::<User>().fetch_all(&mut *self.db).await?;
        Ok(users)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Applies every set field in a single statement, so a password change and a reset token
    /// clear either both land or neither does.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE users SET updated_at = ");
        query.push_bind(Utc::now());

        if let Some(password_hash) = &request.password_hash {
            query.push(", password_hash = ").push_bind(password_hash.clone());
        }
        if let Some(session_id) = &request.session_id {
            query.push(", session_id = ").push_bind(session_id.clone());
        }
        if let Some(reset_token) = &request.reset_token {
            query.push(", reset_token = ").push_bind(reset_token.clone());
        }

        query.push(" WHERE id = ").push_bind(id);
        if let Some(expected) = &request.if_reset_token {
            query.push(" AND reset_token = ").push_bind(expected.clone());
        }
        query.push(format!(" RETURNING {USER_COLUMNS}"));

        query
            .build_query_as::<User>()
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        self.find_first(&UserFilter::by_email(email)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_pool;

    fn create_request(email: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&create_request("bob@example.com")).await.unwrap();
        assert_eq!(user.email, "bob@example.com");
        assert!(user.session_id.is_none());
        assert!(user.reset_token.is_none());

        let fetched = repo.get_by_id(user.id).await.unwrap().expect("user should exist");
        assert_eq!(fetched, user);

        let by_email = repo.get_user_by_email("bob@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&create_request("dup@example.com")).await.unwrap();
        let err = repo.create(&create_request("dup@example.com")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_sets_and_clears_nullable_fields() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        let user = repo.create(&create_request("carol@example.com")).await.unwrap();

        let updated = repo
            .update(
                user.id,
                &UserUpdateDBRequest {
                    session_id: Some(Some("session-1".to_string())),
                    reset_token: Some(Some("reset-1".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.session_id.as_deref(), Some("session-1"));
        assert_eq!(updated.reset_token.as_deref(), Some("reset-1"));
        assert_eq!(updated.password_hash, user.password_hash);

        let found = repo.list(&UserFilter::by_reset_token("reset-1")).await.unwrap();
        assert_eq!(found.len(), 1);

        let cleared = repo
            .update(
                user.id,
                &UserUpdateDBRequest {
                    password_hash: Some("$argon2id$other".to_string()),
                    reset_token: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.password_hash, "$argon2id$other");
        assert!(cleared.reset_token.is_none());
        assert_eq!(cleared.session_id.as_deref(), Some("session-1"));
    }

    #[tokio::test]
    async fn test_guarded_update_requires_current_reset_token() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        let user = repo.create(&create_request("erin@example.com")).await.unwrap();
        repo.update(
            user.id,
            &UserUpdateDBRequest {
                reset_token: Some(Some("reset-2".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let consume = |token: &str| UserUpdateDBRequest {
            password_hash: Some("$argon2id$reset".to_string()),
            reset_token: Some(None),
            if_reset_token: Some(token.to_string()),
            ..Default::default()
        };

        let err = repo.update(user.id, &consume("reset-1")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
        assert_eq!(repo.get_by_id(user.id).await.unwrap().unwrap().password_hash, user.password_hash);

        let updated = repo.update(user.id, &consume("reset-2")).await.unwrap();
        assert_eq!(updated.password_hash, "$argon2id$reset");
        assert!(updated.reset_token.is_none());

        // Consumed: the same guard no longer matches
        let err = repo.update(user.id, &consume("reset-2")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let err = repo
            .update(
                Uuid::new_v4(),
                &UserUpdateDBRequest {
                    session_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        let user = repo.create(&create_request("dave@example.com")).await.unwrap();

        assert!(repo.delete(user.id).await.unwrap());
        assert!(!repo.delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
    }
}

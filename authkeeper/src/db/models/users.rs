//! Database models for users.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{ResetToken, SessionToken, UserId};

/// Database entity model.
///
/// This is the identity every authenticator resolves to. The auth core only reads and compares
/// it; all writes go through [`crate::db::store::UserStore`].
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub session_id: Option<SessionToken>,
    pub reset_token: Option<ResetToken>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub password_hash: String,
}

/// Database request for updating a user.
///
/// Outer `None` leaves a column untouched; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub password_hash: Option<String>,
    pub session_id: Option<Option<SessionToken>>,
    pub reset_token: Option<Option<ResetToken>>,
    /// Apply the update only while the row still holds this reset token. A row that no longer
    /// does is reported as not found.
    pub if_reset_token: Option<ResetToken>,
}

impl UserUpdateDBRequest {
    /// Whether the request changes no column. The `if_reset_token` guard is not a change.
    pub fn is_empty(&self) -> bool {
        self.password_hash.is_none() && self.session_id.is_none() && self.reset_token.is_none()
    }
}

/// Filter for finding users. All set fields must match.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub id: Option<UserId>,
    pub email: Option<String>,
    pub session_id: Option<SessionToken>,
    pub reset_token: Option<ResetToken>,
}

impl UserFilter {
    pub fn by_id(id: UserId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn by_session_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Default::default()
        }
    }

    pub fn by_reset_token(reset_token: impl Into<String>) -> Self {
        Self {
            reset_token: Some(reset_token.into()),
            ..Default::default()
        }
    }
}

//! Database models for durable session rows.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{SessionToken, UserId};

/// One row per active session, looked up by `session_id`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserSession {
    pub id: Uuid,
    pub user_id: UserId,
    pub session_id: SessionToken,
    pub created_at: DateTime<Utc>,
}

/// Request for persisting a session row
#[derive(Debug, Clone)]
pub struct UserSessionCreateDBRequest {
    pub user_id: UserId,
    pub session_id: SessionToken,
    pub created_at: DateTime<Utc>,
}

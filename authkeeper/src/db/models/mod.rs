//! Database record models matching table schemas.
//!
//! These models are used by repositories to return query results and accept insertion/update
//! data. Each model struct matches a table in `migrations/` and derives `sqlx::FromRow`.
//!
//! - [`users`]: User accounts, password hashes, the identity-service session binding and the
//!   live password reset token
//! - [`user_sessions`]: Durable session rows backing the persisted session store

pub mod user_sessions;
pub mod users;

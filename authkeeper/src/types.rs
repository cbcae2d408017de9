//! Common type definitions shared across the auth and storage layers.
//!
//! # ID Types
//!
//! - [`UserId`]: identity (user account) identifier
//! - [`SessionToken`]: opaque bearer credential carried in the session cookie
//! - [`ResetToken`]: opaque one-time credential authorizing a password change
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging
//! - [`abbrev_token`]: Abbreviate opaque tokens so full credentials never reach the logs

use uuid::Uuid;

pub type UserId = Uuid;
pub type SessionToken = String;
pub type ResetToken = String;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Abbreviate a bearer token for logging. Tokens are credentials, so only a short prefix is kept.
pub fn abbrev_token(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}…")
}

//! Errors from the credential pipeline.
//!
//! Authenticators collapse every variant except [`AuthError::Store`] into "no identity". The
//! variants stay distinct so callers and tests can tell which step rejected a credential.

use thiserror::Error;

use crate::db::errors::DbError;

/// Why a presented credential could not be parsed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedCredential {
    #[error("no credential supplied")]
    Missing,

    #[error("credential does not use the expected scheme")]
    WrongScheme,

    #[error("credential is not valid base64")]
    InvalidBase64,

    #[error("decoded credential is not valid UTF-8")]
    InvalidUtf8,

    #[error("decoded credential has no ':' separator")]
    MissingSeparator,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("malformed credential: {0}")]
    Malformed(#[from] MalformedCredential),

    /// No credential found on the request
    #[error("no credential presented")]
    Unauthenticated,

    /// Unknown principal or secret mismatch
    #[error("invalid credential")]
    InvalidCredential,

    /// Backing store failure, never treated as "absent"
    #[error(transparent)]
    Store(#[from] DbError),
}

impl AuthError {
    /// Whether this failure is an ordinary denial rather than an infrastructure fault.
    pub fn is_denial(&self) -> bool {
        !matches!(self, AuthError::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

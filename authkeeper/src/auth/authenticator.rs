//! Request authenticators.
//!
//! Every authenticator answers two questions about a request: does this path need a
//! credential ([`Authenticator::require_auth`]), and who is the caller
//! ([`Authenticator::resolve_identity`]). Parsing and lookup failures of any kind resolve to "no
//! identity"; only backing-store failures surface as errors.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::{
    basic,
    error::{AuthError, Result},
    password::PasswordHasher,
    paths::ExcludedPaths,
    request::RequestView,
    session::{ExpiringSessionStore, MemorySessionStore, PersistedSessionStore, SessionStore},
};
use crate::{
    db::{
        models::users::{User, UserFilter},
        store::{SqlSessionBackend, UserStore},
    },
    types::{SessionToken, UserId, abbrev_uuid},
};

/// Collapse a typed pipeline result into the external contract.
fn into_identity(result: Result<User>) -> Result<Option<User>> {
    match result {
        Ok(user) => Ok(Some(user)),
        Err(AuthError::Store(e)) => Err(AuthError::Store(e)),
        Err(denial) => {
            debug!("No identity resolved: {denial}");
            Ok(None)
        }
    }
}

#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    /// Whether `path` must carry a credential, given the exempt paths.
    fn require_auth(&self, path: Option<&str>, excluded_paths: &ExcludedPaths) -> bool {
        excluded_paths.require_auth(path)
    }

    /// Whether the request carries the kind of credential this authenticator reads.
    fn has_credential(&self, request: &RequestView) -> bool;

    /// The caller's identity, or `None` when no valid credential is present.
    ///
    /// `Err` is returned only when a backing store fails.
    async fn resolve_identity(&self, request: &RequestView) -> Result<Option<User>>;

    /// Starts a session for `user_id`. Authenticators without sessions return `None`.
    async fn create_session(&self, _user_id: UserId) -> Result<Option<SessionToken>> {
        Ok(None)
    }

    /// Ends the session named by the request's cookie. Returns whether one was removed.
    async fn destroy_session(&self, _request: &RequestView) -> Result<bool> {
        Ok(false)
    }

    /// Cookie carrying the session token, for session-based authenticators.
    fn session_cookie_name(&self) -> Option<&str> {
        None
    }
}

/// Never demands and never resolves a credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuthenticator;

#[async_trait::async_trait]
impl Authenticator for NullAuthenticator {
    fn require_auth(&self, _path: Option<&str>, _excluded_paths: &ExcludedPaths) -> bool {
        false
    }

    fn has_credential(&self, _request: &RequestView) -> bool {
        false
    }

    async fn resolve_identity(&self, _request: &RequestView) -> Result<Option<User>> {
        Ok(None)
    }
}

/// `Authorization: Basic` against the user store.
pub struct BasicAuthenticator {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl BasicAuthenticator {
    pub fn new(users: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    /// Typed form of [`Authenticator::resolve_identity`].
    #[instrument(skip_all, err(level = "debug"))]
    pub async fn authenticate(&self, request: &RequestView) -> Result<User> {
        let header = request.authorization_header().ok_or(AuthError::Unauthenticated)?;
        let credentials = basic::decode_header(Some(header))?;

        let user = self
            .users
            .find_one(&UserFilter::by_email(&credentials.identifier))
            .await?
            .ok_or(AuthError::InvalidCredential)?;

        let valid = self
            .hasher
            .verify_blocking(&credentials.secret, &user.password_hash)
            .await
            .unwrap_or_else(|e| {
                warn!("Password verification did not complete: {e}");
                false
            });
        if !valid {
            return Err(AuthError::InvalidCredential);
        }

        debug!(user_id = %abbrev_uuid(&user.id), "Basic credential accepted");
        Ok(user)
    }
}

#[async_trait::async_trait]
impl Authenticator for BasicAuthenticator {
    fn has_credential(&self, request: &RequestView) -> bool {
        request.authorization_header().is_some()
    }

    async fn resolve_identity(&self, request: &RequestView) -> Result<Option<User>> {
        into_identity(self.authenticate(request).await)
    }
}

/// Session cookie resolved through a [`SessionStore`].
///
/// The store decides where records live and whether they expire; see the aliases
/// [`ExpiringSessionAuthenticator`] and [`PersistedSessionAuthenticator`].
pub struct SessionAuthenticator<S = MemorySessionStore> {
    store: S,
    users: Arc<dyn UserStore>,
    cookie_name: String,
}

pub type ExpiringSessionAuthenticator = SessionAuthenticator<ExpiringSessionStore<MemorySessionStore>>;

pub type PersistedSessionAuthenticator<B = SqlSessionBackend> =
    SessionAuthenticator<ExpiringSessionStore<PersistedSessionStore<B>>>;

impl<S: SessionStore> SessionAuthenticator<S> {
    pub fn new(store: S, users: Arc<dyn UserStore>, cookie_name: impl Into<String>) -> Self {
        Self {
            store,
            users,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Typed form of [`Authenticator::resolve_identity`].
    #[instrument(skip_all, err(level = "debug"))]
    pub async fn authenticate(&self, request: &RequestView) -> Result<User> {
        let token = request.cookie(&self.cookie_name).ok_or(AuthError::Unauthenticated)?;
        let record = self.store.lookup(&token).await?.ok_or(AuthError::InvalidCredential)?;

        self.users
            .find_one(&UserFilter::by_id(record.owner))
            .await?
            .ok_or(AuthError::InvalidCredential)
    }
}

#[async_trait::async_trait]
impl<S: SessionStore> Authenticator for SessionAuthenticator<S> {
    fn has_credential(&self, request: &RequestView) -> bool {
        request.cookie(&self.cookie_name).is_some()
    }

    async fn resolve_identity(&self, request: &RequestView) -> Result<Option<User>> {
        into_identity(self.authenticate(request).await)
    }

    async fn create_session(&self, user_id: UserId) -> Result<Option<SessionToken>> {
        Ok(Some(self.store.create(user_id).await?))
    }

    async fn destroy_session(&self, request: &RequestView) -> Result<bool> {
        let Some(token) = request.cookie(&self.cookie_name) else {
            return Ok(false);
        };
        Ok(self.store.destroy(&token).await?)
    }

    fn session_cookie_name(&self) -> Option<&str> {
        Some(&self.cookie_name)
    }
}

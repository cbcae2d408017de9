//! Account lifecycle: registration, login, session binding and password reset.
//!
//! Sessions issued here are bound on the user row itself (`users.session_id`), one per user.
//! They are independent of the [`SessionStore`](super::session::SessionStore) layers used by
//! the request authenticators.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::{
    password::{PasswordHasher, generate_reset_token},
    session::generate_session_token,
};
use crate::{
    db::{
        errors::DbError,
        models::users::{User, UserCreateDBRequest, UserFilter, UserUpdateDBRequest},
        store::UserStore,
    },
    errors::{Error, Result},
    types::{ResetToken, SessionToken, UserId, abbrev_uuid},
};

const ALREADY_REGISTERED: &str = "email already registered";

#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.find_one(&UserFilter::by_email(email)).await?)
    }

    /// Creates an account. An existing email yields [`Error::AlreadyExists`] and leaves the
    /// stored account untouched.
    #[instrument(skip(self, password), err(level = "debug"))]
    pub async fn register(&self, email: &str, password: &str) -> Result<User> {
        if self.find_by_email(email).await?.is_some() {
            return Err(Error::AlreadyExists {
                message: ALREADY_REGISTERED.to_string(),
            });
        }

        let password_hash = self.hasher.hash_blocking(password).await?;
        let request = UserCreateDBRequest {
            email: email.to_string(),
            password_hash,
        };

        // A concurrent registration can still win the race to the unique index
        match self.users.save(&request).await {
            Ok(user) => {
                info!(user_id = %abbrev_uuid(&user.id), "Registered user");
                Ok(user)
            }
            Err(DbError::UniqueViolation { .. }) => Err(Error::AlreadyExists {
                message: ALREADY_REGISTERED.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// False for unknown emails and wrong passwords alike.
    #[instrument(skip(self, password), err)]
    pub async fn validate_login(&self, email: &str, password: &str) -> Result<bool> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(false);
        };
        self.hasher.verify_blocking(password, &user.password_hash).await
    }

    /// Binds a fresh session token to the account, replacing any previous one.
    #[instrument(skip(self), err)]
    pub async fn create_session(&self, email: &str) -> Result<Option<SessionToken>> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };

        let token = generate_session_token();
        self.users
            .update(
                user.id,
                &UserUpdateDBRequest {
                    session_id: Some(Some(token.clone())),
                    ..Default::default()
                },
            )
            .await?;
        debug!(user_id = %abbrev_uuid(&user.id), "Bound new session");
        Ok(Some(token))
    }

    #[instrument(skip_all, err)]
    pub async fn resolve_session(&self, token: Option<&str>) -> Result<Option<User>> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        Ok(self.users.find_one(&UserFilter::by_session_id(token)).await?)
    }

    /// Clears the session binding. Unknown users are a no-op.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn destroy_session(&self, user_id: UserId) -> Result<()> {
        let request = UserUpdateDBRequest {
            session_id: Some(None),
            ..Default::default()
        };
        match self.users.update(user_id, &request).await {
            Ok(_) | Err(DbError::NotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Issues a reset token, overwriting any earlier one for the same account.
    #[instrument(skip(self), err(level = "debug"))]
    pub async fn issue_reset_token(&self, email: &str) -> Result<ResetToken> {
        let user = self.find_by_email(email).await?.ok_or_else(|| Error::NotFound {
            message: format!("no user found for {email}"),
        })?;

        let token = generate_reset_token();
        self.users
            .update(
                user.id,
                &UserUpdateDBRequest {
                    reset_token: Some(Some(token.clone())),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %abbrev_uuid(&user.id), "Issued password reset token");
        Ok(token)
    }

    /// Sets the new password and consumes the reset token in one write.
    #[instrument(skip_all, err(level = "debug"))]
    pub async fn apply_reset(&self, reset_token: &str, new_password: &str) -> Result<()> {
        self.reset_password(None, reset_token, new_password).await
    }

    /// [`apply_reset`](Self::apply_reset), additionally requiring the token to belong to `email`.
    #[instrument(skip_all, err(level = "debug"))]
    pub async fn apply_reset_for(&self, email: &str, reset_token: &str, new_password: &str) -> Result<()> {
        self.reset_password(Some(email), reset_token, new_password).await
    }

    async fn reset_password(&self, email: Option<&str>, reset_token: &str, new_password: &str) -> Result<()> {
        let invalid = || Error::NotFound {
            message: "invalid reset token".to_string(),
        };
        if reset_token.is_empty() {
            return Err(invalid());
        }

        let user = self
            .users
            .find_one(&UserFilter::by_reset_token(reset_token))
            .await?
            .ok_or_else(invalid)?;
        if email.is_some_and(|email| email != user.email) {
            debug!(user_id = %abbrev_uuid(&user.id), "Reset token presented for another account");
            return Err(invalid());
        }

        let password_hash = self.hasher.hash_blocking(new_password).await?;
        // Guarded on the token so that of two concurrent resets only one is applied
        let request = UserUpdateDBRequest {
            password_hash: Some(password_hash),
            reset_token: Some(None),
            if_reset_token: Some(reset_token.to_string()),
            ..Default::default()
        };
        match self.users.update(user.id, &request).await {
            Ok(_) => {
                info!(user_id = %abbrev_uuid(&user.id), "Password reset applied");
                Ok(())
            }
            Err(DbError::NotFound) => Err(invalid()),
            Err(e) => Err(e.into()),
        }
    }
}

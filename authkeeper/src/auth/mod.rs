//! Authentication core.
//!
//! Requests are authenticated by an [`Authenticator`] selected at startup from
//! [`AuthType`]:
//!
//! | `auth_type`        | Authenticator                                 | Credential              |
//! |--------------------|-----------------------------------------------|-------------------------|
//! | `none`             | [`NullAuthenticator`]                         | none                    |
//! | `basic_auth`       | [`BasicAuthenticator`]                        | `Authorization: Basic`  |
//! | `session_auth`     | [`SessionAuthenticator`]                      | session cookie, memory  |
//! | `session_exp_auth` | [`ExpiringSessionAuthenticator`]              | cookie, memory + expiry |
//! | `session_db_auth`  | [`PersistedSessionAuthenticator`]             | cookie, durable + expiry|
//!
//! # Modules
//!
//! - [`basic`]: Basic header decoding
//! - [`paths`]: Excluded path matching
//! - [`request`]: Transport-neutral request view
//! - [`session`]: Session store layers
//! - [`authenticator`]: The authenticator trait and its variants
//! - [`identity`]: Registration, login, session binding and password reset
//! - [`password`]: Password hashing and verification using Argon2
//! - [`middleware`]: Route protection middleware and the `CurrentUser` extractor
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use authkeeper::api::models::users::CurrentUser;
//!
//! async fn protected_handler(user: CurrentUser) -> String {
//!     format!("Hello, {}!", user.email)
//! }
//! ```
//!
//! [`AuthType`]: crate::config::AuthType

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::info;

use crate::{
    config::{AuthConfig, AuthType},
    db::store::{SqlSessionBackend, UserStore},
};

pub mod authenticator;
pub mod basic;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod password;
pub mod paths;
pub mod request;
pub mod session;

pub use authenticator::{
    Authenticator, BasicAuthenticator, ExpiringSessionAuthenticator, NullAuthenticator, PersistedSessionAuthenticator,
    SessionAuthenticator,
};
use password::PasswordHasher;
use session::{ExpiringSessionStore, MemorySessionStore, PersistedSessionStore};

/// Build the authenticator named by `config.auth_type`, with its own session store.
pub fn build_authenticator(
    config: &AuthConfig,
    users: Arc<dyn UserStore>,
    pool: SqlitePool,
    hasher: PasswordHasher,
) -> Arc<dyn Authenticator> {
    let cookie_name = config.session.cookie_name.clone();
    let duration = config.session.duration;

    info!(
        auth_type = %config.auth_type,
        session_duration = duration.as_secs(),
        "Configuring authenticator"
    );

    match config.auth_type {
        AuthType::None => Arc::new(NullAuthenticator),
        AuthType::BasicAuth => Arc::new(BasicAuthenticator::new(users, hasher)),
        AuthType::SessionAuth => Arc::new(SessionAuthenticator::new(MemorySessionStore::new(), users, cookie_name)),
        AuthType::SessionExpAuth => {
            let store = ExpiringSessionStore::new(MemorySessionStore::new(), duration);
            Arc::new(ExpiringSessionAuthenticator::new(store, users, cookie_name))
        }
        AuthType::SessionDbAuth => {
            let store = ExpiringSessionStore::new(PersistedSessionStore::new(SqlSessionBackend::new(pool)), duration);
            Arc::new(PersistedSessionAuthenticator::new(store, users, cookie_name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::store::SqlUserStore,
        test_utils::{create_test_config, create_test_hasher, create_test_pool, create_test_user},
    };

    #[tokio::test]
    async fn test_build_each_auth_type() {
        let pool = create_test_pool().await;
        let user = create_test_user(&pool, "factory@example.com").await;
        let users: Arc<dyn UserStore> = Arc::new(SqlUserStore::new(pool.clone()));
        let mut config = create_test_config().auth;

        for (auth_type, has_sessions) in [
            (AuthType::None, false),
            (AuthType::BasicAuth, false),
            (AuthType::SessionAuth, true),
            (AuthType::SessionExpAuth, true),
            (AuthType::SessionDbAuth, true),
        ] {
            config.auth_type = auth_type;
            let authenticator = build_authenticator(&config, users.clone(), pool.clone(), create_test_hasher());

            let token = authenticator.create_session(user.id).await.unwrap();
            assert_eq!(token.is_some(), has_sessions, "{auth_type}");
            assert_eq!(authenticator.session_cookie_name().is_some(), has_sessions, "{auth_type}");
        }
    }
}

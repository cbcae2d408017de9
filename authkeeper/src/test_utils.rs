//! Test utilities for integration testing (available with `test-utils` feature).

use axum_test::TestServer;
use sqlx::SqlitePool;

use crate::{
    AppState, Application,
    auth::password::{Argon2Params, PasswordHasher},
    config::{Config, PasswordConfig},
    db::{
        handlers::{Repository, Users},
        models::users::{User, UserCreateDBRequest},
    },
};

/// Password of every user made by [`create_test_user`].
pub const TEST_PASSWORD: &str = "test-password-123";

/// Fresh migrated in-memory database, one connection.
pub async fn create_test_pool() -> SqlitePool {
    crate::connect_pool("sqlite::memory:")
        .await
        .expect("Failed to create test database")
}

/// Default configuration with Argon2 cheap enough for tests.
pub fn create_test_config() -> Config {
    let mut config = Config {
        database_url: "sqlite::memory:".to_string(),
        ..Default::default()
    };
    config.auth.password = PasswordConfig {
        argon2_memory_kib: 128,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..Default::default()
    };
    config
}

pub fn create_test_hasher() -> PasswordHasher {
    PasswordHasher::new(Argon2Params::from(&create_test_config().auth.password))
}

pub async fn create_test_user(pool: &SqlitePool, email: &str) -> User {
    let password_hash = create_test_hasher().hash(TEST_PASSWORD).expect("Failed to hash test password");
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);

    users_repo
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            password_hash,
        })
        .await
        .expect("Failed to create test user")
}

pub fn create_test_app_state(pool: SqlitePool, config: Config) -> AppState {
    AppState::from_config(pool, config)
}

/// Full application router over a fresh database.
pub async fn create_test_server(config: Config) -> (TestServer, AppState) {
    let pool = create_test_pool().await;
    create_test_app(pool, config).await
}

pub async fn create_test_app(pool: SqlitePool, config: Config) -> (TestServer, AppState) {
    Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application")
        .into_test_server()
}

//! # authkeeper: session and credential authentication for HTTP services
//!
//! `authkeeper` decides, for every inbound request, whether the path needs authentication and
//! which account the request belongs to. It also owns the account lifecycle: registration,
//! login sessions, profile lookup and password reset.
//!
//! ## Overview
//!
//! A request passes through the [`require_authentication`](auth::middleware::require_authentication)
//! middleware before reaching any `/api/v1` handler. The middleware asks the configured
//! [`Authenticator`](auth::Authenticator) whether the path is guarded, then whether the request
//! carries a credential, and finally which account that credential resolves to. The outcome is
//! a 401 (no credential), a 403 (credential resolves to nobody) or a
//! [`CurrentUser`](api::models::users::CurrentUser) stored in the request extensions.
//!
//! The authenticator is chosen at startup from `auth.auth_type`:
//!
//! - `none`: nothing is guarded
//! - `basic_auth`: `Authorization: Basic` credentials checked against stored Argon2 hashes
//! - `session_auth`: a session cookie resolved through an in-memory session store
//! - `session_exp_auth`: as above, with sessions that expire after `auth.session.duration`
//! - `session_db_auth`: expiring sessions that are also written to SQLite and survive restarts
//!
//! ### Core Components
//!
//! - **[`auth`]**: credential decoding, session stores, authenticators and the identity service
//! - **[`api`]**: Axum handlers and wire models
//! - **[`db`]**: SQLite repositories and the store traits the auth layer depends on
//! - **[`config`]**: YAML + environment configuration via figment
//! - **[`redact`]**: scrubbing of personal data from log lines
//! - **[`telemetry`]**: console logging with optional OTLP export
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use authkeeper::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = authkeeper::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     authkeeper::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod redact;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod test;

use std::{str::FromStr, sync::Arc};

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use bon::Builder;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};

pub use config::Config;

use crate::{
    api::handlers,
    auth::{
        Authenticator, build_authenticator, identity::IdentityService, middleware::require_authentication,
        password::PasswordHasher, paths::ExcludedPaths,
    },
    db::store::{SqlUserStore, UserStore},
};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .authenticator(authenticator)
///     .identity(identity)
///     .excluded_paths(excluded_paths)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub authenticator: Arc<dyn Authenticator>,
    pub identity: IdentityService,
    pub excluded_paths: ExcludedPaths,
}

impl AppState {
    /// Wire the authenticator and identity service from `config` over `pool`.
    pub fn from_config(pool: SqlitePool, config: Config) -> Self {
        let hasher = PasswordHasher::new((&config.auth.password).into());
        let users: Arc<dyn UserStore> = Arc::new(SqlUserStore::new(pool.clone()));
        let authenticator = build_authenticator(&config.auth, users.clone(), pool.clone(), hasher);
        let excluded_paths = ExcludedPaths::new(config.auth.excluded_paths.clone());

        AppState::builder()
            .db(pool)
            .authenticator(authenticator)
            .identity(IdentityService::new(users, hasher))
            .excluded_paths(excluded_paths)
            .config(config)
            .build()
    }
}

/// Get the authkeeper database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Open the SQLite pool, creating the database file if needed, and run migrations.
///
/// Each connection to an in-memory database sees its own empty database, so those pools are
/// limited to a single connection that is never recycled.
pub async fn connect_pool(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = if is_in_memory(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new().max_connections(8).connect_with(options).await?
    };

    migrator().run(&pool).await?;
    Ok(pool)
}

/// Build the application router.
///
/// Account routes sit at the root and check their own session cookie. Everything under
/// `/api/v1` goes through [`require_authentication`] first.
pub fn build_router(state: AppState) -> Router {
    let identity_routes = Router::new()
        .route("/", get(handlers::auth::index))
        .route("/users", post(handlers::auth::register))
        .route("/sessions", post(handlers::auth::login).delete(handlers::auth::logout))
        .route("/profile", get(handlers::auth::profile))
        .route(
            "/reset_password",
            post(handlers::auth::get_reset_password_token).put(handlers::auth::update_password),
        );

    let api_routes = Router::new()
        .route("/api/v1/status", get(handlers::status::status))
        .route("/api/v1/unauthorized", get(handlers::status::unauthorized))
        .route("/api/v1/forbidden", get(handlers::status::forbidden))
        .route("/api/v1/users/me", get(handlers::users::get_current_user))
        .route("/api/v1/auth_session/login", post(handlers::session_auth::login))
        .route("/api/v1/auth_session/logout", delete(handlers::session_auth::logout))
        .layer(from_fn_with_state(state.clone(), require_authentication));

    identity_routes.merge(api_routes).with_state(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Owns the router, the state and the database pool.
///
/// 1. [`Application::new`] connects the database, runs migrations and wires the authenticator
/// 2. [`Application::serve`] binds `host:port` and serves until the shutdown future resolves,
///    then closes the pool and flushes telemetry
pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Like [`Application::new`], reusing `pool` when given. The pool must already be migrated.
    pub async fn new_with_pool(config: Config, pool: Option<SqlitePool>) -> anyhow::Result<Self> {
        debug!("Starting authkeeper with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => pool,
            None => connect_pool(&config.database_url).await?,
        };

        let app_state = AppState::from_config(pool.clone(), config.clone());
        let router = build_router(app_state.clone());

        Ok(Self {
            router,
            app_state,
            config,
            pool,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.app_state
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> (axum_test::TestServer, AppState) {
        let server = axum_test::TestServer::new(self.router).expect("Failed to create test server");
        (server, self.app_state)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            auth_type = %self.config.auth.auth_type,
            "authkeeper listening on http://{}, available at http://localhost:{}", bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `AUTHKEEPER_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `AUTHKEEPER_` override YAML values
//! 3. **Deployment variables** - `SESSION_DURATION`, `SESSION_NAME`, `AUTH_TYPE` and
//!    `DATABASE_URL` map onto `auth.session.duration`, `auth.session.cookie_name`,
//!    `auth.auth_type` and `database_url`
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `AUTHKEEPER_AUTH__SESSION__COOKIE_NAME=_my_session_id` sets `auth.session.cookie_name`.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use authkeeper::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}", config.bind_address());
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! AUTHKEEPER_PORT=8080
//! DATABASE_URL="sqlite://authkeeper.db"
//! AUTH_TYPE=session_exp_auth
//! SESSION_NAME=_my_session_id
//! SESSION_DURATION=60
//! ```

use std::fmt;

use chrono::Duration;
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "AUTHKEEPER_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults, so an empty or missing YAML file yields a runnable service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// SQLite connection string; the file is created if missing
    pub database_url: String,
    /// Export traces over OTLP in addition to console logging
    pub enable_otel_export: bool,
    pub auth: AuthConfig,
}

/// Which authenticator guards the protected API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    None,
    BasicAuth,
    #[default]
    SessionAuth,
    SessionExpAuth,
    SessionDbAuth,
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthType::None => "none",
            AuthType::BasicAuth => "basic_auth",
            AuthType::SessionAuth => "session_auth",
            AuthType::SessionExpAuth => "session_exp_auth",
            AuthType::SessionDbAuth => "session_db_auth",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub auth_type: AuthType,
    /// Paths that skip authentication. `/status` and `/status/` are equivalent; a trailing `*`
    /// matches by prefix.
    pub excluded_paths: Vec<String>,
    pub session: SessionConfig,
    pub password: PasswordConfig,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Cookie carrying the session token
    pub cookie_name: String,
    /// Session lifetime in seconds, zero or negative for no expiry
    pub duration: SessionDuration,
    /// Set Secure flag on cookies (HTTPS only)
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("strict", "lax", or "none")
    pub cookie_same_site: String,
}

/// Password validation rules and hashing cost.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Argon2 memory cost in KiB (default: 19456 KiB = 19 MB)
    pub argon2_memory_kib: u32,
    /// Argon2 iterations (default: 2)
    pub argon2_iterations: u32,
    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

/// Session lifetime in whole seconds.
///
/// Deserializes leniently: integers are taken as is, numeric strings are parsed, and anything
/// else becomes 0, which disables expiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionDuration(i64);

impl SessionDuration {
    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// The lifetime, or `None` when sessions never expire.
    ///
    /// Values too large to represent as a [`Duration`] never expire either.
    pub fn ttl(&self) -> Option<Duration> {
        if self.0 > 0 { Duration::try_seconds(self.0) } else { None }
    }
}

impl<'de> Deserialize<'de> for SessionDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Seconds(i64),
            Text(String),
            Other(serde::de::IgnoredAny),
        }

        let secs = match Raw::deserialize(deserializer)? {
            Raw::Seconds(secs) => secs,
            Raw::Text(text) => text.trim().parse().unwrap_or(0),
            Raw::Other(_) => 0,
        };
        Ok(Self(secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            database_url: "sqlite://authkeeper.db".to_string(),
            enable_otel_export: false,
            auth: AuthConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_type: AuthType::default(),
            excluded_paths: vec![
                "/api/v1/status/".to_string(),
                "/api/v1/unauthorized/".to_string(),
                "/api/v1/forbidden/".to_string(),
                "/api/v1/auth_session/login/".to_string(),
            ],
            session: SessionConfig::default(),
            password: PasswordConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session_id".to_string(),
            duration: SessionDuration::default(),
            cookie_secure: false,
            cookie_same_site: "lax".to_string(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 1,
            argon2_memory_kib: 19456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |message: String| Error::Internal {
            operation: format!("Config validation: {message}"),
        };

        if self.database_url.trim().is_empty() {
            return Err(invalid("database_url cannot be empty".to_string()));
        }

        let session = &self.auth.session;
        if session.cookie_name.is_empty() || session.cookie_name.contains([';', '=', ' ', ',']) {
            return Err(invalid(format!("invalid session cookie name {:?}", session.cookie_name)));
        }

        if !matches!(session.cookie_same_site.to_ascii_lowercase().as_str(), "strict" | "lax" | "none") {
            return Err(invalid(format!(
                "cookie_same_site must be one of strict, lax or none, got {:?}",
                session.cookie_same_site
            )));
        }

        if session.cookie_same_site.eq_ignore_ascii_case("none") && !session.cookie_secure {
            return Err(invalid("cookie_same_site=none requires cookie_secure=true".to_string()));
        }

        let password = &self.auth.password;
        if password.min_length < 1 {
            return Err(invalid("password min_length must be at least 1".to_string()));
        }
        if password.argon2_iterations < 1 || password.argon2_parallelism < 1 {
            return Err(invalid("argon2 iterations and parallelism must be at least 1".to_string()));
        }
        if password.argon2_memory_kib < 8 * password.argon2_parallelism {
            return Err(invalid(format!(
                "argon2_memory_kib must be at least 8 x parallelism ({} KiB)",
                8 * password.argon2_parallelism
            )));
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Prefixed environment variables override the file; the config path itself is a CLI
            // concern
            .merge(Env::prefixed("AUTHKEEPER_").ignore(&["config"]).split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database_url".into()))
            .merge(Env::raw().only(&["AUTH_TYPE"]).map(|_| "auth.auth_type".into()))
            .merge(Env::raw().only(&["SESSION_NAME"]).map(|_| "auth.session.cookie_name".into()))
            .merge(Env::raw().only(&["SESSION_DURATION"]).map(|_| "auth.session.duration".into()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

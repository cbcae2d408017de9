//! HTTP request handlers for all API endpoints.
//!
//! - [`auth`]: Account routes (registration, login sessions, profile, password reset)
//! - [`session_auth`]: Login/logout through the configured authenticator
//! - [`status`]: Probe routes used to exercise the protection middleware
//! - [`users`]: The authenticated caller

pub mod auth;
pub mod session_auth;
pub mod status;
pub mod users;

use crate::config::SessionConfig;

fn cookie_attributes(config: &SessionConfig) -> String {
    let mut attributes = format!("Path=/; HttpOnly; SameSite={}", same_site(&config.cookie_same_site));
    if config.cookie_secure {
        attributes.push_str("; Secure");
    }
    attributes
}

fn same_site(raw: &str) -> &'static str {
    match raw.to_ascii_lowercase().as_str() {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

/// `Set-Cookie` value carrying a session token. The cookie outlives the browser session only
/// when the session itself expires.
pub(crate) fn session_cookie(config: &SessionConfig, token: &str) -> String {
    let mut cookie = format!("{}={}; {}", config.cookie_name, token, cookie_attributes(config));
    if let Some(ttl) = config.duration.ttl() {
        cookie.push_str(&format!("; Max-Age={}", ttl.num_seconds()));
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie.
pub(crate) fn clear_session_cookie(config: &SessionConfig) -> String {
    format!("{}=; {}; Max-Age=0", config.cookie_name, cookie_attributes(config))
}

//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Identity service** (`/`, `/users`, `/sessions`, `/profile`, `/reset_password`):
//!   registration, login sessions bound to the account and password reset. These routes check
//!   their own credentials.
//! - **Protected API** (`/api/v1/*`): guarded by the configured authenticator through
//!   [`crate::auth::middleware::require_authentication`], except for the excluded paths.

pub mod handlers;
pub mod models;

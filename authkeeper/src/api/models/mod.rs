//! Request/response data structures for the HTTP API.
//!
//! These are the wire shapes; database records live in [`crate::db::models`] and are converted
//! with `From` impls so password hashes and tokens never leak into responses.

pub mod auth;
pub mod users;

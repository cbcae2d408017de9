//! Database layer for data persistence and access.
//!
//! SQLx over SQLite, organised with the Repository pattern:
//!
//! ```text
//! ┌──────────────┐
//! │  auth / api  │  (identity service, session stores, handlers)
//! └──────┬───────┘
//!        ↓
//! ┌──────────────┐
//! │    store     │  (UserStore / SessionBackend seams over a pool)
//! └──────┬───────┘
//!        ↓
//! ┌──────────────┐
//! │ Repositories │  (db::handlers - queries per table)
//! └──────┬───────┘
//!        ↓
//! ┌──────────────┐
//! │    SQLite    │
//! └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Database record structures matching table schemas
//! - [`store`]: Pool-backed trait objects consumed by the auth core
//! - [`errors`]: Database-specific error types
//!
//! Migrations live in `migrations/` and are embedded at compile time; see
//! [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
pub mod store;

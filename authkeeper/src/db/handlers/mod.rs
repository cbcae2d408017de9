//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection (or transaction), builds its queries at runtime and
//! returns models from [`crate::db::models`].
//!
//! - [`Users`]: user accounts, session binding and reset tokens
//! - [`UserSessions`]: durable rows for the persisted session store
//!
//! ```ignore
//! use authkeeper::db::handlers::{Repository, Users};
//!
//! let mut tx = pool.begin().await?;
//! let mut repo = Users::new(&mut tx);
//! if let Some(user) = repo.get_user_by_email("user@example.com").await? {
//!     println!("{}", user.id);
//! }
//! tx.commit().await?;
//! ```

pub mod repository;
pub mod user_sessions;
pub mod users;

pub use repository::Repository;
pub use user_sessions::{UserSessionFilter, UserSessions};
pub use users::Users;

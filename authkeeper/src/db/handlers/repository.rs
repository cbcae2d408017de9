//! The CRUD seam shared by the SQLite table handlers.

use crate::db::errors::Result;

/// Data access for one table, borrowed over a single `SqliteConnection`.
///
/// Handlers never open their own connections; callers acquire one from the pool (or a
/// transaction) and lend it for the duration of the calls. Absence is a value, not an error:
/// lookups return `Ok(None)` and deletes return `Ok(false)`. Only [`update`](Self::update) turns
/// "no such row" into [`DbError::NotFound`](crate::db::errors::DbError::NotFound), since it has
/// nothing else to return.
#[async_trait::async_trait]
pub trait Repository: Send {
    type CreateRequest: Sync;
    /// Column changes; fields left unset are not touched.
    type UpdateRequest: Sync;
    type Response: Send;
    type Id: Send + Sync;
    /// Every set field must match; an empty filter lists the whole table.
    type Filter: Send + Sync;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// First row in `list` order, for filters on unique columns.
    async fn find_first(&mut self, filter: &Self::Filter) -> Result<Option<Self::Response>> {
        Ok(self.list(filter).await?.into_iter().next())
    }

    /// Returns whether a row was removed.
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}

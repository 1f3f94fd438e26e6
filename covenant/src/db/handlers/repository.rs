//! Base repository trait for database operations.

use crate::db::errors::Result;

/// A repository is the data access layer for one postgres table. It provides methods for
/// creating, reading, updating and deleting entities, and for listing them with simple filters.
///
/// Repositories borrow a connection (or transaction) for their lifetime, so callers decide the
/// transaction boundary. Separate associated types are used for create requests, update requests
/// and responses.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The request type for updating entities
    type UpdateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new entity
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// List entities with filtering and pagination, newest first
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Delete an entity by ID, returning whether it existed
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;

    /// Update an entity by ID. Fails with `DbError::NotFound` if it does not exist.
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}

/// Appends `LIMIT`/`OFFSET` for an optional limit. Postgres treats `LIMIT NULL` as no limit.
pub(crate) fn push_pagination<'a>(query: &mut sqlx::QueryBuilder<'a, sqlx::Postgres>, skip: i64, limit: Option<i64>) {
    query.push(" LIMIT ").push_bind(limit);
    query.push(" OFFSET ").push_bind(skip);
}

//! The four-operation contract both backends implement.
//!
//! Callers (CLI, HTTP layers) depend on this trait only, so the active
//! backend can be swapped without changing business logic.

use crate::db::{CreateRequest, CrudResult, DeleteRequest, Record, UpdateRequest};

/// Uniform create/read/update/delete over a single backing store.
// Callers are generic over the implementor, so no `Send` bound is promised.
#[allow(async_fn_in_trait)]
pub trait CrudFacade {
    /// Open the backend connection and return a status line such as
    /// `"SQLite - connected to main"`.
    async fn connect(&mut self) -> CrudResult<String>;

    /// Create a record. Returns the materialized record, or an empty record
    /// when nothing was created (e.g. the key is already taken).
    async fn create(&self, request: CreateRequest) -> CrudResult<Record>;

    /// Every record stored under `origin`.
    async fn read(&self, origin: &str) -> CrudResult<Vec<Record>>;

    /// Update the record selected by the criteria. Returns the post-update
    /// record, or an empty record when nothing matched or the new key collides.
    async fn update(&self, request: UpdateRequest) -> CrudResult<Record>;

    /// Delete by criteria. Returns the affected count as a string (`"0"` when
    /// nothing matched).
    async fn delete(&self, request: DeleteRequest) -> CrudResult<String>;
}

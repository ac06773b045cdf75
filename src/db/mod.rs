//! Data-access layer with one CRUD contract over two kinds of store.
//!
//! Callers depend on the [`CrudFacade`] trait only, so the relational and
//! document backends can be swapped without changing business logic.
//!
//! # Architecture
//!
//! - `error`: Backend-agnostic error types
//! - `models`: Scalars, field maps, request structs and schema metadata
//! - `facade`: The `CrudFacade` trait
//! - `sql`: Relational backend (guarded writes over SQLite/MySQL)
//! - `document`: Document backend (SurrealDB)

mod error;
mod facade;
mod models;

pub mod document;
pub mod sql;


pub use document::DocumentCrud;
pub use error::{CrudError, CrudResult};
pub use facade::CrudFacade;
pub use models::*;
pub use sql::{MySqlCrud, RelationalCrud, SqliteCrud};

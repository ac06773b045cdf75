//! Relational backend.
//!
//! # Architecture
//!
//! - `driver`: the `SqlDriver` connection seam, with SQLite and MySQL impls
//! - `schema`: primary-key introspection
//! - `value_coder`: key value classification (numeral vs text)
//! - `query_builder`: `??`/`?` templates expanded into bound statements
//! - `guard`: guarded insert/update (existence check, write, read back)
//! - `crud`: the `RelationalCrud` facade

mod crud;
mod driver;
pub mod guard;
mod mysql;
pub mod query_builder;
pub mod schema;
mod sqlite;
pub mod value_coder;

#[cfg(all(test, feature = "mysql-tests"))]
mod mysql_test;

pub use crud::RelationalCrud;
pub use driver::{SqlDriver, WriteOutcome};
pub use guard::{ConflictGuard, KeyCandidate};
pub use mysql::MySqlDriver;
pub use query_builder::Statement;
pub use sqlite::SqliteDriver;

/// Relational facade over SQLite.
pub type SqliteCrud = RelationalCrud<SqliteDriver>;
/// Relational facade over MySQL.
pub type MySqlCrud = RelationalCrud<MySqlDriver>;

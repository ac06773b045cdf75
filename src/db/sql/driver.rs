//! Connection seam between the guarded-write protocol and a concrete engine.
//!
//! Each driver owns a single long-lived connection. ConflictGuard and the
//! relational facade only talk to this trait, so they stay engine-agnostic.

use crate::config::RelationalConfig;
use crate::db::sql::query_builder::Statement;
use crate::db::{ColumnDescriptor, CrudResult, Record};

/// Result of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOutcome {
    pub rows_affected: u64,
    /// Id generated by the engine for the inserted row; 0 when none.
    pub last_insert_id: i64,
}

/// A relational engine reachable through one connection.
// Callers are generic over the implementor, so no `Send` bound is promised.
#[allow(async_fn_in_trait)]
pub trait SqlDriver: Send + Sync {
    /// Human-readable engine name used in status lines.
    const NAME: &'static str;

    /// Bootstrap script used when `connect` is given no explicit path.
    const DEFAULT_BOOTSTRAP: &'static str;

    /// Open the connection described by `config`.
    async fn open(config: &RelationalConfig) -> CrudResult<Self>
    where
        Self: Sized;

    /// Column metadata for `table`, in declaration order.
    async fn describe(&self, table: &str) -> CrudResult<Vec<ColumnDescriptor>>;

    /// Run a statement and materialize every returned row.
    async fn fetch_all(&self, statement: &Statement) -> CrudResult<Vec<Record>>;

    /// Run a write statement.
    async fn execute(&self, statement: &Statement) -> CrudResult<WriteOutcome>;

    /// Run a multi-statement script verbatim.
    async fn run_script(&self, script: &str) -> CrudResult<()>;

    /// Name of the database currently selected on the connection.
    async fn current_database(&self) -> CrudResult<String>;
}

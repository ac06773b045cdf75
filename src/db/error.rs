//! Database error types.
//!
//! This module provides the error taxonomy shared by both backends.
//! It uses miette for fancy diagnostic output and thiserror for derive macros.
//!
//! Duplicate-key collisions and non-matching criteria are NOT errors: they
//! resolve successfully with an empty record (or `"0"` for deletes).

use miette::Diagnostic;
use thiserror::Error;

/// Data-access errors.
#[derive(Error, Diagnostic, Debug)]
pub enum CrudError {
    #[error("Schema error on table '{table}': {message}")]
    #[diagnostic(
        code(dbcrud::db::schema),
        help("Guarded writes need a table with exactly one primary key column")
    )]
    Schema { table: String, message: String },

    #[error("Driver error: {message}")]
    #[diagnostic(code(dbcrud::db::driver))]
    Driver { message: String },

    #[error("Connection error: {message}")]
    #[diagnostic(code(dbcrud::db::connection))]
    Connection { message: String },

    #[error("Not connected: call connect() before {operation}")]
    #[diagnostic(code(dbcrud::db::not_connected))]
    NotConnected { operation: String },

    #[error("Invalid request: {message}")]
    #[diagnostic(code(dbcrud::db::invalid_request))]
    InvalidRequest { message: String },

    #[error("Invalid identifier '{value}': {message}")]
    #[diagnostic(code(dbcrud::db::invalid_identifier))]
    InvalidIdentifier { value: String, message: String },

    #[error("Bootstrap script '{path}' failed: {message}")]
    #[diagnostic(code(dbcrud::db::bootstrap))]
    Bootstrap { path: String, message: String },
}

impl CrudError {
    pub(crate) fn schema(table: &str, message: impl Into<String>) -> Self {
        CrudError::Schema {
            table: table.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        CrudError::InvalidRequest {
            message: message.into(),
        }
    }

    pub(crate) fn not_connected(operation: &str) -> Self {
        CrudError::NotConnected {
            operation: operation.to_string(),
        }
    }
}

impl From<sqlx::Error> for CrudError {
    fn from(e: sqlx::Error) -> Self {
        CrudError::Driver {
            message: e.to_string(),
        }
    }
}

impl From<surrealdb::Error> for CrudError {
    fn from(e: surrealdb::Error) -> Self {
        CrudError::Driver {
            message: e.to_string(),
        }
    }
}

/// Result type for data-access operations.
pub type CrudResult<T> = Result<T, CrudError>;

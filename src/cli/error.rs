use miette::Diagnostic;
use thiserror::Error;

use crate::db::CrudError;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Crud(#[from] CrudError),

    #[error("Invalid {argument} JSON: {message}")]
    #[diagnostic(
        code(dbcrud::cli::invalid_json),
        help("Pass a flat JSON object whose values are strings, numbers, booleans or null.")
    )]
    InvalidJson { argument: String, message: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(
        code(dbcrud::cli::invalid_config),
        help("Check the --backend flag or the DBCRUD_BACKEND environment variable.")
    )]
    InvalidConfig { message: String },

    #[error("Failed to render output: {message}")]
    #[diagnostic(code(dbcrud::cli::output))]
    Output { message: String },
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output {
            message: e.to_string(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;

//! CLI support for odata-query
//!
//! Provides programmatic access to the `odq` commands so other tools can
//! embed the same checks without shelling out.

mod check;
mod functions;
mod options;
mod schema;

pub use check::{CheckOptions, CheckResult, OptionKind, execute_check};
pub use functions::describe_functions;
pub use options::describe_options;
pub use schema::{load_schema, parse_schema};

use std::io;

use thiserror::Error;

use crate::QueryError;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Parse or bind error
    #[error("{0}")]
    Query(#[from] QueryError),

    /// JSON parsing error (schema files)
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Well-formed JSON that does not describe a schema
    #[error("Invalid schema: {0}")]
    Schema(String),

    /// `--schema` given without `--entity-type`, or the reverse
    #[error("--schema and --entity-type must be used together")]
    IncompleteBinding,

    /// No expression provided
    #[error("No expression provided. Pass it as an argument or pipe it to stdin.")]
    NoInput,
}

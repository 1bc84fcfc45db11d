//! CLI support for keyset-query
//!
//! Provides programmatic access to the `keyset` commands so they can be
//! embedded in other tools and tested without spawning a process.

mod check;
mod convert;

pub use check::{CheckOptions, CheckResult, execute_check, execute_keys};
pub use convert::load_dataset;

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] crate::LookupError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input or pipe a JSON dataset to stdin.")]
    NoInput,
}

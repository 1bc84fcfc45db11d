//! Run keyset queries against a JSON dataset

use tracing::info;

use super::{CliError, load_dataset};
use crate::{
    cache::KeyValueCache,
    config::Config,
    lookup::LocalLookup,
    parser::{parse_query, parse_query_with_max_depth},
};

/// Commit time given to every entry loaded from the dataset.
const DATASET_COMMIT_TIME: i64 = 1;

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The query to evaluate
    pub query: String,
    /// JSON dataset
    pub input: Option<String>,
    /// Evaluate over `u32` sets instead of string sets
    pub uint32: bool,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Query evaluated successfully; the sorted members as a JSON array
    Success(serde_json::Value),
}

/// Execute a check operation
pub fn execute_check(options: &CheckOptions, config: &Config) -> Result<CheckResult, CliError> {
    let query = parse_query_with_max_depth(&options.query, config.max_query_depth)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let dataset: serde_json::Value = serde_json::from_str(json_str)?;

    let cache = KeyValueCache::from_config(config);
    let loaded = load_dataset(&dataset, &cache, DATASET_COMMIT_TIME)?;
    info!(keys = loaded, query = %query.root(), "evaluating query");

    let lookup = LocalLookup::from_config(&cache, config);
    let output = if options.uint32 {
        serde_json::Value::from(lookup.run_parsed_set_query_int(&query)?)
    } else {
        serde_json::Value::from(lookup.run_parsed_query(&query)?)
    };
    Ok(CheckResult::Success(output))
}

/// Identifiers referenced by a query, in first-occurrence order
pub fn execute_keys(query: &str) -> Result<Vec<String>, CliError> {
    let query = parse_query(query)?;
    Ok(query.keys().into_iter().map(str::to_string).collect())
}

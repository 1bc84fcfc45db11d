//! Request-facing lookups served from a local [`Cache`].
//!
//! Key lookups report a per-key status instead of failing the whole
//! request. Set queries fail as a whole: a syntax error or a key with no
//! entry aborts the query.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::Query,
    cache::{Cache, KeyValueSetResult},
    config::{Config, DEFAULT_QUERY_CACHE_CAPACITY},
    evaluator::{EvalError, eval_query},
    parser::ParseError,
    query_cache::QueryCache,
    sets::{StringSet, UInt32Set, ValueSet},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] ParseError),

    #[error("query evaluation failed: {0}")]
    Evaluation(#[from] EvalError),
}

/// Lookup result for one requested key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingleLookupResult {
    Value(String),
    /// String set members, sorted.
    KeysetValues(Vec<String>),
    /// `u32` set members, ascending.
    UInt32SetValues(Vec<u32>),
    /// The key has no value; carries a human-readable message.
    NotFound(String),
}

impl SingleLookupResult {
    fn not_found(key: &str) -> Self {
        SingleLookupResult::NotFound(format!("Key not found: {key}"))
    }
}

/// Per-key results, ordered by key. Duplicate request keys collapse.
pub type LookupResponse = BTreeMap<String, SingleLookupResult>;

pub struct LocalLookup<'a, C: Cache + ?Sized> {
    cache: &'a C,
    queries: QueryCache,
}

impl<'a, C: Cache + ?Sized> LocalLookup<'a, C> {
    pub fn new(cache: &'a C) -> Self {
        Self::with_query_cache(cache, QueryCache::new(DEFAULT_QUERY_CACHE_CAPACITY))
    }

    pub fn from_config(cache: &'a C, config: &Config) -> Self {
        let queries =
            QueryCache::new(config.query_cache_capacity).with_max_depth(config.max_query_depth);
        Self::with_query_cache(cache, queries)
    }

    pub fn with_query_cache(cache: &'a C, queries: QueryCache) -> Self {
        LocalLookup { cache, queries }
    }

    pub fn get_key_values(&self, keys: &[&str]) -> LookupResponse {
        let keys = distinct(keys);
        if keys.is_empty() {
            return LookupResponse::new();
        }

        let mut pairs = self.cache.get_key_value_pairs(&keys);
        keys.iter()
            .map(|key| {
                let result = match pairs.remove(*key) {
                    Some(value) => SingleLookupResult::Value(value),
                    None => SingleLookupResult::not_found(key),
                };
                (key.to_string(), result)
            })
            .collect()
    }

    /// String sets for `keys`. An empty set is reported as not found.
    pub fn get_key_value_set(&self, keys: &[&str]) -> LookupResponse {
        let keys = distinct(keys);
        if keys.is_empty() {
            return LookupResponse::new();
        }

        let sets = self.cache.get_value_sets(&keys);
        keys.iter()
            .map(|key| {
                let result = match sets.get(key) {
                    Some(set) if !set.is_empty() => {
                        SingleLookupResult::KeysetValues(sorted_strings(set))
                    }
                    _ => SingleLookupResult::not_found(key),
                };
                (key.to_string(), result)
            })
            .collect()
    }

    /// `u32` sets for `keys`. An empty set is reported as not found.
    pub fn get_uint32_value_set(&self, keys: &[&str]) -> LookupResponse {
        let keys = distinct(keys);
        if keys.is_empty() {
            return LookupResponse::new();
        }

        let sets = self.cache.get_uint32_value_sets(&keys);
        keys.iter()
            .map(|key| {
                let result = match sets.get(key) {
                    Some(set) if !set.is_empty() => {
                        SingleLookupResult::UInt32SetValues(set.iter().collect())
                    }
                    _ => SingleLookupResult::not_found(key),
                };
                (key.to_string(), result)
            })
            .collect()
    }

    /// Evaluate `query` over string sets; returns the members sorted.
    pub fn run_query(&self, query: &str) -> Result<Vec<String>, LookupError> {
        let query = self.parse(query)?;
        self.run_parsed_query(&query)
    }

    /// Evaluate `query` over `u32` sets; returns the members ascending.
    pub fn run_set_query_int(&self, query: &str) -> Result<Vec<u32>, LookupError> {
        let query = self.parse(query)?;
        self.run_parsed_set_query_int(&query)
    }

    /// [`run_query`](Self::run_query) for a query the caller already parsed.
    pub fn run_parsed_query(&self, query: &Query) -> Result<Vec<String>, LookupError> {
        let result: StringSet = self.evaluate(query, |keys| self.cache.get_value_sets(keys))?;
        Ok(sorted_strings(&result))
    }

    /// [`run_set_query_int`](Self::run_set_query_int) for a query the caller
    /// already parsed.
    pub fn run_parsed_set_query_int(&self, query: &Query) -> Result<Vec<u32>, LookupError> {
        let result: UInt32Set =
            self.evaluate(query, |keys| self.cache.get_uint32_value_sets(keys))?;
        Ok(result.iter().collect())
    }

    fn parse(&self, text: &str) -> Result<Arc<Query>, LookupError> {
        let query = self.queries.get_or_parse(text).inspect_err(|e| {
            debug!(query = text, error = %e, "failed to parse query");
        })?;
        Ok(query)
    }

    /// Fetch every key the query names in one batch, then evaluate.
    fn evaluate<S, F>(&self, query: &Query, fetch: F) -> Result<S, LookupError>
    where
        S: ValueSet + Clone,
        F: FnOnce(&[&str]) -> KeyValueSetResult<S>,
    {
        let mut sets = fetch(&query.keys());
        let result = eval_query(query, &mut sets).inspect_err(|e| {
            debug!(query = query.text(), error = %e, "failed to evaluate query");
        })?;
        Ok(result)
    }
}

fn distinct<'k>(keys: &[&'k str]) -> Vec<&'k str> {
    keys.iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn sorted_strings(set: &StringSet) -> Vec<String> {
    let mut values: Vec<String> = set.iter().cloned().collect();
    values.sort();
    values
}

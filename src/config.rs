//! Runtime configuration read from environment variables.
//!
//! All settings can be overridden via environment variables prefixed with
//! `KEYSET_`.

use std::env;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Log level enumeration matching tracing crate levels.
///
/// Defaults to `Info` when not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::InvalidConfig(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Default number of lock shards per cache map.
pub const DEFAULT_CACHE_SHARDS: usize = 16;

/// Default number of parsed queries kept by the query cache.
pub const DEFAULT_QUERY_CACHE_CAPACITY: usize = 1024;

/// Default limit on parsed tree depth and parenthesis nesting.
pub const DEFAULT_MAX_QUERY_DEPTH: usize = 256;

/// Configuration for the cache, query cache and logging.
///
/// # Environment Variables
///
/// - `KEYSET_LOG_LEVEL`: trace, debug, info, warn or error
/// - `KEYSET_CACHE_SHARDS`: number of lock shards per cache map (at least 1)
/// - `KEYSET_QUERY_CACHE_CAPACITY`: parsed queries to keep (0 disables)
/// - `KEYSET_MAX_QUERY_DEPTH`: deepest query tree accepted (at least 1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: LogLevel,
    pub cache_shards: usize,
    pub query_cache_capacity: usize,
    pub max_query_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            cache_shards: DEFAULT_CACHE_SHARDS,
            query_cache_capacity: DEFAULT_QUERY_CACHE_CAPACITY,
            max_query_depth: DEFAULT_MAX_QUERY_DEPTH,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` if a variable holds an invalid
    /// value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup, falling back
    /// to defaults for missing values.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let log_level = match lookup("KEYSET_LOG_LEVEL") {
            Some(val) => val.parse()?,
            None => defaults.log_level,
        };

        let cache_shards = match lookup("KEYSET_CACHE_SHARDS") {
            Some(val) => positive(&val, "shard count")?,
            None => defaults.cache_shards,
        };

        let max_query_depth = match lookup("KEYSET_MAX_QUERY_DEPTH") {
            Some(val) => positive(&val, "query depth")?,
            None => defaults.max_query_depth,
        };

        let query_cache_capacity = match lookup("KEYSET_QUERY_CACHE_CAPACITY") {
            Some(val) => val.parse().map_err(|_| {
                ConfigError::InvalidConfig(format!(
                    "invalid query cache capacity '{val}', expected a non-negative integer"
                ))
            })?,
            None => defaults.query_cache_capacity,
        };

        Ok(Self {
            log_level,
            cache_shards,
            query_cache_capacity,
            max_query_depth,
        })
    }

    /// Apply CLI overrides, which take precedence over the environment.
    #[must_use]
    pub fn apply_overrides(mut self, log_level: Option<LogLevel>) -> Self {
        if let Some(level) = log_level {
            self.log_level = level;
        }
        self
    }

    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    #[must_use]
    pub fn with_cache_shards(mut self, shards: usize) -> Self {
        self.cache_shards = shards.max(1);
        self
    }

    #[must_use]
    pub fn with_max_query_depth(mut self, depth: usize) -> Self {
        self.max_query_depth = depth.max(1);
        self
    }
}

fn positive(val: &str, what: &str) -> Result<usize, ConfigError> {
    match val.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidConfig(format!(
            "invalid {what} '{val}', expected a positive integer"
        ))),
    }
}

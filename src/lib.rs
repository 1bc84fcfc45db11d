pub mod ast;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod evaluator;
pub mod lexer;
pub mod logging;
pub mod lookup;
pub mod output;
pub mod parser;
pub mod query_cache;
pub mod sets;

pub use ast::{Node, Query, SetOp, Token};
pub use cache::{Cache, CommitTime, KeyValueCache, KeyValueSetResult};
pub use config::{Config, ConfigError, LogLevel};
pub use evaluator::{EvalError, Resolve, eval, eval_query};
pub use lexer::{LexError, Lexer, Position, Spanned};
pub use lookup::{LocalLookup, LookupError, LookupResponse, SingleLookupResult};
pub use parser::{ParseError, Parser, parse_query, parse_query_with_max_depth};
pub use query_cache::QueryCache;
pub use sets::{StringSet, UInt32Set, ValueSet};

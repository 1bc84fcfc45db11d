use thiserror::Error;

use crate::{
    ast::{Node, Query},
    sets::ValueSet,
};

/// Errors that can occur during query evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// An identifier in the query has no cache entry of the requested
    /// representation.
    #[error("Key not found: {0}")]
    KeyNotFound(String),
}

/// Maps a query identifier to the set it names.
///
/// Implemented for any `FnMut(&str) -> Result<T, EvalError>`, and by
/// [`crate::cache::KeyValueSetResult`].
pub trait Resolve<T> {
    fn resolve(&mut self, key: &str) -> Result<T, EvalError>;
}

impl<T, F> Resolve<T> for F
where
    F: FnMut(&str) -> Result<T, EvalError>,
{
    fn resolve(&mut self, key: &str) -> Result<T, EvalError> {
        self(key)
    }
}

/// Evaluates an expression tree bottom-up.
///
/// Each leaf is resolved exactly once, left before right, depth first. Any
/// resolution failure aborts the evaluation; a missing key is never treated
/// as an empty set.
///
/// The tree is only read, so one tree can be evaluated concurrently by any
/// number of callers, each with its own resolver.
///
/// # Examples
///
/// ```
/// use keyset_query::evaluator::{eval, EvalError};
/// use keyset_query::parser::parse_query;
/// use keyset_query::sets::UInt32Set;
///
/// let query = parse_query("A - B").unwrap();
/// let result: UInt32Set = eval(query.root(), &mut |key: &str| match key {
///     "A" => Ok(UInt32Set::from_iter([1, 2, 3])),
///     "B" => Ok(UInt32Set::from_iter([2, 3, 4])),
///     other => Err(EvalError::KeyNotFound(other.to_string())),
/// })
/// .unwrap();
/// assert_eq!(result.iter().collect::<Vec<_>>(), vec![1]);
/// ```
pub fn eval<T, R>(node: &Node, resolver: &mut R) -> Result<T, EvalError>
where
    T: ValueSet,
    R: Resolve<T> + ?Sized,
{
    match node {
        Node::Leaf(key) => resolver.resolve(key),
        Node::BinaryOp { op, left, right } => {
            let left = eval(left, resolver)?;
            let right = eval(right, resolver)?;
            Ok(left.apply(*op, right))
        }
    }
}

/// Evaluates a parsed query's root node.
pub fn eval_query<T, R>(query: &Query, resolver: &mut R) -> Result<T, EvalError>
where
    T: ValueSet,
    R: Resolve<T> + ?Sized,
{
    eval(query.root(), resolver)
}

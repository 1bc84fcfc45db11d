use std::collections::HashSet;
use std::fmt;

use crate::ast::SetOp;

/// Abstract Syntax Tree node representing a parsed set expression.
///
/// Each node exclusively owns its children, so a tree has no sharing and no
/// cycles. Once built it is never mutated, which makes it safe to evaluate
/// from many threads at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Identifier resolved against the cache at evaluation time
    ///
    /// # Example
    /// ```text
    /// A
    /// ```
    Leaf(String),

    /// Set operation on two sub-expressions
    ///
    /// # Example
    /// ```text
    /// A - B
    /// ```
    BinaryOp {
        op: SetOp,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn leaf(name: impl Into<String>) -> Self {
        Node::Leaf(name.into())
    }

    pub fn binary(op: SetOp, left: Node, right: Node) -> Self {
        Node::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Distinct identifiers referenced by this tree, in the order a
    /// left-to-right, depth-first walk first meets them.
    pub fn keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        self.collect_keys(&mut seen, &mut keys);
        keys
    }

    fn collect_keys<'a>(&'a self, seen: &mut HashSet<&'a str>, keys: &mut Vec<&'a str>) {
        match self {
            Node::Leaf(name) => {
                if seen.insert(name.as_str()) {
                    keys.push(name.as_str());
                }
            }
            Node::BinaryOp { left, right, .. } => {
                left.collect_keys(seen, keys);
                right.collect_keys(seen, keys);
            }
        }
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::BinaryOp { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

/// Fully parenthesised form: `A & B | C` displays as `((A & B) | C)`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Leaf(name) => write!(f, "{}", name),
            Node::BinaryOp { op, left, right } => write!(f, "({} {} {})", left, op, right),
        }
    }
}

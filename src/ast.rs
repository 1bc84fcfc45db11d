//! # Keyset Query Language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for keyset queries:
//! boolean set-algebra expressions over identifiers that name entries in a
//! key-value set cache.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[operators]** - Set operators (union, intersection, difference)
//! - **[node]** - Expression tree nodes (leaves and binary operations)
//! - **[query]** - A parsed query with its source text and root node
//!
//! ## Quick Start
//!
//! ```text
//! (A - B) | (C & D)
//! ```
//!
//! This query takes everything in `A` that is not in `B`, and adds every
//! element that `C` and `D` have in common.
//!
//! ## Operators
//!
//! - **Union** `|` - elements in either operand
//! - **Intersection** `&` - elements in both operands
//! - **Difference** `-` - elements of the left operand not in the right
//!
//! ## Precedence
//!
//! Intersection binds tighter than union and difference. Union and
//! difference share one level and associate to the left:
//!
//! ```text
//! A | B & C      // A | (B & C)
//! A - B | C      // (A - B) | C
//! A - B - C      // (A - B) - C
//! ```
//!
//! ## Identifiers
//!
//! An identifier is any run of characters that are not whitespace, not an
//! operator and not a parenthesis. There is no escaping.
//!
//! ```text
//! users:active | segment_42 & geo.us-west    // `geo.us` minus `west`!
//! ```
pub mod node;
pub mod operators;
pub mod query;
pub mod tokens;

pub use node::Node;
pub use operators::SetOp;
pub use query::Query;
pub use tokens::Token;

//! Set algebra over the two value-set representations.
//!
//! - [`StringSet`] - a hash set of strings, for string-valued keys
//! - [`UInt32Set`] - a compressed Roaring bitmap, for dense `u32` domains
//!
//! All operations are total and consume their operands, so callers must not
//! expect an operand to survive the call. Results always have the same
//! representation as the inputs.
//!
//! ```
//! use keyset_query::sets::{self, UInt32Set};
//!
//! let a: UInt32Set = [1, 2, 3].into_iter().collect();
//! let b: UInt32Set = [2, 3, 4].into_iter().collect();
//! let both = sets::intersection(a, b);
//! assert_eq!(both.iter().collect::<Vec<_>>(), vec![2, 3]);
//! ```

use std::collections::HashSet;
use std::hash::{BuildHasher, Hash};

use roaring::RoaringBitmap;

use crate::ast::SetOp;

/// Set of string values.
pub type StringSet = HashSet<String>;

/// Set of unsigned 32-bit integers.
pub type UInt32Set = RoaringBitmap;

/// The capability the evaluator needs from a set representation.
pub trait ValueSet: Sized {
    fn empty() -> Self;

    /// Elements in `self` or `other`.
    fn union(self, other: Self) -> Self;

    /// Elements in both `self` and `other`.
    fn intersection(self, other: Self) -> Self;

    /// Elements of `self` that are not in `other`.
    fn difference(self, other: Self) -> Self;

    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn apply(self, op: SetOp, other: Self) -> Self {
        match op {
            SetOp::Union => self.union(other),
            SetOp::Intersection => self.intersection(other),
            SetOp::Difference => self.difference(other),
        }
    }
}

impl<T, S> ValueSet for HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
{
    fn empty() -> Self {
        HashSet::default()
    }

    fn union(self, other: Self) -> Self {
        let (mut larger, smaller) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        larger.extend(smaller);
        larger
    }

    fn intersection(self, other: Self) -> Self {
        let (mut smaller, larger) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        smaller.retain(|v| larger.contains(v));
        smaller
    }

    fn difference(mut self, other: Self) -> Self {
        if other.is_empty() {
            return self;
        }
        self.retain(|v| !other.contains(v));
        self
    }

    fn len(&self) -> u64 {
        HashSet::len(self) as u64
    }
}

impl ValueSet for RoaringBitmap {
    fn empty() -> Self {
        RoaringBitmap::new()
    }

    fn union(mut self, other: Self) -> Self {
        self |= other;
        self
    }

    fn intersection(mut self, other: Self) -> Self {
        self &= other;
        self
    }

    fn difference(mut self, other: Self) -> Self {
        self -= other;
        self
    }

    fn len(&self) -> u64 {
        RoaringBitmap::len(self)
    }
}

pub fn union<T: ValueSet>(left: T, right: T) -> T {
    left.union(right)
}

pub fn intersection<T: ValueSet>(left: T, right: T) -> T {
    left.intersection(right)
}

pub fn difference<T: ValueSet>(left: T, right: T) -> T {
    left.difference(right)
}

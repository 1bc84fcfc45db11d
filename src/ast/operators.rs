use std::fmt;

/// Set operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOp {
    /// Union (`|`)
    Union,
    /// Intersection (`&`)
    Intersection,
    /// Difference (`-`), not commutative
    Difference,
}

impl SetOp {
    /// The operator as it is written in query text.
    pub fn symbol(self) -> char {
        match self {
            SetOp::Union => '|',
            SetOp::Intersection => '&',
            SetOp::Difference => '-',
        }
    }
}

impl fmt::Display for SetOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

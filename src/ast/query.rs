use crate::ast::Node;

/// A successfully parsed query.
///
/// Holds the source text it was parsed from and exactly one root node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    root: Node,
}

impl Query {
    pub fn new(text: impl Into<String>, root: Node) -> Self {
        Query {
            text: text.into(),
            root,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Distinct identifiers the query references.
    pub fn keys(&self) -> Vec<&str> {
        self.root.keys()
    }
}

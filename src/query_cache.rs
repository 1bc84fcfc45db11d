use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::{
    ast::Query,
    config::DEFAULT_MAX_QUERY_DEPTH,
    parser::{ParseError, parse_query_with_max_depth},
};

/// Parsed queries keyed by their text, so repeated requests skip parsing.
///
/// Parse failures are not cached. When full, an arbitrary entry is evicted
/// to make room; a capacity of zero disables caching.
#[derive(Debug)]
pub struct QueryCache {
    entries: RwLock<HashMap<String, Arc<Query>>>,
    capacity: usize,
    max_depth: usize,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        QueryCache {
            entries: RwLock::new(HashMap::new()),
            capacity,
            max_depth: DEFAULT_MAX_QUERY_DEPTH,
        }
    }

    /// Reject queries whose tree is deeper than `max_depth`.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the cached parse of `text`, parsing it on a miss.
    pub fn get_or_parse(&self, text: &str) -> Result<Arc<Query>, ParseError> {
        if let Some(query) = self.entries.read().get(text) {
            return Ok(Arc::clone(query));
        }

        let query = Arc::new(parse_query_with_max_depth(text, self.max_depth)?);
        if self.capacity == 0 {
            return Ok(query);
        }

        let mut entries = self.entries.write();
        if entries.len() >= self.capacity && !entries.contains_key(text) {
            if let Some(victim) = entries.keys().next().cloned() {
                debug!(query = %victim, "evicting parsed query");
                entries.remove(&victim);
            }
        }
        let cached = entries
            .entry(text.to_string())
            .or_insert_with(|| Arc::clone(&query));
        Ok(Arc::clone(cached))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

//! Concurrent, versioned key-to-value-set cache.
//!
//! The cache keeps three independent maps: single string values, string
//! sets and `u32` sets. A key written as a string set is invisible to the
//! `u32` accessors and vice versa.
//!
//! # Versioning
//!
//! Every write carries a logical commit time supplied by the writer. A write
//! replaces the stored entry only if its commit time is not older than the
//! stored one, so updates delivered out of order still converge on the
//! newest state. Deletes follow the same rule and leave a tombstone behind
//! until [`Cache::remove_deleted_keys`] purges it.
//!
//! # Concurrency
//!
//! Each map is split into shards, each behind its own `RwLock`. Stored
//! values are immutable `Arc` snapshots: a writer builds the new set before
//! taking the lock and swaps the pointer, so a reader sees either the old
//! or the new set, never a partial one.

use std::collections::HashMap;
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    config::{Config, DEFAULT_CACHE_SHARDS},
    evaluator::{EvalError, Resolve},
    sets::{StringSet, UInt32Set, ValueSet},
};

/// Ordering token supplied by the writer. Not a wall-clock time.
pub type CommitTime = i64;

/// Read and write access to versioned key-value data.
pub trait Cache: Send + Sync {
    /// Values for the keys that have one; absent and deleted keys are
    /// omitted.
    fn get_key_value_pairs(&self, keys: &[&str]) -> HashMap<String, String>;

    /// String sets for `keys`, read in one pass.
    fn get_value_sets(&self, keys: &[&str]) -> KeyValueSetResult<StringSet>;

    /// `u32` sets for `keys`, read in one pass.
    fn get_uint32_value_sets(&self, keys: &[&str]) -> KeyValueSetResult<UInt32Set>;

    /// Snapshot of one key's string set; empty if absent.
    fn get_value_set(&self, key: &str) -> StringSet {
        self.get_value_sets(&[key]).value_set(key)
    }

    /// Snapshot of one key's `u32` set; empty if absent.
    fn get_uint32_value_set(&self, key: &str) -> UInt32Set {
        self.get_uint32_value_sets(&[key]).value_set(key)
    }

    /// Returns `false` if the write was older than the stored entry.
    fn update_key_value(&self, key: &str, value: &str, commit_time: CommitTime) -> bool;

    /// Replace the key's string set with the deduplicated `values`.
    ///
    /// Returns `false` if the write was older than the stored entry.
    fn update_value_set(&self, key: &str, values: &[&str], commit_time: CommitTime) -> bool;

    /// Replace the key's `u32` set with `values`.
    ///
    /// Returns `false` if the write was older than the stored entry.
    fn update_uint32_value_set(&self, key: &str, values: &[u32], commit_time: CommitTime)
    -> bool;

    fn delete_key(&self, key: &str, commit_time: CommitTime) -> bool;

    fn delete_value_set(&self, key: &str, commit_time: CommitTime) -> bool;

    fn delete_uint32_value_set(&self, key: &str, commit_time: CommitTime) -> bool;

    /// Purge tombstones with a commit time at or before `cutoff`.
    fn remove_deleted_keys(&self, cutoff: CommitTime) -> usize;

    /// Drop every representation of `key` regardless of commit time.
    fn evict(&self, key: &str);
}

/// Result of a batch set read: one snapshot per key that had an entry.
#[derive(Debug, Clone)]
pub struct KeyValueSetResult<S> {
    sets: HashMap<String, Arc<S>>,
}

impl<S> Default for KeyValueSetResult<S> {
    fn default() -> Self {
        KeyValueSetResult {
            sets: HashMap::new(),
        }
    }
}

impl<S> KeyValueSetResult<S> {
    pub fn get(&self, key: &str) -> Option<&S> {
        self.sets.get(key).map(Arc::as_ref)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.sets.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl<S: ValueSet + Clone> KeyValueSetResult<S> {
    /// Owned copy of the key's set, or an empty set if the key is absent.
    pub fn value_set(&self, key: &str) -> S {
        self.get(key).cloned().unwrap_or_else(S::empty)
    }
}

/// Leaf resolution for the evaluator: an absent key is an error.
impl<S: Clone> Resolve<S> for KeyValueSetResult<S> {
    fn resolve(&mut self, key: &str) -> Result<S, EvalError> {
        self.get(key)
            .cloned()
            .ok_or_else(|| EvalError::KeyNotFound(key.to_string()))
    }
}

#[derive(Debug)]
struct Entry<V> {
    /// `None` marks a tombstone.
    value: Option<Arc<V>>,
    commit_time: CommitTime,
}

enum Outcome {
    Applied,
    Stale { current: CommitTime },
}

/// A sharded map of versioned entries.
#[derive(Debug)]
struct VersionedMap<V> {
    shards: Box<[RwLock<HashMap<String, Entry<V>>>]>,
    hasher: RandomState,
}

impl<V> VersionedMap<V> {
    fn new(shards: usize) -> Self {
        VersionedMap {
            shards: (0..shards.max(1))
                .map(|_| RwLock::new(HashMap::new()))
                .collect(),
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, key: &str) -> &RwLock<HashMap<String, Entry<V>>> {
        let idx = (self.hasher.hash_one(key) % self.shards.len() as u64) as usize;
        &self.shards[idx]
    }

    fn put(&self, key: &str, value: Option<V>, commit_time: CommitTime) -> Outcome {
        let value = value.map(Arc::new);
        let mut shard = self.shard(key).write();
        match shard.get_mut(key) {
            Some(entry) if commit_time < entry.commit_time => Outcome::Stale {
                current: entry.commit_time,
            },
            Some(entry) => {
                entry.value = value;
                entry.commit_time = commit_time;
                Outcome::Applied
            }
            None => {
                shard.insert(key.to_string(), Entry { value, commit_time });
                Outcome::Applied
            }
        }
    }

    fn get(&self, key: &str) -> Option<Arc<V>> {
        self.shard(key)
            .read()
            .get(key)
            .and_then(|entry| entry.value.clone())
    }

    fn get_many(&self, keys: &[&str]) -> HashMap<String, Arc<V>> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get(key) {
                found.insert(key.to_string(), value);
            }
        }
        found
    }

    fn remove(&self, key: &str) -> bool {
        self.shard(key).write().remove(key).is_some()
    }

    fn remove_tombstones(&self, cutoff: CommitTime) -> usize {
        let mut removed = 0;
        for shard in self.shards.iter() {
            let mut shard = shard.write();
            let before = shard.len();
            shard.retain(|_, entry| entry.value.is_some() || entry.commit_time > cutoff);
            removed += before - shard.len();
        }
        removed
    }
}

/// The in-memory [`Cache`] implementation.
///
/// Construct one per process (or per test) and share it by reference or
/// `Arc`; there is no global instance.
///
/// ```
/// use keyset_query::cache::{Cache, KeyValueCache};
///
/// let cache = KeyValueCache::new();
/// cache.update_uint32_value_set("K", &[1, 2], 5);
/// assert!(!cache.update_uint32_value_set("K", &[9], 3));
/// assert_eq!(cache.get_uint32_value_set("K").len(), 2);
/// ```
#[derive(Debug)]
pub struct KeyValueCache {
    pairs: VersionedMap<String>,
    string_sets: VersionedMap<StringSet>,
    uint32_sets: VersionedMap<UInt32Set>,
}

impl Default for KeyValueCache {
    fn default() -> Self {
        Self::with_shards(DEFAULT_CACHE_SHARDS)
    }
}

impl KeyValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shards(shards: usize) -> Self {
        KeyValueCache {
            pairs: VersionedMap::new(shards),
            string_sets: VersionedMap::new(shards),
            uint32_sets: VersionedMap::new(shards),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_shards(config.cache_shards)
    }
}

fn applied(kind: &str, key: &str, commit_time: CommitTime, outcome: Outcome) -> bool {
    match outcome {
        Outcome::Applied => true,
        Outcome::Stale { current } => {
            debug!(kind, key, commit_time, current, "ignoring write older than stored entry");
            false
        }
    }
}

impl Cache for KeyValueCache {
    fn get_key_value_pairs(&self, keys: &[&str]) -> HashMap<String, String> {
        self.pairs
            .get_many(keys)
            .into_iter()
            .map(|(key, value)| (key, value.as_ref().clone()))
            .collect()
    }

    fn get_value_sets(&self, keys: &[&str]) -> KeyValueSetResult<StringSet> {
        KeyValueSetResult {
            sets: self.string_sets.get_many(keys),
        }
    }

    fn get_uint32_value_sets(&self, keys: &[&str]) -> KeyValueSetResult<UInt32Set> {
        KeyValueSetResult {
            sets: self.uint32_sets.get_many(keys),
        }
    }

    fn update_key_value(&self, key: &str, value: &str, commit_time: CommitTime) -> bool {
        let outcome = self.pairs.put(key, Some(value.to_string()), commit_time);
        applied("value", key, commit_time, outcome)
    }

    fn update_value_set(&self, key: &str, values: &[&str], commit_time: CommitTime) -> bool {
        let set: StringSet = values.iter().map(|v| v.to_string()).collect();
        let outcome = self.string_sets.put(key, Some(set), commit_time);
        applied("string set", key, commit_time, outcome)
    }

    fn update_uint32_value_set(
        &self,
        key: &str,
        values: &[u32],
        commit_time: CommitTime,
    ) -> bool {
        let set: UInt32Set = values.iter().copied().collect();
        let outcome = self.uint32_sets.put(key, Some(set), commit_time);
        applied("uint32 set", key, commit_time, outcome)
    }

    fn delete_key(&self, key: &str, commit_time: CommitTime) -> bool {
        let outcome = self.pairs.put(key, None, commit_time);
        applied("value", key, commit_time, outcome)
    }

    fn delete_value_set(&self, key: &str, commit_time: CommitTime) -> bool {
        let outcome = self.string_sets.put(key, None, commit_time);
        applied("string set", key, commit_time, outcome)
    }

    fn delete_uint32_value_set(&self, key: &str, commit_time: CommitTime) -> bool {
        let outcome = self.uint32_sets.put(key, None, commit_time);
        applied("uint32 set", key, commit_time, outcome)
    }

    fn remove_deleted_keys(&self, cutoff: CommitTime) -> usize {
        let removed = self.pairs.remove_tombstones(cutoff)
            + self.string_sets.remove_tombstones(cutoff)
            + self.uint32_sets.remove_tombstones(cutoff);
        if removed > 0 {
            info!(removed, cutoff, "purged deleted keys");
        }
        removed
    }

    fn evict(&self, key: &str) {
        let removed = self.pairs.remove(key)
            | self.string_sets.remove(key)
            | self.uint32_sets.remove(key);
        if removed {
            debug!(key, "evicted key");
        }
    }
}

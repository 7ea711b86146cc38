//! A single key/value partition.

use crate::metrics::Counter;
use crate::types::{now_millis, ShardId};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time statistics for a shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardStats {
    /// Shard ID.
    pub id: ShardId,

    /// Number of stored entries.
    pub size: usize,

    /// Stores, retrieves, deletes and clears performed.
    pub op_count: u64,

    /// Last counted operation, in ms since the Unix epoch.
    pub last_access_ms: Option<u64>,
}

/// An isolated key/value partition with its own lock.
///
/// Reads through [`Shard::retrieve`] count as operations, so they show up in
/// [`ShardStats::op_count`] and refresh the access time.
#[derive(Debug)]
pub struct Shard<V> {
    id: ShardId,
    entries: RwLock<HashMap<String, V>>,
    op_count: Counter,
    /// 0 until the first counted operation.
    last_access_ms: AtomicU64,
}

impl<V> Shard<V> {
    /// Create an empty shard.
    pub fn new(id: impl Into<ShardId>) -> Self {
        Self {
            id: id.into(),
            entries: RwLock::new(HashMap::new()),
            op_count: Counter::new(),
            last_access_ms: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn touch(&self) {
        self.op_count.inc();
        self.last_access_ms.store(now_millis(), Ordering::Relaxed);
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn store(&self, key: impl Into<String>, value: V) {
        self.entries.write().insert(key.into(), value);
        self.touch();
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Remove `key`. Returns true if it was present.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.entries.write().remove(key).is_some();
        self.touch();
        removed
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.touch();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn op_count(&self) -> u64 {
        self.op_count.get()
    }

    pub fn stats(&self) -> ShardStats {
        let last = self.last_access_ms.load(Ordering::Relaxed);
        ShardStats {
            id: self.id.clone(),
            size: self.len(),
            op_count: self.op_count.get(),
            last_access_ms: (last != 0).then_some(last),
        }
    }
}

impl<V: Clone> Shard<V> {
    /// Look up `key`. Counts as an operation even on a miss.
    pub fn retrieve(&self, key: &str) -> Option<V> {
        let value = self.entries.read().get(key).cloned();
        self.touch();
        value
    }

    /// Independent copy of every stored value.
    pub fn get_all(&self) -> Vec<V> {
        self.entries.read().values().cloned().collect()
    }

    /// Independent copy of every `(key, value)` pair.
    pub fn snapshot(&self) -> Vec<(String, V)> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

//! Stateless hash-modulo placement.

use super::hash::hash_index;
use super::strategy::ShardingStrategy;
use crate::error::{Error, Result};
use crate::metrics::Counter;
use crate::types::ShardTarget;
use serde::Serialize;

/// `|hash(key)| mod shard_count`.
///
/// Placement is a pure function of `(key, shard_count)`; the counters only
/// feed [`ModuloHashStrategy::diagnostics`]. Changing the shard count remaps
/// most keys.
#[derive(Debug)]
pub struct ModuloHashStrategy {
    calls: Counter,
    key_units: Counter,
}

/// Call statistics for a [`ModuloHashStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModuloDiagnostics {
    /// Successful resolutions.
    pub calls: u64,
    /// Sum of resolved key lengths in UTF-16 code units, the unit the hash walks.
    pub total_key_len: u64,
    /// Mean key length, 0 before the first call.
    pub avg_key_len: f64,
}

impl ModuloHashStrategy {
    pub fn new() -> Self {
        Self {
            calls: Counter::new(),
            key_units: Counter::new(),
        }
    }

    /// Shard index for `key`.
    pub fn index_for(&self, key: &str, shard_count: usize) -> Result<usize> {
        if shard_count == 0 {
            return Err(Error::no_shards());
        }
        self.calls.inc();
        self.key_units.add(key.encode_utf16().count() as u64);
        Ok(hash_index(key, shard_count))
    }

    pub fn diagnostics(&self) -> ModuloDiagnostics {
        let calls = self.calls.get();
        let total_key_len = self.key_units.get();
        ModuloDiagnostics {
            calls,
            total_key_len,
            avg_key_len: if calls == 0 {
                0.0
            } else {
                total_key_len as f64 / calls as f64
            },
        }
    }
}

impl Default for ModuloHashStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardingStrategy for ModuloHashStrategy {
    fn name(&self) -> &'static str {
        "modulo-hash"
    }

    fn resolve(&self, key: &str, shard_count: usize) -> Result<ShardTarget> {
        self.index_for(key, shard_count).map(ShardTarget::Index)
    }
}

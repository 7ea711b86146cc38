//! Routes single-key and full-scan operations across a shard set.
//!
//! # Locking
//!
//! Lock order is always strategy, then shard list, then an individual shard.
//!
//! - `insert`, `query`, `delete` hold the strategy read lock across
//!   resolution and the shard operation, so `switch_strategy`,
//!   `add_shard` and `remove_shard` (which take the write lock) never
//!   interleave with a half-routed call.
//! - Each shard has its own lock; operations on different shards do not
//!   contend.
//! - Scans and distribution reports snapshot shards one at a time and are
//!   not globally consistent across shards.

use super::shard::{Shard, ShardStats};
use crate::config::ShardingConfig;
use crate::error::{Error, Result};
use crate::metrics::{Counter, CoordinatorMetrics};
use crate::partitioning::ShardingStrategy;
use crate::types::{now_millis, DistributionStats, ShardId, ShardTarget};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Coordinator-wide statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorStats {
    /// Name of the active strategy.
    pub strategy: &'static str,

    /// Number of shards.
    pub shard_count: usize,

    /// Entries across all shards.
    pub total_entries: usize,

    /// Routed operations processed.
    pub operations_total: u64,

    /// Operations per second since creation.
    pub operations_per_sec: f64,

    /// Creation time, ms since the Unix epoch.
    pub created_at_ms: u64,

    /// Per-shard statistics in shard order.
    pub shards: Vec<ShardStats>,
}

/// Owns a shard set and the active placement strategy.
///
/// Switching strategies or changing the shard set does not move stored
/// data. A key stays reachable only while it resolves to the shard it was
/// written to; after a switch it may resolve elsewhere and read as missing.
pub struct Coordinator<V> {
    shards: RwLock<Vec<Arc<Shard<V>>>>,
    strategy: RwLock<Arc<dyn ShardingStrategy>>,
    metrics: CoordinatorMetrics,
    operations_total: Counter,
    start_time: Instant,
    created_at_ms: u64,
}

impl<V> std::fmt::Debug for Coordinator<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("shards", &self.shard_ids())
            .field("strategy", &self.strategy_name())
            .field("operations_total", &self.operations_total.get())
            .finish()
    }
}

impl<V> Coordinator<V> {
    /// Create a coordinator over `shard_ids` using `strategy`.
    ///
    /// The strategy is used as given: a consistent-hash strategy must
    /// already know the shard ids (see [`ShardingConfig::build_strategy`]).
    pub fn new<I, S>(shard_ids: I, strategy: Arc<dyn ShardingStrategy>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<ShardId>,
    {
        let mut shards: Vec<Arc<Shard<V>>> = Vec::new();
        for id in shard_ids {
            let id = id.into();
            validate_shard_id(&id)?;
            if shards.iter().any(|s| s.id() == id) {
                return Err(Error::DuplicateShard(id));
            }
            shards.push(Arc::new(Shard::new(id)));
        }

        tracing::info!(
            shard_count = shards.len(),
            strategy = strategy.name(),
            "coordinator created"
        );

        Ok(Self {
            shards: RwLock::new(shards),
            strategy: RwLock::new(strategy),
            metrics: CoordinatorMetrics::new(),
            operations_total: Counter::new(),
            start_time: Instant::now(),
            created_at_ms: now_millis(),
        })
    }

    /// Create a coordinator with the configured shards and strategy.
    pub fn from_config(config: &ShardingConfig) -> Result<Self> {
        let strategy = config.build_strategy()?;
        Self::new(config.shard_ids(), strategy)
    }

    fn resolve_index(
        strategy: &dyn ShardingStrategy,
        shards: &[Arc<Shard<V>>],
        key: &str,
    ) -> Result<usize> {
        let target = strategy.resolve(key, shards.len())?;
        let index = match &target {
            ShardTarget::Index(index) => Some(*index).filter(|i| *i < shards.len()),
            ShardTarget::Id(id) => shards.iter().position(|s| s.id() == id),
        };
        index.ok_or_else(|| Error::ShardNotFound(target.to_string()))
    }

    /// Resolve `key` and run `f` on the target shard under the strategy read lock.
    fn with_routed_shard<T>(&self, key: &str, f: impl FnOnce(&Shard<V>) -> T) -> Result<T> {
        let strategy = self.strategy.read();
        let shards = self.shards.read();
        let index = Self::resolve_index(strategy.as_ref(), &shards, key)?;
        let shard: &Shard<V> = &shards[index];

        tracing::trace!(key, shard_id = shard.id(), "routed");
        self.metrics.routed_total.inc([shard.id()]);
        self.operations_total.inc();

        Ok(f(shard))
    }

    /// Store `value` under `key` on the shard the strategy selects.
    pub fn insert(&self, key: &str, value: V) -> Result<()> {
        self.with_routed_shard(key, |shard| shard.store(key, value))?;
        self.metrics.insert_total.inc();
        Ok(())
    }

    /// Byte-key variant of [`insert`](Self::insert) for wire front ends.
    pub fn insert_bytes(&self, key: &[u8], value: V) -> Result<()> {
        self.insert(utf8_key(key)?, value)
    }

    /// Remove `key` from the shard the strategy selects.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let removed = self.with_routed_shard(key, |shard| shard.delete(key))?;
        self.metrics.delete_total.inc();
        Ok(removed)
    }

    /// Whether the shard the strategy selects holds `key`.
    pub fn contains(&self, key: &str) -> Result<bool> {
        self.with_routed_shard(key, |shard| shard.has(key))
    }

    /// Id of the shard `key` resolves to.
    ///
    /// This is a real resolution: a round-robin strategy advances its counter.
    pub fn shard_for_key(&self, key: &str) -> Result<ShardId> {
        let strategy = self.strategy.read();
        let shards = self.shards.read();
        let index = Self::resolve_index(strategy.as_ref(), &shards, key)?;
        Ok(shards[index].id().to_string())
    }

    /// Per-shard entry counts in shard order.
    pub fn get_shard_distribution(&self) -> Vec<usize> {
        self.shards.read().iter().map(|s| s.len()).collect()
    }

    /// Distribution report over stored entries.
    pub fn distribution_stats(&self) -> DistributionStats {
        let counts = self
            .shards
            .read()
            .iter()
            .map(|s| (s.id().to_string(), s.len()))
            .collect();
        DistributionStats::from_counts(counts)
    }

    /// True if every shard holds within one entry of the mean. Empty is balanced.
    pub fn is_balanced(&self) -> bool {
        self.distribution_stats().is_balanced()
    }

    /// Replace the active strategy and return the previous one.
    ///
    /// Nothing is migrated. The new strategy is used as given, so one with
    /// no registered shards fails at the next resolution, not here.
    pub fn switch_strategy(&self, strategy: Arc<dyn ShardingStrategy>) -> Arc<dyn ShardingStrategy> {
        let mut current = self.strategy.write();
        let stored = self.len();

        tracing::info!(from = current.name(), to = strategy.name(), "switching strategy");
        if stored > 0 {
            tracing::warn!(
                entries = stored,
                "stored entries are not migrated and may no longer resolve"
            );
        }

        std::mem::replace(&mut *current, strategy)
    }

    /// The active strategy.
    pub fn strategy(&self) -> Arc<dyn ShardingStrategy> {
        self.strategy.read().clone()
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.read().name()
    }

    /// Add an empty shard and register it with the active strategy.
    pub fn add_shard(&self, shard_id: impl Into<ShardId>) -> Result<()> {
        let shard_id = shard_id.into();
        validate_shard_id(&shard_id)?;

        let strategy = self.strategy.write();
        let mut shards = self.shards.write();
        if shards.iter().any(|s| s.id() == shard_id) {
            return Err(Error::DuplicateShard(shard_id));
        }

        strategy.add_shard(&shard_id);
        shards.push(Arc::new(Shard::new(shard_id.clone())));

        tracing::debug!(shard_id = %shard_id, shard_count = shards.len(), "added shard");
        Ok(())
    }

    /// Remove a shard, dropping its data, and unregister it from the active
    /// strategy. Returns the removed shard's final stats; unknown ids are a no-op.
    pub fn remove_shard(&self, shard_id: &str) -> Option<ShardStats> {
        let strategy = self.strategy.write();
        let mut shards = self.shards.write();
        let index = shards.iter().position(|s| s.id() == shard_id)?;

        let removed = shards.remove(index);
        strategy.remove_shard(shard_id);

        let stats = removed.stats();
        tracing::debug!(
            shard_id,
            dropped_entries = stats.size,
            shard_count = shards.len(),
            "removed shard"
        );
        Some(stats)
    }

    /// Shard at `index` in shard order.
    pub fn shard(&self, index: usize) -> Option<Arc<Shard<V>>> {
        self.shards.read().get(index).cloned()
    }

    pub fn shard_ids(&self) -> Vec<ShardId> {
        self.shards
            .read()
            .iter()
            .map(|s| s.id().to_string())
            .collect()
    }

    pub fn shard_count(&self) -> usize {
        self.shards.read().len()
    }

    /// Entries across all shards.
    pub fn len(&self) -> usize {
        self.shards.read().iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry from every shard. Shards and strategy are kept.
    pub fn clear(&self) {
        let shards = self.shards.read();
        for shard in shards.iter() {
            shard.clear();
        }
        tracing::debug!(shard_count = shards.len(), "cleared all shards");
    }

    pub fn metrics(&self) -> &CoordinatorMetrics {
        &self.metrics
    }

    pub fn stats(&self) -> CoordinatorStats {
        let shards: Vec<ShardStats> = self.shards.read().iter().map(|s| s.stats()).collect();

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let operations_total = self.operations_total.get();
        let operations_per_sec = if elapsed > 0.0 {
            operations_total as f64 / elapsed
        } else {
            0.0
        };

        CoordinatorStats {
            strategy: self.strategy_name(),
            shard_count: shards.len(),
            total_entries: shards.iter().map(|s| s.size).sum(),
            operations_total,
            operations_per_sec,
            created_at_ms: self.created_at_ms,
            shards,
        }
    }
}

impl<V: Clone> Coordinator<V> {
    /// Look up `key` on the shard the strategy selects.
    ///
    /// `Ok(None)` means not found; it is never an error.
    pub fn query(&self, key: &str) -> Result<Option<V>> {
        let value = self.with_routed_shard(key, |shard| shard.retrieve(key))?;
        self.metrics.record_query(value.is_some());
        Ok(value)
    }

    /// Byte-key variant of [`query`](Self::query) for wire front ends.
    pub fn query_bytes(&self, key: &[u8]) -> Result<Option<V>> {
        self.query(utf8_key(key)?)
    }

    /// Every stored value, shard by shard in shard order.
    pub fn query_all(&self) -> Vec<V> {
        self.metrics.scan_total.inc();
        self.operations_total.inc();
        self.shards
            .read()
            .iter()
            .flat_map(|s| s.get_all())
            .collect()
    }

    /// Contents of the shard at `index`, bypassing the strategy.
    pub fn query_shard(&self, index: usize) -> Result<Vec<V>> {
        self.shards
            .read()
            .get(index)
            .map(|s| s.get_all())
            .ok_or_else(|| Error::ShardNotFound(ShardTarget::Index(index).to_string()))
    }
}

impl<V: Clone + Serialize> Coordinator<V> {
    /// JSON array of [`query_all`](Self::query_all).
    pub fn export(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.query_all())?)
    }
}

fn validate_shard_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::Config("shard id must not be empty".to_string()));
    }
    Ok(())
}

fn utf8_key(key: &[u8]) -> Result<&str> {
    std::str::from_utf8(key).map_err(|e| Error::InvalidKey(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyKind;
    use crate::partitioning::{ConsistentHashStrategy, ModuloHashStrategy, RoundRobinStrategy};

    fn modulo(n: usize) -> Coordinator<i32> {
        Coordinator::from_config(&ShardingConfig::new(n)).unwrap()
    }

    #[test]
    fn test_insert_query_round_trip() {
        let db = modulo(3);
        db.insert("key1", 1).unwrap();
        db.insert("key2", 2).unwrap();
        db.insert("key3", 3).unwrap();

        assert_eq!(db.query("key1").unwrap(), Some(1));
        assert_eq!(db.query("key2").unwrap(), Some(2));
        assert_eq!(db.query("missing").unwrap(), None);

        let mut all = db.query_all();
        all.sort();
        assert_eq!(all, vec![1, 2, 3]);
    }

    #[test]
    fn test_overwrite() {
        let db = modulo(3);
        db.insert("k", 1).unwrap();
        db.insert("k", 2).unwrap();
        assert_eq!(db.query("k").unwrap(), Some(2));
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_delete_and_contains() {
        let db = modulo(2);
        db.insert("k", 5).unwrap();
        assert!(db.contains("k").unwrap());
        assert!(db.delete("k").unwrap());
        assert!(!db.delete("k").unwrap());
        assert!(!db.contains("k").unwrap());
    }

    #[test]
    fn test_zero_shards_fails_at_use() {
        let db: Coordinator<i32> =
            Coordinator::new(Vec::<String>::new(), Arc::new(ModuloHashStrategy::new())).unwrap();
        assert!(matches!(db.insert("k", 1), Err(Error::Config(_))));
        assert!(matches!(db.query("k"), Err(Error::Config(_))));
        assert!(db.query_all().is_empty());
        assert!(db.is_balanced());
    }

    #[test]
    fn test_duplicate_and_empty_shard_ids() {
        let result: Result<Coordinator<i32>> =
            Coordinator::new(["a", "a"], Arc::new(ModuloHashStrategy::new()));
        assert!(matches!(result, Err(Error::DuplicateShard(id)) if id == "a"));

        let result: Result<Coordinator<i32>> =
            Coordinator::new([""], Arc::new(ModuloHashStrategy::new()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_query_shard_bypasses_strategy() {
        let db = modulo(3);
        db.insert("hello", 7).unwrap();

        // "hello" hashes to 99162322, which is 1 mod 3
        assert_eq!(db.query_shard(1).unwrap(), vec![7]);
        assert!(db.query_shard(0).unwrap().is_empty());
        assert!(matches!(db.query_shard(3), Err(Error::ShardNotFound(_))));
        assert_eq!(db.get_shard_distribution(), vec![0, 1, 0]);
    }

    #[test]
    fn test_round_robin_spreads_evenly() {
        let config = ShardingConfig::new(4).with_strategy(StrategyKind::RoundRobin);
        let db: Coordinator<usize> = Coordinator::from_config(&config).unwrap();

        for i in 0..10 {
            db.insert(&format!("k{}", i), i).unwrap();
        }
        assert_eq!(db.get_shard_distribution(), vec![3, 3, 2, 2]);
        assert!(db.is_balanced());
    }

    #[test]
    fn test_is_balanced() {
        let db = modulo(2);
        assert!(db.is_balanced());

        let shard = db.shard(0).unwrap();
        for i in 0..5 {
            shard.store(format!("k{}", i), i);
        }
        assert!(!db.is_balanced());
        assert_eq!(db.distribution_stats().total, 5);
    }

    #[test]
    fn test_switch_strategy_does_not_migrate() {
        let db = modulo(3);
        let keys: Vec<String> = (0..30).map(|i| format!("user:{}", i)).collect();
        for (i, key) in keys.iter().enumerate() {
            db.insert(key, i as i32).unwrap();
        }

        let previous = db.switch_strategy(Arc::new(RoundRobinStrategy::new()));
        assert_eq!(previous.name(), "modulo-hash");
        assert_eq!(db.strategy_name(), "round-robin");

        // data stays where it was
        assert_eq!(db.len(), 30);
        assert_eq!(db.query_all().len(), 30);

        let found = keys
            .iter()
            .filter(|k| db.query(k).unwrap().is_some())
            .count();
        assert!(found < keys.len());

        db.switch_strategy(previous);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(db.query(key).unwrap(), Some(i as i32));
        }
    }

    #[test]
    fn test_switch_to_empty_ring_fails_at_use() {
        let db = modulo(3);
        db.insert("k", 1).unwrap();
        db.switch_strategy(Arc::new(ConsistentHashStrategy::default()));

        assert!(matches!(db.query("k"), Err(Error::Config(_))));
    }

    #[derive(Debug)]
    struct FixedIndex(usize);

    impl ShardingStrategy for FixedIndex {
        fn name(&self) -> &'static str {
            "fixed-index"
        }

        fn resolve(&self, _key: &str, _shard_count: usize) -> Result<ShardTarget> {
            Ok(ShardTarget::Index(self.0))
        }
    }

    #[test]
    fn test_out_of_range_index_is_reported() {
        let db: Coordinator<i32> = Coordinator::new(["a", "b"], Arc::new(FixedIndex(5))).unwrap();

        assert!(matches!(db.insert("k", 1), Err(Error::ShardNotFound(t)) if t == "#5"));
        assert!(matches!(db.query_shard(2), Err(Error::ShardNotFound(t)) if t == "#2"));
        assert!(db.is_empty());
    }

    #[test]
    fn test_unknown_ring_shard_is_reported() {
        let ring = ConsistentHashStrategy::with_shards(["elsewhere"], 8).unwrap();
        let db: Coordinator<i32> = Coordinator::new(["shard-0"], Arc::new(ring)).unwrap();

        assert!(matches!(db.insert("k", 1), Err(Error::ShardNotFound(id)) if id == "elsewhere"));
    }

    #[test]
    fn test_add_and_remove_shard_updates_ring() {
        let config = ShardingConfig::new(2).with_strategy(StrategyKind::ConsistentHash);
        let db: Coordinator<i32> = Coordinator::from_config(&config).unwrap();

        db.add_shard("shard-2").unwrap();
        assert!(matches!(db.add_shard("shard-2"), Err(Error::DuplicateShard(_))));
        assert_eq!(db.shard_count(), 3);

        for i in 0..300 {
            db.insert(&format!("key-{}", i), i).unwrap();
        }
        assert!(db.get_shard_distribution().iter().all(|c| *c > 0));

        let removed = db.remove_shard("shard-2").unwrap();
        assert!(removed.size > 0);
        assert!(db.remove_shard("shard-2").is_none());
        assert_eq!(db.len(), 300 - removed.size);

        // no key resolves to the removed shard anymore
        for i in 0..300 {
            assert_ne!(db.shard_for_key(&format!("key-{}", i)).unwrap(), "shard-2");
        }
    }

    #[test]
    fn test_byte_keys() {
        let db = modulo(3);
        db.insert_bytes(b"abc", 1).unwrap();
        assert_eq!(db.query_bytes(b"abc").unwrap(), Some(1));
        assert_eq!(db.query("abc").unwrap(), Some(1));

        assert!(matches!(db.insert_bytes(&[0xff, 0xfe], 2), Err(Error::InvalidKey(_))));
        assert!(matches!(db.query_bytes(&[0xc3]), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_clear_and_export() {
        let db = modulo(3);
        db.insert("a", 1).unwrap();
        assert_eq!(db.export().unwrap(), "[1]");

        db.clear();
        assert!(db.is_empty());
        assert_eq!(db.shard_count(), 3);
        assert_eq!(db.export().unwrap(), "[]");
    }

    #[test]
    fn test_stats_and_metrics() {
        let db = modulo(3);
        db.insert("a", 1).unwrap();
        db.query("a").unwrap();
        db.query("b").unwrap();
        db.query_all();

        let stats = db.stats();
        assert_eq!(stats.strategy, "modulo-hash");
        assert_eq!(stats.shard_count, 3);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.operations_total, 4);
        assert_eq!(stats.shards.len(), 3);

        let snapshot = db.metrics().snapshot();
        assert_eq!(snapshot.insert_total, 1);
        assert_eq!(snapshot.query_hits, 1);
        assert_eq!(snapshot.query_misses, 1);
        assert_eq!(snapshot.scan_total, 1);
    }
}

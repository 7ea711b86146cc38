//! Consistent hashing with virtual nodes.
//!
//! Each shard contributes `virtual_nodes_per_shard` positions to a sorted
//! ring, hashed from `"{shard_id}:{index}"`. A key belongs to the first
//! position at or after its own hash, wrapping to the smallest position.
//! Adding or removing a shard only touches that shard's positions, so only
//! keys adjacent to them change owner.

use super::strategy::ShardingStrategy;
use crate::error::{Error, Result};
use crate::types::{DistributionStats, ShardId, ShardTarget};
use parking_lot::RwLock;
use std::hash::Hasher;
use twox_hash::XxHash32;

/// Number of virtual nodes per shard.
pub const DEFAULT_VIRTUAL_NODES: usize = 150;

#[derive(Debug, Default)]
struct Ring {
    /// Ascending by `(position, shard_id)`.
    entries: Vec<(u32, ShardId)>,

    /// Live shards in join order.
    shards: Vec<ShardId>,
}

impl Ring {
    fn owner_at(&self, position: u32) -> Option<&ShardId> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = self.entries.partition_point(|(p, _)| *p < position);
        let idx = if idx == self.entries.len() { 0 } else { idx };
        Some(&self.entries[idx].1)
    }
}

/// Hash-ring placement with bounded remapping on membership change.
#[derive(Debug)]
pub struct ConsistentHashStrategy {
    virtual_nodes_per_shard: usize,
    ring: RwLock<Ring>,
}

impl ConsistentHashStrategy {
    /// Create an empty ring.
    pub fn new(virtual_nodes_per_shard: usize) -> Result<Self> {
        if virtual_nodes_per_shard == 0 {
            return Err(Error::Config(
                "virtual_nodes_per_shard must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            virtual_nodes_per_shard,
            ring: RwLock::new(Ring::default()),
        })
    }

    /// Create a ring pre-populated with `shard_ids`.
    pub fn with_shards<I, S>(shard_ids: I, virtual_nodes_per_shard: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let strategy = Self::new(virtual_nodes_per_shard)?;
        for id in shard_ids {
            strategy.add_shard(id.as_ref());
        }
        Ok(strategy)
    }

    pub fn virtual_nodes_per_shard(&self) -> usize {
        self.virtual_nodes_per_shard
    }

    /// Add a shard's virtual nodes. No-op if the shard is already present.
    pub fn add_shard(&self, shard_id: &str) {
        let mut ring = self.ring.write();
        if ring.shards.iter().any(|s| s == shard_id) {
            return;
        }

        ring.shards.push(shard_id.to_string());
        for i in 0..self.virtual_nodes_per_shard {
            let position = ring_hash(&format!("{}:{}", shard_id, i));
            ring.entries.push((position, shard_id.to_string()));
        }
        ring.entries.sort_unstable();

        tracing::debug!(
            shard_id,
            vnodes = self.virtual_nodes_per_shard,
            ring_size = ring.entries.len(),
            "added shard to ring"
        );
    }

    /// Remove every virtual node owned by `shard_id`. Unknown ids are ignored.
    pub fn remove_shard(&self, shard_id: &str) {
        let mut ring = self.ring.write();
        let before = ring.shards.len();
        ring.shards.retain(|s| s != shard_id);
        if ring.shards.len() == before {
            return;
        }

        // retain keeps the remaining entries in sorted order
        ring.entries.retain(|(_, owner)| owner != shard_id);

        tracing::debug!(shard_id, ring_size = ring.entries.len(), "removed shard from ring");
    }

    pub fn contains_shard(&self, shard_id: &str) -> bool {
        self.ring.read().shards.iter().any(|s| s == shard_id)
    }

    /// Live shard ids in join order.
    pub fn shard_ids(&self) -> Vec<ShardId> {
        self.ring.read().shards.clone()
    }

    pub fn shard_count(&self) -> usize {
        self.ring.read().shards.len()
    }

    /// Total virtual nodes on the ring.
    pub fn vnode_count(&self) -> usize {
        self.ring.read().entries.len()
    }

    /// Copy of the ring as `(position, shard_id)` pairs in ascending order.
    pub fn ring_entries(&self) -> Vec<(u32, ShardId)> {
        self.ring.read().entries.clone()
    }

    /// Shard owning ring position `position`.
    pub fn owner_at(&self, position: u32) -> Option<ShardId> {
        self.ring.read().owner_at(position).cloned()
    }

    /// Shard owning `key`.
    pub fn lookup(&self, key: &str) -> Result<ShardId> {
        self.owner_at(ring_hash(key)).ok_or_else(Error::no_shards)
    }

    /// Count how `keys` would spread over the current ring.
    ///
    /// Pure analysis; the ring is not modified.
    pub fn distribution_stats<I, S>(&self, keys: I) -> DistributionStats
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ring = self.ring.read();
        let mut counts: Vec<(ShardId, usize)> =
            ring.shards.iter().map(|id| (id.clone(), 0)).collect();

        for key in keys {
            if let Some(owner) = ring.owner_at(ring_hash(key.as_ref())) {
                if let Some(slot) = counts.iter_mut().find(|(id, _)| id == owner) {
                    slot.1 += 1;
                }
            }
        }

        DistributionStats::from_counts(counts)
    }
}

impl Default for ConsistentHashStrategy {
    fn default() -> Self {
        Self {
            virtual_nodes_per_shard: DEFAULT_VIRTUAL_NODES,
            ring: RwLock::new(Ring::default()),
        }
    }
}

impl ShardingStrategy for ConsistentHashStrategy {
    fn name(&self) -> &'static str {
        "consistent-hash"
    }

    fn resolve(&self, key: &str, shard_count: usize) -> Result<ShardTarget> {
        if shard_count == 0 {
            return Err(Error::no_shards());
        }
        self.lookup(key).map(ShardTarget::Id)
    }

    fn add_shard(&self, shard_id: &str) {
        ConsistentHashStrategy::add_shard(self, shard_id);
    }

    fn remove_shard(&self, shard_id: &str) {
        ConsistentHashStrategy::remove_shard(self, shard_id);
    }
}

/// Ring position of a virtual node label or key.
fn ring_hash(s: &str) -> u32 {
    let mut hasher = XxHash32::with_seed(0);
    hasher.write(s.as_bytes());
    hasher.finish() as u32
}

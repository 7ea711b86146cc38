//! The sharding strategy abstraction.

use crate::error::Result;
use crate::types::ShardTarget;
use std::fmt::Debug;

/// Maps a key to the shard that should hold it.
///
/// Strategies keep any mutable state (counters, rings) behind their own
/// synchronization, so a single instance can be shared by a coordinator and
/// by callers holding an `Arc`.
pub trait ShardingStrategy: Send + Sync + Debug {
    /// Short, stable name used in logs and stats.
    fn name(&self) -> &'static str;

    /// Resolve `key` against a shard set of `shard_count` shards.
    ///
    /// Fails with [`Error::Config`](crate::Error::Config) when there is
    /// nothing to resolve against.
    fn resolve(&self, key: &str, shard_count: usize) -> Result<ShardTarget>;

    /// A shard joined the coordinator. Stateless strategies ignore this.
    fn add_shard(&self, _shard_id: &str) {}

    /// A shard left the coordinator. Unknown ids are ignored.
    fn remove_shard(&self, _shard_id: &str) {}
}

//! In-memory sharded key-space with pluggable placement strategies.
//!
//! A [`Coordinator`] owns a set of [`Shard`]s and routes every single-key
//! operation through the active [`ShardingStrategy`]:
//!
//! - **Modulo hash**: `|hash(key)| mod n`. Deterministic; resharding remaps most keys.
//! - **Round robin**: ignores the key and cycles through shards in call order.
//! - **Consistent hash**: a ring of virtual nodes; adding or removing a shard
//!   only remaps keys adjacent to that shard's positions.
//!
//! Full scans (`query_all`) fan out to every shard, and distribution reports
//! score how evenly keys are spread.
//!
//! # Example
//!
//! ```rust
//! use keyshard::{Coordinator, ShardingConfig, StrategyKind};
//!
//! let config = ShardingConfig::new(3).with_strategy(StrategyKind::ConsistentHash);
//! let db: Coordinator<u32> = Coordinator::from_config(&config)?;
//!
//! db.insert("user:1", 10)?;
//! db.insert("user:2", 20)?;
//!
//! assert_eq!(db.query("user:1")?, Some(10));
//! assert_eq!(db.query("user:3")?, None);
//! assert_eq!(db.query_all().len(), 2);
//! # Ok::<(), keyshard::Error>(())
//! ```
//!
//! # Strategy switches
//!
//! [`Coordinator::switch_strategy`] swaps the placement function without
//! moving any stored entry. Keys written under the old strategy may resolve
//! to a different shard afterwards and read as missing.

pub mod config;
pub mod error;
pub mod metrics;
pub mod partitioning;
pub mod sharding;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{ShardingConfig, StrategyKind};
pub use error::{Error, Result};
pub use metrics::{CoordinatorMetrics, MetricsSnapshot};
pub use partitioning::{
    ConsistentHashStrategy, ModuloHashStrategy, RoundRobinStrategy, ShardingStrategy,
};
pub use sharding::{Coordinator, CoordinatorStats, Shard, ShardStats};
pub use types::{DistributionStats, ShardId, ShardTarget};

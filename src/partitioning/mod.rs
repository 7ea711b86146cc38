//! Strategies that map a key onto a shard.
//!
//! ```text
//!                      ShardingStrategy::resolve(key, n)
//!                                   │
//!        ┌──────────────────────────┼──────────────────────────┐
//!        ▼                          ▼                          ▼
//! ┌──────────────┐          ┌──────────────┐          ┌─────────────────┐
//! │ ModuloHash   │          │ RoundRobin   │          │ ConsistentHash  │
//! │ |h(key)| % n │          │ counter++ % n│          │ ring ≥ h(key)   │
//! │ → Index      │          │ → Index      │          │ → Id (wraps)    │
//! └──────────────┘          └──────────────┘          └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use keyshard::partitioning::{ConsistentHashStrategy, ModuloHashStrategy, ShardingStrategy};
//! use keyshard::ShardTarget;
//!
//! let modulo = ModuloHashStrategy::new();
//! assert_eq!(modulo.resolve("", 4).unwrap(), ShardTarget::Index(0));
//!
//! let ring = ConsistentHashStrategy::with_shards(["shard-0", "shard-1"], 150).unwrap();
//! let owner = ring.lookup("user:123").unwrap();
//! assert!(owner == "shard-0" || owner == "shard-1");
//! ```

mod hash;
mod hashring;
mod modulo;
mod round_robin;
mod strategy;

pub use hash::string_hash;
pub use hashring::{ConsistentHashStrategy, DEFAULT_VIRTUAL_NODES};
pub use modulo::{ModuloDiagnostics, ModuloHashStrategy};
pub use round_robin::{RoundRobinStrategy, MAX_COUNTER};
pub use strategy::ShardingStrategy;

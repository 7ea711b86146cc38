//! Shards and the coordinator that routes operations across them.
//!
//! ```text
//! caller ──► Coordinator ──► ShardingStrategy::resolve(key, n)
//!                 │                       │
//!                 │        Index(i) / Id("shard-i")
//!                 ▼                       ▼
//!          ┌─────────┐ ┌─────────┐ ┌─────────┐
//!          │ shard-0 │ │ shard-1 │ │ shard-2 │   one lock per shard
//!          └─────────┘ └─────────┘ └─────────┘
//!                 ▲           ▲           ▲
//!                 └──── query_all fans out ┘
//! ```

mod coordinator;
mod shard;

pub use coordinator::{Coordinator, CoordinatorStats};
pub use shard::{Shard, ShardStats};

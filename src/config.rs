//! Configuration for building a coordinator.

use crate::error::{Error, Result};
use crate::partitioning::{
    ConsistentHashStrategy, ModuloHashStrategy, RoundRobinStrategy, ShardingStrategy,
    DEFAULT_VIRTUAL_NODES,
};
use crate::types::ShardId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Which placement algorithm to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Hash the key, take it modulo the shard count.
    #[default]
    ModuloHash,

    /// Ignore the key and cycle through shards.
    RoundRobin,

    /// Hash ring with virtual nodes.
    ConsistentHash,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::ModuloHash => write!(f, "modulo-hash"),
            StrategyKind::RoundRobin => write!(f, "round-robin"),
            StrategyKind::ConsistentHash => write!(f, "consistent-hash"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modulo" | "modulo-hash" | "hash" => Ok(StrategyKind::ModuloHash),
            "round-robin" | "roundrobin" => Ok(StrategyKind::RoundRobin),
            "consistent" | "consistent-hash" => Ok(StrategyKind::ConsistentHash),
            other => Err(Error::Config(format!("unknown strategy: {}", other))),
        }
    }
}

/// Shard layout and placement settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardingConfig {
    /// Number of shards created up front.
    pub shard_count: usize,

    /// Shard ids are `{shard_prefix}-{index}`.
    pub shard_prefix: String,

    /// Ring positions per shard for consistent hashing.
    pub virtual_nodes: usize,

    /// Placement algorithm.
    pub strategy: StrategyKind,
}

impl Default for ShardingConfig {
    fn default() -> Self {
        Self {
            shard_count: 3,
            shard_prefix: "shard".to_string(),
            virtual_nodes: DEFAULT_VIRTUAL_NODES,
            strategy: StrategyKind::ModuloHash,
        }
    }
}

impl ShardingConfig {
    /// Create a configuration with `shard_count` shards and defaults elsewhere.
    pub fn new(shard_count: usize) -> Self {
        Self {
            shard_count,
            ..Default::default()
        }
    }

    /// Set the number of shards.
    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    /// Set the shard id prefix.
    pub fn with_shard_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.shard_prefix = prefix.into();
        self
    }

    /// Set the virtual node count per shard.
    pub fn with_virtual_nodes(mut self, virtual_nodes: usize) -> Self {
        self.virtual_nodes = virtual_nodes;
        self
    }

    /// Set the placement strategy.
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.shard_count == 0 {
            return Err(Error::Config("shard_count must be at least 1".to_string()));
        }
        if self.shard_prefix.is_empty() {
            return Err(Error::Config("shard_prefix must not be empty".to_string()));
        }
        if self.strategy == StrategyKind::ConsistentHash && self.virtual_nodes == 0 {
            return Err(Error::Config(
                "virtual_nodes must be at least 1 for consistent hashing".to_string(),
            ));
        }
        Ok(())
    }

    /// Shard ids in declaration order.
    pub fn shard_ids(&self) -> Vec<ShardId> {
        (0..self.shard_count)
            .map(|i| format!("{}-{}", self.shard_prefix, i))
            .collect()
    }

    /// Build the configured strategy, with every configured shard registered.
    pub fn build_strategy(&self) -> Result<Arc<dyn ShardingStrategy>> {
        self.validate()?;
        let strategy: Arc<dyn ShardingStrategy> = match self.strategy {
            StrategyKind::ModuloHash => Arc::new(ModuloHashStrategy::new()),
            StrategyKind::RoundRobin => Arc::new(RoundRobinStrategy::new()),
            StrategyKind::ConsistentHash => Arc::new(ConsistentHashStrategy::with_shards(
                self.shard_ids(),
                self.virtual_nodes,
            )?),
        };
        Ok(strategy)
    }
}

//! Core types used throughout the sharded key-space.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Shard identifier. Unique within a coordinator.
pub type ShardId = String;

/// Where a strategy routes a key.
///
/// Index-based strategies address shards by position in the coordinator's
/// shard list; the hash ring addresses them by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShardTarget {
    /// Position in the shard list, always `< shard_count`.
    Index(usize),
    /// Shard id owning the matching ring entry.
    Id(ShardId),
}

impl std::fmt::Display for ShardTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShardTarget::Index(index) => write!(f, "#{}", index),
            ShardTarget::Id(id) => write!(f, "{}", id),
        }
    }
}

/// Key distribution report across a set of shards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    /// Per-shard key counts, in shard order.
    pub counts: Vec<(ShardId, usize)>,

    /// Total number of keys counted.
    pub total: usize,

    /// Mean keys per shard.
    pub mean: f64,

    /// Population standard deviation of the per-shard counts.
    pub std_dev: f64,

    /// `1 - std_dev / mean`, clamped to `[0, 1]`. An empty population is perfectly balanced.
    pub balance: f64,
}

impl DistributionStats {
    /// Compute distribution statistics from per-shard counts.
    pub fn from_counts(counts: Vec<(ShardId, usize)>) -> Self {
        let total: usize = counts.iter().map(|(_, c)| *c).sum();

        if counts.is_empty() || total == 0 {
            return Self {
                counts,
                total,
                mean: 0.0,
                std_dev: 0.0,
                balance: 1.0,
            };
        }

        let n = counts.len() as f64;
        let mean = total as f64 / n;
        let variance = counts
            .iter()
            .map(|(_, c)| {
                let d = *c as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();
        let balance = (1.0 - std_dev / mean).clamp(0.0, 1.0);

        Self {
            counts,
            total,
            mean,
            std_dev,
            balance,
        }
    }

    /// True if every shard holds within one key of the mean.
    pub fn is_balanced(&self) -> bool {
        self.counts
            .iter()
            .all(|(_, c)| (*c as f64 - self.mean).abs() <= 1.0)
    }
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(values: &[usize]) -> Vec<(ShardId, usize)> {
        values
            .iter()
            .enumerate()
            .map(|(i, c)| (format!("shard-{}", i), *c))
            .collect()
    }

    #[test]
    fn test_empty_population_is_balanced() {
        let stats = DistributionStats::from_counts(Vec::new());
        assert_eq!(stats.balance, 1.0);
        assert!(stats.is_balanced());

        let stats = DistributionStats::from_counts(counts(&[0, 0, 0]));
        assert_eq!(stats.total, 0);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.balance, 1.0);
        assert!(stats.is_balanced());
    }

    #[test]
    fn test_even_distribution() {
        let stats = DistributionStats::from_counts(counts(&[10, 10, 10]));
        assert_eq!(stats.total, 30);
        assert_eq!(stats.mean, 10.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.balance, 1.0);
        assert!(stats.is_balanced());
    }

    #[test]
    fn test_skewed_distribution() {
        // mean 10, deviations -10, +20, -10 -> variance 200
        let stats = DistributionStats::from_counts(counts(&[0, 30, 0]));
        assert!((stats.std_dev - 200f64.sqrt()).abs() < 1e-9);
        assert_eq!(stats.balance, 0.0);
        assert!(!stats.is_balanced());
    }

    #[test]
    fn test_off_by_one_is_balanced() {
        let stats = DistributionStats::from_counts(counts(&[3, 4, 4]));
        assert!(stats.is_balanced());
        assert!(stats.balance > 0.0 && stats.balance <= 1.0);
    }

    #[test]
    fn test_target_display() {
        assert_eq!(ShardTarget::Index(2).to_string(), "#2");
        assert_eq!(ShardTarget::Id("shard-1".into()).to_string(), "shard-1");
    }
}

//! Call-order placement that ignores the key.

use super::strategy::ShardingStrategy;
use crate::error::{Error, Result};
use crate::types::ShardTarget;
use std::sync::atomic::{AtomicU64, Ordering};

/// Largest counter value before wrapping back to zero (2^53 - 1).
pub const MAX_COUNTER: u64 = (1 << 53) - 1;

/// Cycles through shard indices in call order.
///
/// Every `resolve` returns `counter mod shard_count` and then advances the
/// counter, so the same key lands on different shards over time. Point
/// lookups through a coordinator therefore only find a value if they happen
/// to hit the slot the insert used.
#[derive(Debug, Default)]
pub struct RoundRobinStrategy {
    counter: AtomicU64,
}

impl RoundRobinStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn starting_at(counter: u64) -> Self {
        Self {
            counter: AtomicU64::new(counter),
        }
    }

    /// Next index, advancing the counter.
    pub fn next_index(&self, shard_count: usize) -> Result<usize> {
        if shard_count == 0 {
            return Err(Error::no_shards());
        }
        let current = self
            .counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
                Some(if c >= MAX_COUNTER { 0 } else { c + 1 })
            })
            .unwrap_or_else(|c| c);
        Ok((current % shard_count as u64) as usize)
    }

    /// The index the next call would return, without advancing.
    pub fn peek_next(&self, shard_count: usize) -> Result<usize> {
        if shard_count == 0 {
            return Err(Error::no_shards());
        }
        Ok((self.counter.load(Ordering::Acquire) % shard_count as u64) as usize)
    }

    /// Restart the cycle at index 0.
    pub fn reset(&self) {
        self.counter.store(0, Ordering::Release);
    }

    /// Raw counter value.
    pub fn counter(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }
}

impl ShardingStrategy for RoundRobinStrategy {
    fn name(&self) -> &'static str {
        "round-robin"
    }

    fn resolve(&self, _key: &str, shard_count: usize) -> Result<ShardTarget> {
        self.next_index(shard_count).map(ShardTarget::Index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence() {
        let strategy = RoundRobinStrategy::new();
        let seq: Vec<usize> = ["a", "b", "c", "d"]
            .iter()
            .map(|_| strategy.next_index(3).unwrap())
            .collect();
        assert_eq!(seq, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_ignores_key() {
        let strategy = RoundRobinStrategy::new();
        assert_eq!(strategy.resolve("key1", 2).unwrap(), ShardTarget::Index(0));
        assert_eq!(strategy.resolve("key1", 2).unwrap(), ShardTarget::Index(1));
    }

    #[test]
    fn test_peek_does_not_advance() {
        let strategy = RoundRobinStrategy::new();
        strategy.next_index(4).unwrap();

        assert_eq!(strategy.peek_next(4).unwrap(), 1);
        assert_eq!(strategy.peek_next(4).unwrap(), 1);
        assert_eq!(strategy.next_index(4).unwrap(), 1);
        assert_eq!(strategy.counter(), 2);
    }

    #[test]
    fn test_reset() {
        let strategy = RoundRobinStrategy::new();
        for _ in 0..5 {
            strategy.next_index(3).unwrap();
        }
        strategy.reset();
        assert_eq!(strategy.next_index(3).unwrap(), 0);
    }

    #[test]
    fn test_zero_shards_does_not_advance() {
        let strategy = RoundRobinStrategy::new();
        assert!(matches!(strategy.resolve("k", 0), Err(Error::Config(_))));
        assert!(matches!(strategy.peek_next(0), Err(Error::Config(_))));
        assert_eq!(strategy.counter(), 0);
    }

    #[test]
    fn test_wraps_at_max() {
        let strategy = RoundRobinStrategy::starting_at(MAX_COUNTER);
        assert_eq!(
            strategy.next_index(1_000).unwrap(),
            (MAX_COUNTER % 1_000) as usize
        );
        assert_eq!(strategy.counter(), 0);
        assert_eq!(strategy.next_index(1_000).unwrap(), 0);
    }
}

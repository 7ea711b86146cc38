use crate::{Coordinator, ShardingConfig, StrategyKind};
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Deterministic RNG so failures reproduce.
pub(crate) fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A random alphanumeric key of 1..=24 characters.
pub(crate) fn random_key(rng: &mut StdRng) -> String {
    let len = rng.random_range(1..=24);
    rng.sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// `count` distinct random keys.
pub(crate) fn distinct_keys(rng: &mut StdRng, count: usize) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut keys = Vec::with_capacity(count);
    while keys.len() < count {
        let key = random_key(rng);
        if seen.insert(key.clone()) {
            keys.push(key);
        }
    }
    keys
}

/// Coordinator over `shards` default-named shards with `kind` placement.
pub(crate) fn coordinator<V>(shards: usize, kind: StrategyKind) -> Coordinator<V> {
    Coordinator::from_config(&ShardingConfig::new(shards).with_strategy(kind)).unwrap()
}

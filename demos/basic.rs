//! Basic example: route keys across shards and compare strategies.

use keyshard::partitioning::{ConsistentHashStrategy, RoundRobinStrategy};
use keyshard::{Coordinator, ShardingConfig, StrategyKind};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("keyshard=debug,info")
        .init();

    let config = ShardingConfig::new(4).with_strategy(StrategyKind::ModuloHash);
    let db: Coordinator<String> = Coordinator::from_config(&config)?;

    println!("--- Modulo hash ---");
    for i in 0..20 {
        db.insert(&format!("user:{}", i), format!("User {}", i))?;
    }
    println!("user:7 -> {:?}", db.query("user:7")?);
    println!("distribution: {:?}", db.get_shard_distribution());
    println!("balanced: {}", db.is_balanced());

    // Switching does not move data; most lookups now miss.
    println!("\n--- Switch to round robin ---");
    db.switch_strategy(Arc::new(RoundRobinStrategy::new()));
    let hits = (0..20)
        .filter(|i| matches!(db.query(&format!("user:{}", i)), Ok(Some(_))))
        .count();
    println!("readable after switch: {}/20", hits);

    println!("\n--- Consistent hash ---");
    let ring = Arc::new(ConsistentHashStrategy::with_shards(db.shard_ids(), 150)?);
    let keys: Vec<String> = (0..10_000).map(|i| format!("session:{}", i)).collect();
    let before = ring.distribution_stats(&keys);
    println!(
        "4 shards: mean {:.1}, std dev {:.1}, balance {:.3}",
        before.mean, before.std_dev, before.balance
    );

    db.switch_strategy(ring.clone());
    db.add_shard("shard-4")?;
    let after = ring.distribution_stats(&keys);
    println!("5 shards: counts {:?}, balance {:.3}", after.counts, after.balance);

    let stats = db.stats();
    println!("\nCoordinator stats:");
    println!("  Strategy: {}", stats.strategy);
    println!("  Shards: {}", stats.shard_count);
    println!("  Entries: {}", stats.total_entries);
    println!("  Operations: {}", stats.operations_total);

    print!("\n{}", db.metrics().to_prometheus());
    Ok(())
}

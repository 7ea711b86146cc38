//! Operation counters for the coordinator.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              CoordinatorMetrics              │
//! │  insert_total  query_total  scan_total       │
//! │  query_hits    query_misses                  │
//! │  routed_total{shard="shard-0"} ...           │
//! └──────────────────────────────────────────────┘
//! ```

mod counters;

pub use counters::{Counter, LabeledCounter};

use serde::Serialize;

/// Counters maintained by a [`Coordinator`](crate::Coordinator).
#[derive(Debug)]
pub struct CoordinatorMetrics {
    /// Total inserts routed.
    pub insert_total: Counter,
    /// Total point queries routed.
    pub query_total: Counter,
    /// Point queries that found a value.
    pub query_hits: Counter,
    /// Point queries that found nothing.
    pub query_misses: Counter,
    /// Total deletes routed.
    pub delete_total: Counter,
    /// Full scans across every shard.
    pub scan_total: Counter,
    /// Routed single-key operations per shard id.
    pub routed_total: LabeledCounter<1>,
}

impl CoordinatorMetrics {
    /// Create a zeroed metrics set.
    pub fn new() -> Self {
        Self {
            insert_total: Counter::new(),
            query_total: Counter::new(),
            query_hits: Counter::new(),
            query_misses: Counter::new(),
            delete_total: Counter::new(),
            scan_total: Counter::new(),
            routed_total: LabeledCounter::new(["shard"]),
        }
    }

    pub(crate) fn record_query(&self, hit: bool) {
        self.query_total.inc();
        if hit {
            self.query_hits.inc();
        } else {
            self.query_misses.inc();
        }
    }

    /// Point-in-time copy of the scalar counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            insert_total: self.insert_total.get(),
            query_total: self.query_total.get(),
            query_hits: self.query_hits.get(),
            query_misses: self.query_misses.get(),
            delete_total: self.delete_total.get(),
            scan_total: self.scan_total.get(),
        }
    }

    /// Format the counters in Prometheus exposition format.
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        for (counter, name, help) in [
            (&self.insert_total, "keyshard_insert_total", "Total inserts"),
            (&self.query_total, "keyshard_query_total", "Total point queries"),
            (&self.query_hits, "keyshard_query_hits", "Point queries that found a value"),
            (&self.query_misses, "keyshard_query_misses", "Point queries that missed"),
            (&self.delete_total, "keyshard_delete_total", "Total deletes"),
            (&self.scan_total, "keyshard_scan_total", "Full scans"),
        ] {
            counter.encode(&mut output, name, help);
        }
        self.routed_total.encode(
            &mut output,
            "keyshard_routed_total",
            "Single-key operations routed per shard",
        );

        output
    }
}

impl Default for CoordinatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Scalar counter values at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub insert_total: u64,
    pub query_total: u64,
    pub query_hits: u64,
    pub query_misses: u64,
    pub delete_total: u64,
    pub scan_total: u64,
}

impl MetricsSnapshot {
    /// Fraction of point queries that found a value.
    pub fn hit_rate(&self) -> f64 {
        if self.query_total == 0 {
            0.0
        } else {
            self.query_hits as f64 / self.query_total as f64
        }
    }
}

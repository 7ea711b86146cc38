//! Lock-free monotonic counters and their Prometheus text encoding.
//!
//! Counters carry no metadata; name and help text are passed to `encode`.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonic `u64` shared across threads.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Append this counter as a Prometheus `counter` sample.
    pub fn encode(&self, out: &mut String, name: &str, help: &str) {
        write_header(out, name, help);
        let _ = writeln!(out, "{} {}", name, self.get());
    }
}

/// Counters keyed by `N` label values, e.g. routed ops per shard id.
///
/// Series are created on first increment.
#[derive(Debug)]
pub struct LabeledCounter<const N: usize> {
    label_names: [&'static str; N],
    series: RwLock<HashMap<[String; N], AtomicU64>>,
}

impl<const N: usize> LabeledCounter<N> {
    pub fn new(label_names: [&'static str; N]) -> Self {
        Self {
            label_names,
            series: RwLock::new(HashMap::new()),
        }
    }

    pub fn label_names(&self) -> &[&'static str; N] {
        &self.label_names
    }

    /// Increment the series for `labels` by one.
    pub fn inc(&self, labels: [&str; N]) {
        let key: [String; N] = labels.map(str::to_string);

        if let Some(value) = self.series.read().get(&key) {
            value.fetch_add(1, Ordering::Relaxed);
            return;
        }

        self.series
            .write()
            .entry(key)
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Value for `labels`, zero if the series was never touched.
    pub fn get(&self, labels: [&str; N]) -> u64 {
        let key: [String; N] = labels.map(str::to_string);
        self.series
            .read()
            .get(&key)
            .map_or(0, |value| value.load(Ordering::Relaxed))
    }

    /// Every series with its value, sorted by label values.
    pub fn get_all(&self) -> Vec<([String; N], u64)> {
        let mut all: Vec<_> = self
            .series
            .read()
            .iter()
            .map(|(labels, value)| (labels.clone(), value.load(Ordering::Relaxed)))
            .collect();
        all.sort();
        all
    }

    /// Append every series as Prometheus `counter` samples.
    pub fn encode(&self, out: &mut String, name: &str, help: &str) {
        write_header(out, name, help);
        for (values, count) in self.get_all() {
            let labels: Vec<String> = self
                .label_names
                .iter()
                .zip(&values)
                .map(|(label, value)| format!("{}=\"{}\"", label, value))
                .collect();
            let _ = writeln!(out, "{}{{{}}} {}", name, labels.join(","), count);
        }
    }
}

fn write_header(out: &mut String, name: &str, help: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} counter", name);
}

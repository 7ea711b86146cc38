//! Cross-module tests for the sharded key-space.
//!
//! - `scenario_tests`: end-to-end coordinator scenarios
//! - `property_tests`: seeded randomized checks of placement invariants
//! - `concurrency_tests`: multi-threaded routing, scans and strategy swaps

mod utils;

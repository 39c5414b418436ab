//! Herald Benchmark Suite
//!
//! Criterion benchmarks for the notification broker.
//!
//! # Benchmark Categories
//!
//! - **Dispatch**: post fan-out across filter mixes and observer counts
//! - **Lifecycle**: observe, dispose and registrar teardown churn

pub mod fixtures;
pub mod harness;

pub use fixtures::{Animal, Cat, Scale};
pub use harness::TestContext;

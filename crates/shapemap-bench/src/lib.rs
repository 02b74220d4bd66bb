//! shapemap Benchmark Suite
//!
//! Criterion benchmarks for the mapping engine.
//!
//! # Benchmark Categories
//!
//! - **Access**: Record instantiation and checked field reads/writes
//! - **Persist**: Batch writes and scans against both shipped stores

pub mod fixtures;
pub mod harness;

pub use fixtures::{maker_batch, model_batch, CarFixture, Scale};
pub use harness::TestContext;

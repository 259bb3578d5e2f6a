//! Synthetic data for benchmarks and stress tests.

pub mod generator;

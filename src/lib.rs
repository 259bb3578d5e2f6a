//! # bank-recon
//!
//! Reconciles a ledger of transactions against one or more bank-statement
//! feeds for a date window.
//!
//! Bank statements are bucketed by amount. Each transaction consumes the
//! oldest statement of the same amount, if one exists; what remains on
//! either side is reported as a discrepancy, statements grouped by bank.
//!
//! ## Architecture
//!
//! - **core** — Record types: transactions, bank statements, run summary
//! - **matching** — Amount buckets, the reconciliation pass, discrepancy aggregation
//! - **storage** — Source/sink ports with CSV, JSON and in-memory adapters
//! - **executor** — Fail-fast orchestration of load, match and persist
//! - **config** — Invocation parameters and the date window
//! - **simulation** — Random datasets for benchmarks and stress tests

pub mod config;
pub mod core;
pub mod executor;
pub mod matching;
pub mod simulation;
pub mod storage;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::{DateWindow, OutputFormat, ReconConfig};
    pub use crate::core::statement::{BankName, BankStatement};
    pub use crate::core::summary::Summary;
    pub use crate::core::transaction::{Transaction, TransactionKind};
    pub use crate::executor::{ReconError, ReconExecutor};
    pub use crate::matching::bucket::AmountBucketStore;
    pub use crate::matching::discrepancy::{Discrepancies, DiscrepancyAggregator};
    pub use crate::matching::engine::{ReconciliationEngine, ReconciliationReport};
    pub use crate::storage::{ReportSink, StatementSource, StorageError, TransactionSource};
}

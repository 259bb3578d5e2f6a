//! Storage ports and their adapters.
//!
//! The engine never touches files. Sources hand it ordered, window-filtered
//! records; sinks accept the finished report one section at a time.
//!
//! - [`csv_source`] — CSV transaction and bank-statement feeds
//! - [`sink`] — section-based report sinks (CSV workbook directory, JSON document)
//! - [`memory`] — in-memory source and sink

pub mod csv_source;
pub mod memory;
pub mod sink;

use crate::config::DateWindow;
use crate::core::statement::{BankName, BankStatement};
use crate::core::summary::Summary;
use crate::core::transaction::Transaction;
use crate::matching::discrepancy::DiscrepancyGroup;
use std::io;
use thiserror::Error;

/// Errors raised by sources and sinks.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("source '{source_ref}' is unavailable")]
    SourceUnavailable {
        source_ref: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed record in '{source_ref}' at line {line}: {reason}")]
    MalformedRecord {
        source_ref: String,
        line: u64,
        reason: String,
    },
    #[error("no data rows found in '{source_ref}'")]
    EmptyDataset { source_ref: String },
    #[error("failed to write section '{section}'")]
    SinkWriteFailed {
        section: String,
        #[source]
        source: io::Error,
    },
}

/// Reads ledger transactions for a date window.
pub trait TransactionSource {
    /// Records come back in source order, already filtered to `window`.
    fn read_transactions(
        &self,
        source_ref: &str,
        window: &DateWindow,
    ) -> Result<Vec<Transaction>, StorageError>;
}

/// Reads one bank-statement feed for a date window.
pub trait StatementSource {
    /// Returns the feed's bank name alongside its statements, each of which
    /// carries that same name.
    fn read_statements(
        &self,
        source_ref: &str,
        window: &DateWindow,
    ) -> Result<(BankName, Vec<BankStatement>), StorageError>;
}

/// Persists the pieces of a reconciliation report.
///
/// Each call either fully succeeds or reports an error. Implemented for
/// every [`sink::SectionWriter`], which supplies the upsert-by-name storage.
pub trait ReportSink {
    fn write_summary(&mut self, summary: &Summary) -> Result<(), StorageError>;

    fn write_unmatched_transactions(
        &mut self,
        transactions: &[Transaction],
    ) -> Result<(), StorageError>;

    fn write_discrepancies(
        &mut self,
        bank: &BankName,
        group: &DiscrepancyGroup,
    ) -> Result<(), StorageError>;
}

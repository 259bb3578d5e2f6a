//! In-memory source and sink, for tests and for embedding the engine.

use crate::config::DateWindow;
use crate::core::statement::{BankName, BankStatement};
use crate::core::transaction::Transaction;
use crate::storage::sink::{Section, SectionWriter};
use crate::storage::{StatementSource, StorageError, TransactionSource};
use std::collections::{BTreeMap, HashMap};
use std::io;

/// Named feeds held in memory.
///
/// Reads behave like the file-backed sources: an unknown reference is
/// `SourceUnavailable`, a feed with no records is `EmptyDataset`, and
/// records outside the window are dropped.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    transactions: HashMap<String, Vec<Transaction>>,
    statements: HashMap<String, (BankName, Vec<BankStatement>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transactions(mut self, source_ref: &str, transactions: Vec<Transaction>) -> Self {
        self.transactions.insert(source_ref.to_string(), transactions);
        self
    }

    /// Register a statement feed. Statements are re-stamped with `bank`.
    pub fn with_statements(
        mut self,
        source_ref: &str,
        bank: BankName,
        statements: Vec<BankStatement>,
    ) -> Self {
        let stamped = statements
            .into_iter()
            .map(|s| BankStatement::new(bank.clone(), s.id(), s.amount(), s.timestamp()))
            .collect();
        self.statements
            .insert(source_ref.to_string(), (bank, stamped));
        self
    }
}

fn unavailable(source_ref: &str) -> StorageError {
    StorageError::SourceUnavailable {
        source_ref: source_ref.to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "no such in-memory feed"),
    }
}

impl TransactionSource for MemorySource {
    fn read_transactions(
        &self,
        source_ref: &str,
        window: &DateWindow,
    ) -> Result<Vec<Transaction>, StorageError> {
        let feed = self
            .transactions
            .get(source_ref)
            .ok_or_else(|| unavailable(source_ref))?;
        if feed.is_empty() {
            return Err(StorageError::EmptyDataset {
                source_ref: source_ref.to_string(),
            });
        }
        Ok(feed
            .iter()
            .filter(|tx| window.contains(tx.timestamp()))
            .cloned()
            .collect())
    }
}

impl StatementSource for MemorySource {
    fn read_statements(
        &self,
        source_ref: &str,
        window: &DateWindow,
    ) -> Result<(BankName, Vec<BankStatement>), StorageError> {
        let (bank, feed) = self
            .statements
            .get(source_ref)
            .ok_or_else(|| unavailable(source_ref))?;
        if feed.is_empty() {
            return Err(StorageError::EmptyDataset {
                source_ref: source_ref.to_string(),
            });
        }
        let statements = feed
            .iter()
            .filter(|s| window.contains(s.timestamp()))
            .cloned()
            .collect();
        Ok((bank.clone(), statements))
    }
}

/// Records every section written, in write order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    sections: BTreeMap<String, Section>,
    writes: Vec<String>,
    fail_on: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects writes to the named section.
    pub fn failing_on(section: impl Into<String>) -> Self {
        Self {
            fail_on: Some(section.into()),
            ..Self::default()
        }
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn sections(&self) -> &BTreeMap<String, Section> {
        &self.sections
    }

    /// Section names in the order they were written, repeats included.
    pub fn writes(&self) -> &[String] {
        &self.writes
    }
}

impl SectionWriter for MemorySink {
    fn upsert_section(&mut self, name: &str, section: &Section) -> Result<(), StorageError> {
        if self.fail_on.as_deref() == Some(name) {
            return Err(StorageError::SinkWriteFailed {
                section: name.to_string(),
                source: io::Error::new(io::ErrorKind::Other, "write rejected"),
            });
        }
        self.sections.insert(name.to_string(), section.clone());
        self.writes.push(name.to_string());
        Ok(())
    }
}

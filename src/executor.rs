//! Orchestration of a full reconciliation run over the storage ports.

use crate::config::{ConfigError, ReconConfig};
use crate::core::statement::BankName;
use crate::core::transaction::Transaction;
use crate::matching::bucket::{AmountBucketStore, AmountOverflow};
use crate::matching::discrepancy::DiscrepancyAggregator;
use crate::matching::engine::{ReconciliationEngine, ReconciliationReport};
use crate::storage::sink::{is_reserved_section, SUMMARY_SECTION, TRANSACTION_SECTION};
use crate::storage::{ReportSink, StatementSource, StorageError, TransactionSource};
use rust_decimal::Decimal;
use thiserror::Error;

/// A failed run, naming the source or section that broke it.
#[derive(Debug, Error)]
pub enum ReconError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
    #[error("failed to load transactions from '{source_ref}'")]
    LoadTransactions {
        source_ref: String,
        #[source]
        source: StorageError,
    },
    #[error("failed to load bank statements from '{source_ref}'")]
    LoadStatements {
        source_ref: String,
        #[source]
        source: StorageError,
    },
    #[error("bank name '{bank}' from '{source_ref}' collides with a report section name")]
    ReservedBankName { source_ref: String, bank: BankName },
    #[error("amounts in '{source_ref}' overflow the run total")]
    AmountOverflow {
        source_ref: String,
        #[source]
        source: AmountOverflow,
    },
    #[error("failed to persist report section '{section}'")]
    Persist {
        section: String,
        #[source]
        source: StorageError,
    },
}

/// Runs load → reconcile → aggregate → persist, stopping at the first error.
///
/// Nothing is written unless every source loaded. Once persistence starts,
/// sections are written in a fixed order (summary, unmatched transactions,
/// then one section per bank by name) and a failed write stops the run
/// without attempting the rest.
pub struct ReconExecutor<T, S, R> {
    transactions: T,
    statements: S,
    sink: R,
}

impl<T, S, R> ReconExecutor<T, S, R>
where
    T: TransactionSource,
    S: StatementSource,
    R: ReportSink,
{
    pub fn new(transactions: T, statements: S, sink: R) -> Self {
        Self {
            transactions,
            statements,
            sink,
        }
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn into_sink(self) -> R {
        self.sink
    }

    /// Load the transactions and every statement feed, in configured order.
    ///
    /// Rejects a feed whose bank name would overwrite the summary or
    /// transaction section, and any record that would take the transaction
    /// or statement total out of `Decimal` range.
    pub fn load(
        &self,
        config: &ReconConfig,
    ) -> Result<(Vec<Transaction>, AmountBucketStore), ReconError> {
        let transactions = self
            .transactions
            .read_transactions(&config.transaction_source, &config.window)
            .map_err(|source| ReconError::LoadTransactions {
                source_ref: config.transaction_source.clone(),
                source,
            })?;
        check_transaction_total(&config.transaction_source, &transactions)?;

        let mut buckets = AmountBucketStore::new();
        for source_ref in &config.statement_sources {
            let (bank, statements) = self
                .statements
                .read_statements(source_ref, &config.window)
                .map_err(|source| ReconError::LoadStatements {
                    source_ref: source_ref.clone(),
                    source,
                })?;
            if is_reserved_section(bank.as_str()) {
                return Err(ReconError::ReservedBankName {
                    source_ref: source_ref.clone(),
                    bank,
                });
            }
            log::debug!("bucketing {} statement(s) for bank {}", statements.len(), bank);
            for statement in statements {
                buckets
                    .try_insert(statement)
                    .map_err(|source| ReconError::AmountOverflow {
                        source_ref: source_ref.clone(),
                        source,
                    })?;
            }
        }

        log::info!(
            "loaded {} transaction(s) and {} statement(s) in {} bucket(s) for {}",
            transactions.len(),
            buckets.inserted(),
            buckets.len(),
            config.window
        );
        Ok((transactions, buckets))
    }

    pub fn execute(&mut self, config: &ReconConfig) -> Result<ReconciliationReport, ReconError> {
        config.validate()?;

        let (transactions, mut buckets) = self.load(config)?;
        let (unmatched_transactions, mut summary) =
            ReconciliationEngine::reconcile(transactions, &mut buckets);
        let discrepancies = DiscrepancyAggregator::aggregate(&mut buckets, &mut summary);

        let report = ReconciliationReport {
            unmatched_transactions,
            discrepancies,
            summary,
        };
        self.persist(&report)?;

        log::info!(
            "reconciliation finished: matched={} unmatched={} processed={}",
            report.summary.total_matched,
            report.summary.total_unmatched,
            report.summary.total_processed
        );
        Ok(report)
    }

    fn persist(&mut self, report: &ReconciliationReport) -> Result<(), ReconError> {
        self.sink
            .write_summary(&report.summary)
            .map_err(|source| ReconError::Persist {
                section: SUMMARY_SECTION.to_string(),
                source,
            })?;

        self.sink
            .write_unmatched_transactions(&report.unmatched_transactions)
            .map_err(|source| ReconError::Persist {
                section: TRANSACTION_SECTION.to_string(),
                source,
            })?;

        for (bank, group) in &report.discrepancies {
            self.sink
                .write_discrepancies(bank, group)
                .map_err(|source| ReconError::Persist {
                    section: bank.to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}

fn check_transaction_total(
    source_ref: &str,
    transactions: &[Transaction],
) -> Result<(), ReconError> {
    let mut total = Decimal::ZERO;
    for tx in transactions {
        let current = total;
        total = current
            .checked_add(tx.amount())
            .ok_or_else(|| ReconError::AmountOverflow {
                source_ref: source_ref.to_string(),
                source: AmountOverflow {
                    id: tx.id().to_string(),
                    amount: tx.amount(),
                    total: current,
                },
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DateWindow;
    use crate::core::statement::BankStatement;
    use crate::core::transaction::TransactionKind;
    use crate::storage::memory::{MemorySink, MemorySource};
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn config() -> ReconConfig {
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 30).unwrap(),
        )
        .unwrap();
        ReconConfig::new("tx", vec!["bca".to_string(), "bri".to_string()], window).unwrap()
    }

    fn tx(id: &str, amount: Decimal) -> Transaction {
        Transaction::new(
            id,
            amount,
            TransactionKind::Debit,
            Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
        )
    }

    fn statement(id: &str, amount: Decimal) -> BankStatement {
        BankStatement::new(
            BankName::new("?"),
            id,
            amount,
            Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
        )
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .with_transactions("tx", vec![tx("1", dec!(100)), tx("2", dec!(250))])
            .with_statements(
                "bca",
                BankName::new("BCA"),
                vec![statement("a", dec!(100)), statement("b", dec!(300))],
            )
            .with_statements("bri", BankName::new("BRI"), vec![statement("c", dec!(400))])
    }

    #[test]
    fn test_execute_writes_sections_in_order() {
        let mut executor = ReconExecutor::new(source(), source(), MemorySink::new());
        let report = executor.execute(&config()).unwrap();

        assert_eq!(report.summary.total_matched, 1);
        assert_eq!(report.summary.total_unmatched, 3);
        assert_eq!(report.summary.total_processed, 4);
        assert_eq!(
            executor.sink().writes(),
            &["summary", "transaction", "BCA", "BRI"]
        );
        let tx_section = executor.sink().section("transaction").unwrap();
        assert_eq!(tx_section.rows.len(), 1);
        assert_eq!(tx_section.rows[0][0], "2");
    }

    #[test]
    fn test_missing_statement_feed_aborts_before_writing() {
        let mut cfg = config();
        cfg.statement_sources.push("mandiri".to_string());
        let mut executor = ReconExecutor::new(source(), source(), MemorySink::new());

        let err = executor.execute(&cfg).unwrap_err();

        match err {
            ReconError::LoadStatements { ref source_ref, .. } => assert_eq!(source_ref, "mandiri"),
            ref other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("mandiri"));
        assert!(executor.sink().writes().is_empty());
    }

    #[test]
    fn test_empty_transactions_abort() {
        let empty = MemorySource::new().with_transactions("tx", Vec::new());
        let mut executor = ReconExecutor::new(empty, source(), MemorySink::new());

        let err = executor.execute(&config()).unwrap_err();

        assert!(matches!(
            err,
            ReconError::LoadTransactions {
                source: StorageError::EmptyDataset { .. },
                ..
            }
        ));
        assert!(executor.sink().sections().is_empty());
    }

    #[test]
    fn test_failed_write_stops_later_writes() {
        let mut executor = ReconExecutor::new(source(), source(), MemorySink::failing_on("BCA"));

        let err = executor.execute(&config()).unwrap_err();

        assert!(matches!(err, ReconError::Persist { ref section, .. } if section == "BCA"));
        assert_eq!(executor.sink().writes(), &["summary", "transaction"]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = config();
        cfg.statement_sources.clear();
        let mut executor = ReconExecutor::new(source(), source(), MemorySink::new());
        assert!(matches!(
            executor.execute(&cfg),
            Err(ReconError::Config(ConfigError::NoStatementSources))
        ));
    }

    #[test]
    fn test_bank_named_like_a_fixed_section_is_rejected() {
        let feeds = source().with_statements(
            "summary.csv",
            BankName::new("summary"),
            vec![statement("S1", dec!(300))],
        );
        let mut cfg = config();
        cfg.statement_sources.push("summary.csv".to_string());
        let mut executor = ReconExecutor::new(source(), feeds, MemorySink::new());

        let err = executor.execute(&cfg).unwrap_err();

        assert!(matches!(
            err,
            ReconError::ReservedBankName { ref bank, .. } if bank.as_str() == "summary"
        ));
        assert!(executor.sink().writes().is_empty());
    }

    #[test]
    fn test_statement_total_overflow_across_feeds() {
        let feeds = MemorySource::new()
            .with_statements("bca", BankName::new("BCA"), vec![statement("a", Decimal::MAX)])
            .with_statements("bri", BankName::new("BRI"), vec![statement("b", Decimal::MAX)]);
        let mut executor = ReconExecutor::new(source(), feeds, MemorySink::new());

        let err = executor.execute(&config()).unwrap_err();

        match err {
            ReconError::AmountOverflow {
                ref source_ref,
                ref source,
            } => {
                assert_eq!(source_ref, "bri");
                assert_eq!(source.id, "b");
            }
            ref other => panic!("unexpected error: {other:?}"),
        }
        assert!(executor.sink().writes().is_empty());
    }

    #[test]
    fn test_transaction_total_overflow() {
        let txs = MemorySource::new()
            .with_transactions("tx", vec![tx("1", Decimal::MAX), tx("2", dec!(1))]);
        let mut executor = ReconExecutor::new(txs, source(), MemorySink::new());

        let err = executor.execute(&config()).unwrap_err();

        assert!(matches!(
            err,
            ReconError::AmountOverflow { ref source, .. } if source.id == "2"
        ));
        assert!(executor.sink().writes().is_empty());
    }
}

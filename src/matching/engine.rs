use crate::core::statement::BankStatement;
use crate::core::summary::Summary;
use crate::core::transaction::Transaction;
use crate::matching::bucket::AmountBucketStore;
use crate::matching::discrepancy::{Discrepancies, DiscrepancyAggregator};
use serde::{Deserialize, Serialize};

/// Complete output of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Transactions with no statement of the same amount, in input order.
    pub unmatched_transactions: Vec<Transaction>,
    /// Statements no transaction consumed, grouped by bank.
    pub discrepancies: Discrepancies,
    pub summary: Summary,
}

impl ReconciliationReport {
    /// True when every transaction and every statement found a partner.
    pub fn is_clean(&self) -> bool {
        self.unmatched_transactions.is_empty() && self.discrepancies.is_empty()
    }
}

/// The reconciliation engine.
///
/// Matches transactions to bank statements by exact amount. Pairing is
/// FIFO on both sides: the earliest-loaded statement of an amount satisfies
/// the earliest transaction of that amount, so identical input always
/// yields identical partitions.
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    /// Consume matching statements from `buckets` for each transaction.
    ///
    /// Returns the unmatched transactions in input order and a summary
    /// covering the transaction side plus the statement total. Leftover
    /// statements are not counted here; see [`DiscrepancyAggregator`].
    ///
    /// # Algorithm
    ///
    /// 1. `total_processed` starts at the transaction count.
    /// 2. `total_amount_bank_statements` is the store's running insert total.
    /// 3. Every transaction adds to `total_amount_transactions`, saturating
    ///    at `Decimal`'s bounds. Loaded feeds never reach them.
    /// 4. A transaction that pops a statement is matched and dropped;
    ///    otherwise it is unmatched and kept.
    pub fn reconcile(
        transactions: Vec<Transaction>,
        buckets: &mut AmountBucketStore,
    ) -> (Vec<Transaction>, Summary) {
        let mut summary = Summary {
            total_processed: transactions.len(),
            total_amount_bank_statements: buckets.total_amount(),
            ..Summary::default()
        };

        let unmatched: Vec<Transaction> = transactions
            .into_iter()
            .filter(|tx| {
                summary.total_amount_transactions =
                    summary.total_amount_transactions.saturating_add(tx.amount());
                match buckets.try_consume_head(tx.amount()) {
                    Some(statement) => {
                        log::trace!(
                            "transaction {} matched {} statement {} at {}",
                            tx.id(),
                            statement.bank(),
                            statement.id(),
                            tx.amount()
                        );
                        summary.total_matched += 1;
                        false
                    }
                    None => {
                        summary.total_unmatched += 1;
                        true
                    }
                }
            })
            .collect();

        log::debug!(
            "reconciled {} transaction(s): {} matched, {} unmatched",
            summary.total_processed,
            summary.total_matched,
            summary.total_unmatched
        );

        (unmatched, summary)
    }

    /// Run a full reconciliation over in-memory data.
    ///
    /// Statement batches are inserted in the order given, each batch in its
    /// own order, which fixes the FIFO pairing.
    pub fn run<I, B>(transactions: Vec<Transaction>, statement_batches: I) -> ReconciliationReport
    where
        I: IntoIterator<Item = B>,
        B: IntoIterator<Item = BankStatement>,
    {
        let mut buckets = AmountBucketStore::new();
        for batch in statement_batches {
            buckets.extend(batch);
        }

        let (unmatched_transactions, mut summary) = Self::reconcile(transactions, &mut buckets);
        let discrepancies = DiscrepancyAggregator::aggregate(&mut buckets, &mut summary);

        log::info!(
            "reconciliation finished: matched={} unmatched={} processed={}",
            summary.total_matched,
            summary.total_unmatched,
            summary.total_processed
        );

        ReconciliationReport {
            unmatched_transactions,
            discrepancies,
            summary,
        }
    }
}

impl std::fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.summary)?;

        writeln!(f, "\n--- Unmatched transactions ({}) ---", self.unmatched_transactions.len())?;
        for tx in &self.unmatched_transactions {
            writeln!(
                f,
                "  {:<12} {:>15} {:<6} {}",
                tx.id(),
                tx.amount(),
                tx.kind(),
                tx.timestamp().to_rfc3339()
            )?;
        }

        writeln!(
            f,
            "\n--- Leftover statements ({}, total {}) ---",
            self.discrepancies.total_statements(),
            self.discrepancies.total_amount()
        )?;
        for (bank, group) in &self.discrepancies {
            writeln!(
                f,
                "\n--- {} ({} unmatched, multiple={}) ---",
                bank,
                group.statements.len(),
                group.appears_multiple_times
            )?;
            for statement in &group.statements {
                writeln!(
                    f,
                    "  {:<12} {:>15} {}",
                    statement.id(),
                    statement.amount(),
                    statement.timestamp().to_rfc3339()
                )?;
            }
        }
        Ok(())
    }
}

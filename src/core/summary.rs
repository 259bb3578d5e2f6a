use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate counters and sums for one reconciliation run.
///
/// Built incrementally: the engine fills in the transaction side and the
/// statement total, then the discrepancy aggregator adds leftover statements
/// to `total_processed` and `total_unmatched`. Both sides share these
/// counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Sum of every loaded transaction amount, matched or not.
    pub total_amount_transactions: Decimal,
    /// Sum of every loaded statement amount across all feeds.
    pub total_amount_bank_statements: Decimal,
    pub total_matched: usize,
    /// Unmatched transactions plus leftover statements.
    pub total_unmatched: usize,
    /// Loaded transactions plus leftover statements.
    pub total_processed: usize,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transaction total minus statement total. Computed, never stored.
    /// Saturates at `Decimal`'s bounds.
    pub fn discrepancy_amount(&self) -> Decimal {
        self.total_amount_transactions
            .saturating_sub(self.total_amount_bank_statements)
    }

    /// Key/value rows in report order, as written to the summary section.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "Total Amount Transactions",
                self.total_amount_transactions.to_string(),
            ),
            (
                "Total Amount Bank Statements",
                self.total_amount_bank_statements.to_string(),
            ),
            ("Total Matched", self.total_matched.to_string()),
            ("Total Unmatched", self.total_unmatched.to_string()),
            ("Total Processed", self.total_processed.to_string()),
            (
                "Total Amount Discrepancy",
                self.discrepancy_amount().to_string(),
            ),
        ]
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Reconciliation Summary ===")?;
        for (label, value) in self.rows() {
            writeln!(f, "{:<30}{}", format!("{}:", label), value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_discrepancy_amount() {
        let summary = Summary {
            total_amount_transactions: dec!(550),
            total_amount_bank_statements: dec!(1000),
            ..Summary::default()
        };
        assert_eq!(summary.discrepancy_amount(), dec!(-450));
    }

    #[test]
    fn test_discrepancy_amount_saturates() {
        let summary = Summary {
            total_amount_transactions: Decimal::MAX,
            total_amount_bank_statements: -Decimal::MAX,
            ..Summary::default()
        };
        assert_eq!(summary.discrepancy_amount(), Decimal::MAX);
    }

    #[test]
    fn test_rows_order_and_values() {
        let summary = Summary {
            total_amount_transactions: dec!(550),
            total_amount_bank_statements: dec!(1000),
            total_matched: 2,
            total_unmatched: 3,
            total_processed: 5,
        };
        let rows = summary.rows();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], ("Total Amount Transactions", "550".to_string()));
        assert_eq!(rows[2], ("Total Matched", "2".to_string()));
        assert_eq!(rows[5], ("Total Amount Discrepancy", "-450".to_string()));
    }

    #[test]
    fn test_display_contains_every_row() {
        let text = Summary::new().to_string();
        for (label, _) in Summary::new().rows() {
            assert!(text.contains(label), "missing {}", label);
        }
    }
}

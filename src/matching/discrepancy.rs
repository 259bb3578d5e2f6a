use crate::core::statement::{BankName, BankStatement};
use crate::core::summary::Summary;
use crate::matching::bucket::AmountBucketStore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Leftover statements for one bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyGroup {
    pub statements: Vec<BankStatement>,
    /// Copied from the amount bucket the statements were drained from.
    pub appears_multiple_times: bool,
}

/// Unmatched statements grouped by bank, ordered by bank name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Discrepancies(BTreeMap<BankName, DiscrepancyGroup>);

impl Discrepancies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bank: &BankName) -> Option<&DiscrepancyGroup> {
        self.0.get(bank)
    }

    pub fn banks(&self) -> impl Iterator<Item = &BankName> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BankName, &DiscrepancyGroup)> {
        self.0.iter()
    }

    /// Number of banks with at least one leftover statement.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Leftover statements across every bank.
    pub fn total_statements(&self) -> usize {
        self.0.values().map(|g| g.statements.len()).sum()
    }

    /// Sum of leftover statement amounts, saturating at `Decimal`'s bounds.
    pub fn total_amount(&self) -> Decimal {
        self.0
            .values()
            .flat_map(|g| g.statements.iter())
            .fold(Decimal::ZERO, |total, s| total.saturating_add(s.amount()))
    }
}

impl<'a> IntoIterator for &'a Discrepancies {
    type Item = (&'a BankName, &'a DiscrepancyGroup);
    type IntoIter = std::collections::btree_map::Iter<'a, BankName, DiscrepancyGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Regroups statements left over after matching by originating bank.
pub struct DiscrepancyAggregator;

impl DiscrepancyAggregator {
    /// Drain the store into per-bank discrepancy groups.
    ///
    /// Must run after every transaction has been reconciled. Each drained
    /// statement counts as one more processed and one more unmatched unit
    /// in `summary`.
    ///
    /// A bank's `appears_multiple_times` takes the flag of the last bucket
    /// that contributed to it. Buckets are visited in ascending amount order,
    /// so the outcome is deterministic.
    pub fn aggregate(buckets: &mut AmountBucketStore, summary: &mut Summary) -> Discrepancies {
        let mut by_bank: BTreeMap<BankName, DiscrepancyGroup> = BTreeMap::new();

        for (amount, group) in buckets.drain_non_empty_groups() {
            let flag = group.appears_multiple_times();
            log::trace!(
                "amount {} leaves {} unmatched statement(s), multiple={}",
                amount,
                group.len(),
                flag
            );
            for statement in group.into_entries() {
                let slot = by_bank.entry(statement.bank().clone()).or_default();
                slot.statements.push(statement);
                slot.appears_multiple_times = flag;
                summary.total_processed += 1;
                summary.total_unmatched += 1;
            }
        }

        Discrepancies(by_bank)
    }
}

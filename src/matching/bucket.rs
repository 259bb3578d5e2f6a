use crate::core::statement::BankStatement;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

/// A record whose amount would push a running total out of `Decimal` range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("amount {amount} of record '{id}' overflows the running total {total}")]
pub struct AmountOverflow {
    pub id: String,
    pub amount: Decimal,
    pub total: Decimal,
}

/// FIFO of bank statements sharing one amount.
///
/// `appears_multiple_times` is sticky: it becomes true on the second
/// insertion and is never cleared, even after matching drains the entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmountGroup {
    /// Unconsumed statements, oldest first.
    entries: VecDeque<BankStatement>,
    /// Set once a second statement arrives; never cleared.
    appears_multiple_times: bool,
    /// Statements ever pushed, consumed ones included.
    inserted: usize,
}

impl AmountGroup {
    /// An empty, unflagged group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail, flagging the group if it already saw an entry.
    pub fn push(&mut self, statement: BankStatement) {
        if self.inserted > 0 {
            self.appears_multiple_times = true;
        }
        self.inserted += 1;
        self.entries.push_back(statement);
    }

    /// Remove the oldest entry.
    pub fn pop_front(&mut self) -> Option<BankStatement> {
        self.entries.pop_front()
    }

    /// Unconsumed statements, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &BankStatement> {
        self.entries.iter()
    }

    /// Take the unconsumed statements, oldest first.
    pub fn into_entries(self) -> VecDeque<BankStatement> {
        self.entries
    }

    pub fn appears_multiple_times(&self) -> bool {
        self.appears_multiple_times
    }

    /// Statements still waiting to be matched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bank statements bucketed by amount for one reconciliation run.
///
/// Amount is the only join key: statements from different banks with the
/// same amount share a bucket, and a transaction of that amount can be
/// satisfied by whichever of them arrived first. Keys compare numerically,
/// so `100` and `100.00` land in the same bucket.
///
/// # Examples
///
/// ```
/// use bank_recon::core::statement::{BankName, BankStatement};
/// use bank_recon::matching::bucket::AmountBucketStore;
/// use chrono::Utc;
/// use rust_decimal_macros::dec;
///
/// let now = Utc::now();
/// let mut store = AmountBucketStore::new();
/// store.insert(BankStatement::new(BankName::new("BCA"), "1", dec!(100), now));
/// store.insert(BankStatement::new(BankName::new("BRI"), "2", dec!(100.00), now));
///
/// let first = store.try_consume_head(dec!(100)).unwrap();
/// assert_eq!(first.bank().as_str(), "BCA");
/// assert!(store.group(dec!(100)).unwrap().appears_multiple_times());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AmountBucketStore {
    groups: BTreeMap<Decimal, AmountGroup>,
    total_amount: Decimal,
    inserted: usize,
}

impl AmountBucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement to the bucket for its amount, creating it if needed.
    ///
    /// The running total saturates at `Decimal`'s bounds; use
    /// [`try_insert`](Self::try_insert) to reject such a statement instead.
    pub fn insert(&mut self, statement: BankStatement) {
        let amount = statement.amount();
        self.total_amount = self.total_amount.saturating_add(amount);
        self.inserted += 1;
        self.groups.entry(amount).or_default().push(statement);
    }

    /// Like [`insert`](Self::insert), but leaves the store untouched and
    /// returns an error if the running total would overflow.
    pub fn try_insert(&mut self, statement: BankStatement) -> Result<(), AmountOverflow> {
        if self.total_amount.checked_add(statement.amount()).is_none() {
            return Err(AmountOverflow {
                id: statement.id().to_string(),
                amount: statement.amount(),
                total: self.total_amount,
            });
        }
        self.insert(statement);
        Ok(())
    }

    /// Pop the oldest statement with exactly this amount, if any remain.
    pub fn try_consume_head(&mut self, amount: Decimal) -> Option<BankStatement> {
        self.groups.get_mut(&amount).and_then(AmountGroup::pop_front)
    }

    /// Remove and return every bucket still holding entries, ascending by amount.
    ///
    /// Empty buckets are dropped as well, so the store is empty afterwards.
    pub fn drain_non_empty_groups(&mut self) -> Vec<(Decimal, AmountGroup)> {
        std::mem::take(&mut self.groups)
            .into_iter()
            .filter(|(_, group)| !group.is_empty())
            .collect()
    }

    pub fn group(&self, amount: Decimal) -> Option<&AmountGroup> {
        self.groups.get(&amount)
    }

    /// Number of buckets, including ones emptied by matching.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Statements not yet consumed.
    pub fn pending(&self) -> usize {
        self.groups.values().map(AmountGroup::len).sum()
    }

    /// Running sum of every inserted amount. Unaffected by consumption.
    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// Count of every inserted statement. Unaffected by consumption.
    pub fn inserted(&self) -> usize {
        self.inserted
    }
}

impl Extend<BankStatement> for AmountBucketStore {
    fn extend<T: IntoIterator<Item = BankStatement>>(&mut self, iter: T) {
        for statement in iter {
            self.insert(statement);
        }
    }
}

impl FromIterator<BankStatement> for AmountBucketStore {
    fn from_iter<T: IntoIterator<Item = BankStatement>>(iter: T) -> Self {
        let mut store = Self::new();
        store.extend(iter);
        store
    }
}

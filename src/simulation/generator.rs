//! Random reconciliation datasets.
//!
//! Generates a transaction ledger plus per-bank statement feeds with a
//! controllable share of matches, repeated amounts, and unexplained
//! statement lines. Used by the benchmarks, the property tests, and the
//! `generate` CLI command.

use crate::config::{ConfigError, DateWindow};
use crate::core::statement::{BankName, BankStatement};
use crate::core::transaction::{Transaction, TransactionKind};
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::io;
use std::path::{Path, PathBuf};

/// Configuration for generating a random dataset.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    /// Number of ledger transactions.
    pub transaction_count: usize,
    /// Banks to spread statements across.
    pub banks: Vec<BankName>,
    /// Probability that a transaction gets a statement of the same amount.
    pub match_ratio: f64,
    /// Probability that a transaction reuses an earlier transaction's amount.
    pub duplicate_ratio: f64,
    /// Extra statements with no corresponding transaction.
    pub noise_statements: usize,
    /// First day of the window.
    pub start: NaiveDate,
    /// Length of the window in days.
    pub days: u32,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    /// Fixed seed for reproducible output.
    pub seed: Option<u64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            transaction_count: 100,
            banks: vec![BankName::new("BCA"), BankName::new("BRI")],
            match_ratio: 0.8,
            duplicate_ratio: 0.1,
            noise_statements: 10,
            start: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap_or_default(),
            days: 30,
            min_amount: Decimal::from(1),
            max_amount: Decimal::from(10_000),
            seed: None,
        }
    }
}

/// A generated ledger and its statement feeds.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub transactions: Vec<Transaction>,
    /// One feed per bank, in the configured bank order.
    pub feeds: Vec<(BankName, Vec<BankStatement>)>,
    pub start: NaiveDate,
    pub days: u32,
}

impl Dataset {
    pub fn statement_count(&self) -> usize {
        self.feeds.iter().map(|(_, feed)| feed.len()).sum()
    }

    /// The window every generated record falls into.
    pub fn window(&self) -> Result<DateWindow, ConfigError> {
        let end = self.start + Duration::days(i64::from(self.days.max(1)) - 1);
        DateWindow::new(self.start, end)
    }

    /// Statement feeds in load order, ready for [`crate::matching::engine::ReconciliationEngine::run`].
    pub fn statement_batches(&self) -> Vec<Vec<BankStatement>> {
        self.feeds.iter().map(|(_, feed)| feed.clone()).collect()
    }

    /// Write `transactions.csv` and one `<bank>.csv` per feed into `dir`,
    /// in the format the CSV sources read. Returns the transaction path and
    /// the statement paths in feed order.
    pub fn write_csv(&self, dir: &Path) -> io::Result<(PathBuf, Vec<PathBuf>)> {
        std::fs::create_dir_all(dir)?;

        let tx_path = dir.join("transactions.csv");
        let mut writer = csv::Writer::from_path(&tx_path)?;
        writer.write_record(["id", "amount", "type", "time"])?;
        for tx in &self.transactions {
            writer.write_record([
                tx.id().to_string(),
                tx.amount().to_string(),
                tx.kind().to_string(),
                tx.timestamp().to_rfc3339(),
            ])?;
        }
        writer.flush()?;

        let mut statement_paths = Vec::with_capacity(self.feeds.len());
        for (bank, feed) in &self.feeds {
            let path = dir.join(format!("{}.csv", bank));
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(["id", "amount", "time"])?;
            for statement in feed {
                writer.write_record([
                    statement.id().to_string(),
                    statement.amount().to_string(),
                    statement.timestamp().to_rfc3339(),
                ])?;
            }
            writer.flush()?;
            statement_paths.push(path);
        }

        Ok((tx_path, statement_paths))
    }
}

fn random_amount(rng: &mut StdRng, min_cents: i64, max_cents: i64) -> Decimal {
    Decimal::new(rng.gen_range(min_cents..=max_cents), 2)
}

/// Whole cents in `amount`, saturating at the `i64` bounds.
fn to_cents(amount: Decimal) -> i64 {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.trunc().to_i64())
        .unwrap_or(if amount.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
}

/// A probability in `[0, 1]`; NaN and infinities count as zero.
fn probability(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Generate a random dataset.
pub fn generate_dataset(config: &DatasetConfig) -> Dataset {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let banks = if config.banks.is_empty() {
        vec![BankName::new("BANK")]
    } else {
        config.banks.clone()
    };
    let min_cents = to_cents(config.min_amount).max(1);
    let max_cents = to_cents(config.max_amount).max(min_cents);
    let match_ratio = probability(config.match_ratio);
    let duplicate_ratio = probability(config.duplicate_ratio);
    let window_secs = i64::from(config.days.max(1)) * 86_400;
    let origin = Utc.from_utc_datetime(&config.start.and_time(NaiveTime::MIN));

    let mut transactions: Vec<Transaction> = Vec::with_capacity(config.transaction_count);
    let mut feeds: Vec<Vec<BankStatement>> = vec![Vec::new(); banks.len()];

    for i in 0..config.transaction_count {
        let amount = if !transactions.is_empty() && rng.gen_bool(duplicate_ratio) {
            transactions[rng.gen_range(0..transactions.len())].amount()
        } else {
            random_amount(&mut rng, min_cents, max_cents)
        };
        let kind = if rng.gen_bool(0.5) {
            TransactionKind::Debit
        } else {
            TransactionKind::Credit
        };
        let timestamp = origin + Duration::seconds(rng.gen_range(0..window_secs));
        transactions.push(Transaction::new(format!("TX-{:06}", i), amount, kind, timestamp));

        if rng.gen_bool(match_ratio) {
            let bank_idx = rng.gen_range(0..banks.len());
            let settled = origin + Duration::seconds(rng.gen_range(0..window_secs));
            let id = format!("{}-{:06}", banks[bank_idx], feeds[bank_idx].len());
            feeds[bank_idx].push(BankStatement::new(
                banks[bank_idx].clone(),
                id,
                amount,
                settled,
            ));
        }
    }

    for _ in 0..config.noise_statements {
        let bank_idx = rng.gen_range(0..banks.len());
        let timestamp = origin + Duration::seconds(rng.gen_range(0..window_secs));
        let id = format!("{}-{:06}", banks[bank_idx], feeds[bank_idx].len());
        feeds[bank_idx].push(BankStatement::new(
            banks[bank_idx].clone(),
            id,
            random_amount(&mut rng, min_cents, max_cents),
            timestamp,
        ));
    }

    Dataset {
        transactions,
        feeds: banks.into_iter().zip(feeds).collect(),
        start: config.start,
        days: config.days.max(1),
    }
}

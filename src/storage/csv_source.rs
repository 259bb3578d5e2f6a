//! CSV feeds for transactions and bank statements.
//!
//! Both formats start with a header row that is skipped.
//!
//! Transactions: `id,amount,type,time` where `type` is `debit` or `credit`.
//!
//! Statements: `id,amount,time`. The bank name is the file stem, so
//! `feeds/bca.csv` yields statements stamped `bca`.
//!
//! `time` is RFC 3339; `YYYY-MM-DD HH:MM:SS` is also accepted and read as UTC.

use crate::config::DateWindow;
use crate::core::statement::{BankName, BankStatement};
use crate::core::transaction::{Transaction, TransactionKind};
use crate::storage::{StatementSource, StorageError, TransactionSource};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse an RFC 3339 timestamp, falling back to `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT)
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
}

/// Bank name for a statement file: its stem.
pub fn bank_name_for(path: &str) -> BankName {
    let stem = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    BankName::new(stem)
}

/// A data row with the line it came from.
struct Row {
    line: u64,
    fields: csv::StringRecord,
}

impl Row {
    fn field(&self, index: usize) -> &str {
        self.fields.get(index).unwrap_or_default()
    }
}

/// Read every data row of a CSV file. Fails on an unreadable file or one
/// with no rows after the header.
fn read_rows(source_ref: &str) -> Result<Vec<Row>, StorageError> {
    let file = File::open(source_ref).map_err(|e| StorageError::SourceUnavailable {
        source_ref: source_ref.to_string(),
        source: e,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for result in reader.records() {
        let fields = result.map_err(|e| StorageError::MalformedRecord {
            source_ref: source_ref.to_string(),
            line: e.position().map(|p| p.line()).unwrap_or(0),
            reason: e.to_string(),
        })?;
        let line = fields.position().map(|p| p.line()).unwrap_or(0);
        rows.push(Row { line, fields });
    }

    if rows.is_empty() {
        return Err(StorageError::EmptyDataset {
            source_ref: source_ref.to_string(),
        });
    }
    Ok(rows)
}

fn malformed(source_ref: &str, row: &Row, reason: String) -> StorageError {
    StorageError::MalformedRecord {
        source_ref: source_ref.to_string(),
        line: row.line,
        reason,
    }
}

fn require_columns(source_ref: &str, row: &Row, expected: usize) -> Result<(), StorageError> {
    if row.fields.len() < expected {
        return Err(malformed(
            source_ref,
            row,
            format!("expected {} columns, found {}", expected, row.fields.len()),
        ));
    }
    Ok(())
}

fn parse_amount(source_ref: &str, row: &Row, index: usize) -> Result<Decimal, StorageError> {
    let raw = row.field(index);
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| malformed(source_ref, row, format!("invalid amount '{}'", raw)))
}

fn parse_time(source_ref: &str, row: &Row, index: usize) -> Result<DateTime<Utc>, StorageError> {
    let raw = row.field(index);
    parse_timestamp(raw)
        .ok_or_else(|| malformed(source_ref, row, format!("invalid time format '{}'", raw)))
}

/// Add `amount` to a feed's running total, rejecting the row that would
/// take it out of `Decimal` range.
fn accumulate(
    total: &mut Decimal,
    source_ref: &str,
    row: &Row,
    amount: Decimal,
) -> Result<(), StorageError> {
    let current = *total;
    *total = current.checked_add(amount).ok_or_else(|| {
        malformed(
            source_ref,
            row,
            format!("amount {} overflows the running total of {}", amount, current),
        )
    })?;
    Ok(())
}

/// Transaction ledger stored as CSV.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvTransactionSource;

impl TransactionSource for CsvTransactionSource {
    fn read_transactions(
        &self,
        source_ref: &str,
        window: &DateWindow,
    ) -> Result<Vec<Transaction>, StorageError> {
        let rows = read_rows(source_ref)?;
        let total = rows.len();
        let mut transactions = Vec::with_capacity(total);
        let mut running = Decimal::ZERO;

        for row in &rows {
            require_columns(source_ref, row, 4)?;
            let amount = parse_amount(source_ref, row, 1)?;
            let kind = TransactionKind::from_str(row.field(2))
                .map_err(|e| malformed(source_ref, row, e.to_string()))?;
            let timestamp = parse_time(source_ref, row, 3)?;

            if !window.contains(timestamp) {
                log::debug!(
                    "{}:{} transaction {} at {} is outside {}",
                    source_ref,
                    row.line,
                    row.field(0),
                    timestamp,
                    window
                );
                continue;
            }
            accumulate(&mut running, source_ref, row, amount)?;
            transactions.push(Transaction::new(row.field(0), amount, kind, timestamp));
        }

        log::info!(
            "loaded {} of {} transaction(s) from {}",
            transactions.len(),
            total,
            source_ref
        );
        if transactions.is_empty() {
            log::warn!("no transactions in {} fall inside {}", source_ref, window);
        }
        Ok(transactions)
    }
}

/// Bank-statement feed stored as CSV, one file per bank.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvStatementSource;

impl StatementSource for CsvStatementSource {
    fn read_statements(
        &self,
        source_ref: &str,
        window: &DateWindow,
    ) -> Result<(BankName, Vec<BankStatement>), StorageError> {
        let rows = read_rows(source_ref)?;
        let bank = bank_name_for(source_ref);
        let total = rows.len();
        let mut statements = Vec::with_capacity(total);
        let mut running = Decimal::ZERO;

        for row in &rows {
            require_columns(source_ref, row, 3)?;
            let amount = parse_amount(source_ref, row, 1)?;
            let timestamp = parse_time(source_ref, row, 2)?;

            if !window.contains(timestamp) {
                log::debug!(
                    "{}:{} statement {} at {} is outside {}",
                    source_ref,
                    row.line,
                    row.field(0),
                    timestamp,
                    window
                );
                continue;
            }
            accumulate(&mut running, source_ref, row, amount)?;
            statements.push(BankStatement::new(
                bank.clone(),
                row.field(0),
                amount,
                timestamp,
            ));
        }

        log::info!(
            "loaded {} of {} statement(s) for bank {} from {}",
            statements.len(),
            total,
            bank,
            source_ref
        );
        Ok((bank, statements))
    }
}

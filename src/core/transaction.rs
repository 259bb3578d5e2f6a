use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Direction of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Debit,
    Credit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Debit => "debit",
            TransactionKind::Credit => "credit",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a transaction kind string is neither `debit` nor `credit`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transaction kind '{0}', expected 'debit' or 'credit'")]
pub struct ParseKindError(pub String);

impl FromStr for TransactionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("debit") {
            Ok(TransactionKind::Debit)
        } else if s.eq_ignore_ascii_case("credit") {
            Ok(TransactionKind::Credit)
        } else {
            Err(ParseKindError(s.to_string()))
        }
    }
}

/// A single entry in the internal transaction ledger.
///
/// Transactions are immutable once read. The reconciliation engine matches
/// them against bank statements purely by `amount`; `kind` is carried
/// through to the report but plays no part in matching.
///
/// # Examples
///
/// ```
/// use bank_recon::core::transaction::{Transaction, TransactionKind};
/// use chrono::{TimeZone, Utc};
/// use rust_decimal_macros::dec;
///
/// let tx = Transaction::new(
///     "TX-1",
///     dec!(100),
///     TransactionKind::Credit,
///     Utc.with_ymd_and_hms(2025, 8, 1, 9, 30, 0).unwrap(),
/// );
///
/// assert_eq!(tx.amount(), dec!(100));
/// assert_eq!(tx.kind(), TransactionKind::Credit);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Ledger identifier, unique within one transaction feed.
    id: String,
    /// Signed amount; matched against statements by exact value.
    amount: Decimal,
    /// Debit or credit. Carried through to the report, not used for matching.
    kind: TransactionKind,
    /// When the transaction was booked, in UTC.
    timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        amount: Decimal,
        kind: TransactionKind,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            kind,
            timestamp,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kind_parse_is_case_insensitive() {
        assert_eq!("debit".parse::<TransactionKind>(), Ok(TransactionKind::Debit));
        assert_eq!("CREDIT".parse::<TransactionKind>(), Ok(TransactionKind::Credit));
        assert_eq!("Credit".parse::<TransactionKind>(), Ok(TransactionKind::Credit));
    }

    #[test]
    fn test_kind_parse_rejects_unknown() {
        let err = "refund".parse::<TransactionKind>().unwrap_err();
        assert_eq!(err, ParseKindError("refund".to_string()));
        assert!(err.to_string().contains("refund"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TransactionKind::Debit.to_string(), "debit");
        assert_eq!(format!("{}", TransactionKind::Credit), "credit");
    }

    #[test]
    fn test_transaction_accessors() {
        let ts = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();
        let tx = Transaction::new("1", dec!(250.50), TransactionKind::Debit, ts);
        assert_eq!(tx.id(), "1");
        assert_eq!(tx.amount(), dec!(250.50));
        assert_eq!(tx.kind(), TransactionKind::Debit);
        assert_eq!(tx.timestamp(), ts);
    }

    #[test]
    fn test_transaction_serializes_kind_lowercase() {
        let ts = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();
        let tx = Transaction::new("1", dec!(10), TransactionKind::Credit, ts);
        let json: serde_json::Value = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["kind"], "credit");
        assert_eq!(json["amount"], "10");
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the bank a statement feed belongs to.
///
/// Derived from the feed identity by the statement source (for CSV feeds,
/// the file stem: `feeds/bca.csv` becomes `bca`).
///
/// # Examples
///
/// ```
/// use bank_recon::core::statement::BankName;
///
/// let bca = BankName::new("BCA");
/// let bri = BankName::new("BRI");
/// assert_ne!(bca, bri);
/// assert!(bca < bri);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankName(String);

impl BankName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BankName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BankName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One line of a bank-statement feed.
///
/// Statements are immutable once read. `bank` is stamped onto every record
/// by the source that produced it, before the record reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankStatement {
    /// Bank whose feed this line came from.
    bank: BankName,
    /// Statement line identifier, as issued by the bank.
    id: String,
    /// Amount; the only key used for matching.
    amount: Decimal,
    /// When the bank settled the line, in UTC.
    timestamp: DateTime<Utc>,
}

impl BankStatement {
    pub fn new(
        bank: BankName,
        id: impl Into<String>,
        amount: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            bank,
            id: id.into(),
            amount,
            timestamp,
        }
    }

    pub fn bank(&self) -> &BankName {
        &self.bank
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

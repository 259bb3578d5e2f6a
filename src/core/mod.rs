//! Record model: transactions, bank statements, and the run summary.

pub mod statement;
pub mod summary;
pub mod transaction;

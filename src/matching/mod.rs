//! Amount-bucketed matching of transactions against bank statements.

pub mod bucket;
pub mod discrepancy;
pub mod engine;

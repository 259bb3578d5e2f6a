//! Basic reconciliation example.
//!
//! Matches a small ledger against two bank feeds and prints what is left
//! over on each side.

use bank_recon::core::statement::{BankName, BankStatement};
use bank_recon::core::transaction::{Transaction, TransactionKind};
use bank_recon::matching::engine::ReconciliationEngine;
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

fn main() {
    println!("╔════════════════════════════════════════════╗");
    println!("║  bank-recon: Basic Reconciliation Example  ║");
    println!("╚════════════════════════════════════════════╝\n");

    let day = |d: u32| Utc.with_ymd_and_hms(2025, 8, d, 9, 0, 0).unwrap();
    let bca = BankName::new("BCA");
    let bri = BankName::new("BRI");

    let transactions = vec![
        Transaction::new("TX-1", dec!(100), TransactionKind::Credit, day(1)),
        Transaction::new("TX-2", dec!(200), TransactionKind::Debit, day(2)),
        Transaction::new("TX-3", dec!(250), TransactionKind::Debit, day(3)),
    ];

    println!("Ledger:");
    for tx in &transactions {
        println!("  {:<6} {:>8} {}", tx.id(), tx.amount(), tx.kind());
    }

    let bca_feed = vec![
        BankStatement::new(bca.clone(), "BCA-1", dec!(100), day(1)),
        BankStatement::new(bca.clone(), "BCA-2", dec!(300), day(4)),
    ];
    let bri_feed = vec![
        BankStatement::new(bri.clone(), "BRI-1", dec!(200), day(2)),
        BankStatement::new(bri.clone(), "BRI-2", dec!(400), day(5)),
    ];

    println!("\nStatements:");
    for statement in bca_feed.iter().chain(&bri_feed) {
        println!(
            "  {:<4} {:<6} {:>8}",
            statement.bank(),
            statement.id(),
            statement.amount()
        );
    }
    println!();

    let report = ReconciliationEngine::run(transactions, vec![bca_feed, bri_feed]);

    println!("{}", report);
    println!(
        "Ledger is {} short of the banks.",
        -report.summary.discrepancy_amount()
    );
}

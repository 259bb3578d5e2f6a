//! Repeated amounts across banks.
//!
//! When several statements share an amount, transactions consume them in
//! load order and every survivor is flagged as appearing multiple times.

use bank_recon::core::statement::{BankName, BankStatement};
use bank_recon::core::transaction::{Transaction, TransactionKind};
use bank_recon::matching::bucket::AmountBucketStore;
use bank_recon::matching::engine::ReconciliationEngine;
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

fn main() {
    println!("╔══════════════════════════════════════════════╗");
    println!("║  bank-recon: Duplicate Amounts Across Banks  ║");
    println!("╚══════════════════════════════════════════════╝\n");

    let ts = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
    let bca = BankName::new("BCA");
    let bri = BankName::new("BRI");
    let mandiri = BankName::new("MANDIRI");

    // One 100.00 payment, three banks reporting 100.00.
    let feeds = vec![
        vec![BankStatement::new(bca.clone(), "BCA-1", dec!(100.00), ts)],
        vec![BankStatement::new(bri.clone(), "BRI-1", dec!(100), ts)],
        vec![
            BankStatement::new(mandiri.clone(), "MDR-1", dec!(100), ts),
            BankStatement::new(mandiri.clone(), "MDR-2", dec!(75), ts),
        ],
    ];

    let store: AmountBucketStore = feeds.iter().flatten().cloned().collect();
    println!("Buckets before matching:");
    for amount in [dec!(75), dec!(100)] {
        if let Some(group) = store.group(amount) {
            println!(
                "  {:>6}: {} statement(s), multiple = {}",
                amount,
                group.len(),
                group.appears_multiple_times()
            );
        }
    }
    println!();

    let transactions = vec![Transaction::new("TX-1", dec!(100), TransactionKind::Credit, ts)];
    let report = ReconciliationEngine::run(transactions, feeds);

    println!("{}", report);

    println!("Flags by bank:");
    for (bank, group) in &report.discrepancies {
        println!(
            "  {:<8} {} leftover, appears multiple times: {}",
            bank,
            group.statements.len(),
            group.appears_multiple_times
        );
    }
}

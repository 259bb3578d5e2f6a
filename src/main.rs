//! bank-recon CLI
//!
//! Reconcile a transaction ledger against bank-statement feeds from the
//! command line.
//!
//! # Usage
//!
//! ```bash
//! # Reconcile August against two banks, writing recon/*.csv
//! bank-recon reconcile --transactions tx.csv --statements bca.csv,bri.csv \
//!     --start 2025-08-01 --end 2025-08-31
//!
//! # Write a single JSON report instead
//! bank-recon reconcile --transactions tx.csv --statements bca.csv \
//!     --start 2025-08-01 --end 2025-08-31 --format json --output recon.json
//!
//! # Generate a random dataset to try it on
//! bank-recon generate --transactions 200 --banks BCA,BRI --output-dir data
//! ```

use bank_recon::config::{parse_date, DateWindow, OutputFormat, ReconConfig};
use bank_recon::core::statement::BankName;
use bank_recon::executor::{ReconError, ReconExecutor};
use bank_recon::simulation::generator::{generate_dataset, DatasetConfig};
use bank_recon::storage::csv_source::{CsvStatementSource, CsvTransactionSource};
use bank_recon::storage::sink::{CsvWorkbookSink, JsonReportSink};
use bank_recon::storage::ReportSink;
use std::error::Error;
use std::path::PathBuf;
use std::process;

fn print_usage() {
    eprintln!(
        r#"bank-recon — reconcile a transaction ledger against bank statements

USAGE:
    bank-recon <COMMAND> [OPTIONS]

COMMANDS:
    reconcile   Match transactions to bank statements and write a report
    generate    Generate a random dataset (for testing)
    help        Show this message

OPTIONS (reconcile):
    --transactions <FILE>     Transactions CSV (id,amount,type,time)
    --statements <FILE,...>   Bank-statement CSVs (id,amount,time); repeatable.
                              The bank name is the file stem.
    --start <YYYY-MM-DD>      First day of the window (inclusive)
    --end <YYYY-MM-DD>        Last day of the window (inclusive)
    --output <PATH>           Report directory (csv) or file (json). Default: recon
    --format <FORMAT>         csv (default) or json
    --verbose                 Log at debug level

OPTIONS (generate):
    --transactions <N>        Number of transactions (default: 100)
    --banks <LIST>            Comma-separated bank names (default: BCA,BRI)
    --match-ratio <P>         Share of transactions with a statement (default: 0.8)
    --noise <N>               Extra unexplained statements (default: 10)
    --start <YYYY-MM-DD>      First day of the window (default: 2025-08-01)
    --days <N>                Window length in days (default: 30)
    --seed <N>                Seed for reproducible output
    --output-dir <DIR>        Where to write the CSV files (default: .)

Logging honours RUST_LOG (default: info).

EXAMPLES:
    bank-recon reconcile --transactions tx.csv --statements bca.csv,bri.csv --start 2025-08-01 --end 2025-08-31
    bank-recon generate --transactions 500 --banks BCA,BRI,MANDIRI --seed 7 --output-dir data"#
    );
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn report_error(err: &ReconError) -> ! {
    eprintln!("Error: {}", err);
    let mut cause = err.source();
    while let Some(inner) = cause {
        eprintln!("  caused by: {}", inner);
        cause = inner.source();
    }
    process::exit(1);
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn next_value(args: &[String], i: &mut usize, flag: &str, expected: &str) -> String {
    *i += 1;
    args.get(*i)
        .cloned()
        .unwrap_or_else(|| fail(format!("{} requires {}", flag, expected)))
}

fn run<R: ReportSink>(config: &ReconConfig, sink: R) {
    let mut executor = ReconExecutor::new(CsvTransactionSource, CsvStatementSource, sink);
    match executor.execute(config) {
        Ok(report) => {
            println!("{}", report);
            println!("Report written to {}", config.output.display());
        }
        Err(err) => report_error(&err),
    }
}

fn cmd_reconcile(args: &[String]) {
    let mut transactions: Option<String> = None;
    let mut statements: Vec<String> = Vec::new();
    let mut start: Option<String> = None;
    let mut end: Option<String> = None;
    let mut output: Option<PathBuf> = None;
    let mut format = OutputFormat::Csv;
    let mut verbose = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--transactions" => {
                transactions = Some(next_value(args, &mut i, "--transactions", "a file path"));
            }
            "--statements" => {
                let list = next_value(args, &mut i, "--statements", "a comma-separated list");
                statements.extend(
                    list.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                );
            }
            "--start" => start = Some(next_value(args, &mut i, "--start", "a date")),
            "--end" => end = Some(next_value(args, &mut i, "--end", "a date")),
            "--output" => {
                output = Some(PathBuf::from(next_value(args, &mut i, "--output", "a path")));
            }
            "--format" => {
                let value = next_value(args, &mut i, "--format", "'csv' or 'json'");
                format = value.parse().unwrap_or_else(|e| fail(e));
            }
            "--verbose" | "-v" => verbose = true,
            _ => fail(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    init_logger(verbose);

    let transactions = transactions.unwrap_or_else(|| fail("--transactions <FILE> is required"));
    let start = start.unwrap_or_else(|| fail("--start <YYYY-MM-DD> is required"));
    let end = end.unwrap_or_else(|| fail("--end <YYYY-MM-DD> is required"));

    let window = DateWindow::parse(&start, &end).unwrap_or_else(|e| fail(e));
    let mut config = ReconConfig::new(transactions, statements, window)
        .unwrap_or_else(|e| fail(e))
        .with_format(format);
    if let Some(output) = output {
        config = config.with_output(output);
    }

    log::debug!("running with {:?}", config);

    match config.format {
        OutputFormat::Csv => run(&config, CsvWorkbookSink::new(&config.output)),
        OutputFormat::Json => run(&config, JsonReportSink::new(&config.output)),
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = DatasetConfig::default();
    let mut output_dir = PathBuf::from(".");

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--transactions" => {
                config.transaction_count = next_value(args, &mut i, "--transactions", "a number")
                    .parse()
                    .unwrap_or_else(|_| fail("--transactions requires a number"));
            }
            "--banks" => {
                config.banks = next_value(args, &mut i, "--banks", "a comma-separated list")
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(BankName::new)
                    .collect();
            }
            "--match-ratio" => {
                config.match_ratio = next_value(args, &mut i, "--match-ratio", "a number")
                    .parse::<f64>()
                    .ok()
                    .filter(|ratio| (0.0..=1.0).contains(ratio))
                    .unwrap_or_else(|| fail("--match-ratio requires a number between 0 and 1"));
            }
            "--noise" => {
                config.noise_statements = next_value(args, &mut i, "--noise", "a number")
                    .parse()
                    .unwrap_or_else(|_| fail("--noise requires a number"));
            }
            "--start" => {
                let value = next_value(args, &mut i, "--start", "a date");
                config.start = parse_date(&value).unwrap_or_else(|e| fail(e));
            }
            "--days" => {
                config.days = next_value(args, &mut i, "--days", "a number")
                    .parse()
                    .unwrap_or_else(|_| fail("--days requires a number"));
            }
            "--seed" => {
                config.seed = Some(
                    next_value(args, &mut i, "--seed", "a number")
                        .parse()
                        .unwrap_or_else(|_| fail("--seed requires a number")),
                );
            }
            "--output-dir" => {
                output_dir = PathBuf::from(next_value(args, &mut i, "--output-dir", "a path"));
            }
            _ => fail(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    init_logger(false);

    let dataset = generate_dataset(&config);
    let (tx_path, statement_paths) = dataset
        .write_csv(&output_dir)
        .unwrap_or_else(|e| fail(format!("writing to '{}': {}", output_dir.display(), e)));

    eprintln!(
        "Generated {} transactions and {} statements across {} bank(s) → {}",
        dataset.transactions.len(),
        dataset.statement_count(),
        statement_paths.len(),
        output_dir.display()
    );
    let statements: Vec<String> = statement_paths
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    if let Ok(window) = dataset.window() {
        println!(
            "bank-recon reconcile --transactions {} --statements {} --start {} --end {}",
            tx_path.display(),
            statements.join(","),
            window.start(),
            window.end()
        );
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "reconcile" => cmd_reconcile(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}

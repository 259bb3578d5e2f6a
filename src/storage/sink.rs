//! Section-based report sinks.
//!
//! A report is a set of named sections (summary, unmatched transactions, one
//! per bank). Every backend only has to know how to replace one section by
//! name; turning records into rows happens once, in the [`ReportSink`]
//! impl for all [`SectionWriter`]s.

use crate::core::statement::BankName;
use crate::core::summary::Summary;
use crate::core::transaction::Transaction;
use crate::matching::discrepancy::DiscrepancyGroup;
use crate::storage::{ReportSink, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const SUMMARY_SECTION: &str = "summary";
pub const TRANSACTION_SECTION: &str = "transaction";

/// True when `name` would collide with a fixed section. Compared
/// case-insensitively, since workbook directories may live on
/// case-insensitive file systems.
pub fn is_reserved_section(name: &str) -> bool {
    [SUMMARY_SECTION, TRANSACTION_SECTION]
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

pub const TRANSACTION_HEADERS: [&str; 4] = ["Id", "Amount", "Type", "Time"];
pub const STATEMENT_HEADERS: [&str; 5] = ["Bank", "ID", "Amount", "Time", "Appear Multiple Time"];

/// One named table of a report. `headers` is empty for key/value sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Section {
    pub fn with_headers(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn summary(summary: &Summary) -> Self {
        let mut section = Self::default();
        for (label, value) in summary.rows() {
            section.push_row(vec![label.to_string(), value]);
        }
        section
    }

    pub fn transactions(transactions: &[Transaction]) -> Self {
        let mut section = Self::with_headers(&TRANSACTION_HEADERS);
        for tx in transactions {
            section.push_row(vec![
                tx.id().to_string(),
                tx.amount().to_string(),
                tx.kind().to_string(),
                tx.timestamp().to_rfc3339(),
            ]);
        }
        section
    }

    pub fn discrepancies(group: &DiscrepancyGroup) -> Self {
        let mut section = Self::with_headers(&STATEMENT_HEADERS);
        for statement in &group.statements {
            section.push_row(vec![
                statement.bank().to_string(),
                statement.id().to_string(),
                statement.amount().to_string(),
                statement.timestamp().to_rfc3339(),
                group.appears_multiple_times.to_string(),
            ]);
        }
        section
    }
}

/// Storage that can create-or-replace a section by name.
///
/// Replacing one section must leave every other section untouched, and a
/// failed write must not leave a half-written section behind.
pub trait SectionWriter {
    fn upsert_section(&mut self, name: &str, section: &Section) -> Result<(), StorageError>;
}

impl<W: SectionWriter> ReportSink for W {
    fn write_summary(&mut self, summary: &Summary) -> Result<(), StorageError> {
        self.upsert_section(SUMMARY_SECTION, &Section::summary(summary))
    }

    fn write_unmatched_transactions(
        &mut self,
        transactions: &[Transaction],
    ) -> Result<(), StorageError> {
        self.upsert_section(TRANSACTION_SECTION, &Section::transactions(transactions))
    }

    fn write_discrepancies(
        &mut self,
        bank: &BankName,
        group: &DiscrepancyGroup,
    ) -> Result<(), StorageError> {
        self.upsert_section(bank.as_str(), &Section::discrepancies(group))
    }
}

fn sink_error(section: &str) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::SinkWriteFailed {
        section: section.to_string(),
        source,
    }
}

/// Write through a temp file beside `path`, then rename it into place.
fn replace_file(path: &Path, write: impl FnOnce(&Path) -> io::Result<()>) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    if let Err(e) = write(&tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)
}

/// A directory standing in for a workbook: each section is `<name>.csv`.
#[derive(Debug, Clone)]
pub struct CsvWorkbookSink {
    dir: PathBuf,
}

impl CsvWorkbookSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn section_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }

    /// Read a previously written section back, if present.
    pub fn read_section(&self, name: &str) -> Result<Option<Section>, StorageError> {
        let path = self.section_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| sink_error(name)(e.into()))?;
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| sink_error(name)(e.into()))?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
        // Key/value sections are written without a header row.
        let headers = if name == SUMMARY_SECTION || rows.is_empty() {
            Vec::new()
        } else {
            rows.remove(0)
        };
        Ok(Some(Section { headers, rows }))
    }
}

impl SectionWriter for CsvWorkbookSink {
    fn upsert_section(&mut self, name: &str, section: &Section) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(sink_error(name))?;
        let path = self.section_path(name);

        replace_file(&path, |tmp| {
            let mut writer = csv::WriterBuilder::new().flexible(true).from_path(tmp)?;
            if !section.headers.is_empty() {
                writer.write_record(&section.headers)?;
            }
            for row in &section.rows {
                writer.write_record(row)?;
            }
            writer.flush()
        })
        .map_err(sink_error(name))?;

        log::info!(
            "wrote section '{}' ({} row(s)) to {}",
            name,
            section.rows.len(),
            path.display()
        );
        Ok(())
    }
}

/// A single JSON document mapping section names to sections.
#[derive(Debug, Clone)]
pub struct JsonReportSink {
    path: PathBuf,
}

impl JsonReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the current document, or an empty one if the file does not exist.
    pub fn load(&self) -> io::Result<BTreeMap<String, Section>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e),
        }
    }
}

impl SectionWriter for JsonReportSink {
    fn upsert_section(&mut self, name: &str, section: &Section) -> Result<(), StorageError> {
        let mut document = self.load().map_err(sink_error(name))?;
        document.insert(name.to_string(), section.clone());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(sink_error(name))?;
        }
        replace_file(&self.path, |tmp| {
            let json = serde_json::to_string_pretty(&document)?;
            fs::write(tmp, json)
        })
        .map_err(sink_error(name))?;

        log::info!(
            "wrote section '{}' ({} row(s)) to {}",
            name,
            section.rows.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::statement::BankStatement;
    use crate::core::transaction::TransactionKind;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn sample_group() -> DiscrepancyGroup {
        DiscrepancyGroup {
            statements: vec![BankStatement::new(
                BankName::new("BCA"),
                "S1",
                dec!(300),
                Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
            )],
            appears_multiple_times: true,
        }
    }

    #[test]
    fn test_reserved_section_names() {
        assert!(is_reserved_section("summary"));
        assert!(is_reserved_section("Transaction"));
        assert!(!is_reserved_section("BCA"));
        assert!(!is_reserved_section("summary2"));
    }

    #[test]
    fn test_summary_section_has_no_headers() {
        let section = Section::summary(&Summary::new());
        assert!(section.headers.is_empty());
        assert_eq!(section.rows.len(), 6);
        assert_eq!(section.rows[5][0], "Total Amount Discrepancy");
    }

    #[test]
    fn test_transaction_section_rows() {
        let tx = Transaction::new(
            "T1",
            dec!(250),
            TransactionKind::Debit,
            Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
        );
        let section = Section::transactions(&[tx]);
        assert_eq!(section.headers, vec!["Id", "Amount", "Type", "Time"]);
        assert_eq!(
            section.rows[0],
            vec!["T1", "250", "debit", "2025-08-01T00:00:00+00:00"]
        );
    }

    #[test]
    fn test_discrepancy_section_carries_flag() {
        let section = Section::discrepancies(&sample_group());
        assert_eq!(section.headers.len(), 5);
        assert_eq!(section.rows[0][0], "BCA");
        assert_eq!(section.rows[0][4], "true");
    }

    #[test]
    fn test_csv_workbook_upsert_replaces_only_named_section() {
        let dir = TempDir::new().unwrap();
        let mut sink = CsvWorkbookSink::new(dir.path().join("recon"));

        sink.write_discrepancies(&BankName::new("BCA"), &sample_group()).unwrap();
        sink.write_unmatched_transactions(&[]).unwrap();
        sink.write_discrepancies(&BankName::new("BCA"), &DiscrepancyGroup::default())
            .unwrap();

        let bca = sink.read_section("BCA").unwrap().unwrap();
        assert_eq!(bca.headers.len(), 5);
        assert!(bca.rows.is_empty());
        let tx = sink.read_section(TRANSACTION_SECTION).unwrap().unwrap();
        assert_eq!(tx.headers, vec!["Id", "Amount", "Type", "Time"]);
        assert!(sink.read_section("BRI").unwrap().is_none());
        assert!(!sink.section_path("BCA").with_extension("csv.tmp").exists());
    }

    #[test]
    fn test_csv_workbook_summary_round() {
        let dir = TempDir::new().unwrap();
        let mut sink = CsvWorkbookSink::new(dir.path());
        let summary = Summary {
            total_matched: 2,
            ..Summary::new()
        };
        sink.write_summary(&summary).unwrap();

        let section = sink.read_section(SUMMARY_SECTION).unwrap().unwrap();
        assert!(section.headers.is_empty());
        assert_eq!(section.rows[2], vec!["Total Matched", "2"]);
    }

    #[test]
    fn test_json_sink_upserts_sections() {
        let dir = TempDir::new().unwrap();
        let mut sink = JsonReportSink::new(dir.path().join("out").join("recon.json"));

        sink.write_summary(&Summary::new()).unwrap();
        sink.write_discrepancies(&BankName::new("BCA"), &sample_group()).unwrap();
        sink.write_discrepancies(&BankName::new("BCA"), &sample_group()).unwrap();

        let document = sink.load().unwrap();
        assert_eq!(document.len(), 2);
        assert_eq!(document["BCA"].rows.len(), 1);
        assert!(document.contains_key(SUMMARY_SECTION));
    }

    #[test]
    fn test_json_sink_rejects_corrupt_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("recon.json");
        fs::write(&path, "not json").unwrap();
        let mut sink = JsonReportSink::new(&path);

        let err = sink.write_summary(&Summary::new()).unwrap_err();
        assert!(matches!(err, StorageError::SinkWriteFailed { ref section, .. } if section == "summary"));
    }
}

//! Invocation parameters for a reconciliation run.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Date format accepted for `--start` / `--end`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors in the parameters of a run, detected before anything is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("at least one bank-statement source is required")]
    NoStatementSources,
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },
    #[error("unknown output format '{value}', expected 'csv' or 'json'")]
    UnknownFormat { value: String },
}

/// Inclusive calendar-date window, evaluated in UTC.
///
/// A timestamp is inside the window when
/// `start 00:00 <= timestamp < (end + 1 day) 00:00`.
///
/// # Examples
///
/// ```
/// use bank_recon::config::DateWindow;
/// use chrono::{NaiveDate, TimeZone, Utc};
///
/// let window = DateWindow::new(
///     NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 8, 30).unwrap(),
/// ).unwrap();
///
/// assert!(window.contains(Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap()));
/// assert!(window.contains(Utc.with_ymd_and_hms(2025, 8, 30, 23, 59, 59).unwrap()));
/// assert!(!window.contains(Utc.with_ymd_and_hms(2025, 8, 31, 0, 0, 0).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ConfigError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// First instant inside the window.
    pub fn lower_bound(&self) -> DateTime<Utc> {
        midnight_utc(self.start)
    }

    /// First instant after the window, or `None` when `end` is the last
    /// representable date.
    pub fn upper_bound(&self) -> Option<DateTime<Utc>> {
        self.end.succ_opt().map(midnight_utc)
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        if timestamp < self.lower_bound() {
            return false;
        }
        match self.upper_bound() {
            Some(upper) => timestamp < upper,
            None => true,
        }
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ConfigError::InvalidDate {
        value: value.to_string(),
    })
}

/// Persistence format of the reconciliation report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A directory holding one CSV file per section.
    #[default]
    Csv,
    /// A single JSON document keyed by section name.
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ConfigError::UnknownFormat {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => f.write_str("csv"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

/// Everything one run needs to know: where to read, which window, where to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconConfig {
    pub transaction_source: String,
    /// Loaded in this order; the order fixes FIFO matching.
    pub statement_sources: Vec<String>,
    pub window: DateWindow,
    pub output: PathBuf,
    pub format: OutputFormat,
}

impl ReconConfig {
    /// Default report location, relative to the working directory.
    pub const DEFAULT_OUTPUT: &'static str = "recon";

    pub fn new(
        transaction_source: impl Into<String>,
        statement_sources: Vec<String>,
        window: DateWindow,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            transaction_source: transaction_source.into(),
            statement_sources,
            window,
            output: PathBuf::from(Self::DEFAULT_OUTPUT),
            format: OutputFormat::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.statement_sources.is_empty() {
            return Err(ConfigError::NoStatementSources);
        }
        if self.window.start() > self.window.end() {
            return Err(ConfigError::InvalidDateRange {
                start: self.window.start(),
                end: self.window.end(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_includes_start_instant() {
        let window = DateWindow::new(date(2025, 8, 1), date(2025, 8, 30)).unwrap();
        assert!(window.contains(Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2025, 7, 31, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_window_excludes_day_after_end() {
        let window = DateWindow::new(date(2025, 8, 1), date(2025, 8, 30)).unwrap();
        assert!(!window.contains(Utc.with_ymd_and_hms(2025, 8, 31, 0, 0, 0).unwrap()));
        assert_eq!(
            window.upper_bound(),
            Some(Utc.with_ymd_and_hms(2025, 8, 31, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_single_day_window() {
        let window = DateWindow::new(date(2025, 8, 1), date(2025, 8, 1)).unwrap();
        assert!(window.contains(Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2025, 8, 2, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        let err = DateWindow::new(date(2025, 9, 1), date(2025, 8, 1)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidDateRange {
                start: date(2025, 9, 1),
                end: date(2025, 8, 1)
            }
        );
    }

    #[test]
    fn test_window_parse() {
        let window = DateWindow::parse("2025-08-01", " 2025-08-30 ").unwrap();
        assert_eq!(window.start(), date(2025, 8, 1));
        assert_eq!(window.end(), date(2025, 8, 30));
        assert_eq!(window.to_string(), "2025-08-01..=2025-08-30");
        assert!(matches!(
            DateWindow::parse("08/01/2025", "2025-08-30"),
            Err(ConfigError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("csv".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("xlsx".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_config_requires_statement_sources() {
        let window = DateWindow::new(date(2025, 8, 1), date(2025, 8, 30)).unwrap();
        let err = ReconConfig::new("tx.csv", Vec::new(), window).unwrap_err();
        assert_eq!(err, ConfigError::NoStatementSources);
    }

    #[test]
    fn test_config_defaults() {
        let window = DateWindow::new(date(2025, 8, 1), date(2025, 8, 30)).unwrap();
        let config = ReconConfig::new("tx.csv", vec!["bca.csv".to_string()], window)
            .unwrap()
            .with_format(OutputFormat::Json)
            .with_output("out/report.json");
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.output, PathBuf::from("out/report.json"));
        assert!(config.validate().is_ok());
    }
}

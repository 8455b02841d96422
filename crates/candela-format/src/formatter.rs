//! Output format abstraction.

use candela_types::{Bar, Series};
use chrono::NaiveDate;
use std::io::Write;
use thiserror::Error;

use crate::{CsvFormatter, JsonFormatter};

/// Output format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// CSV format.
    #[default]
    Csv,
    /// JSON array format.
    Json,
    /// Newline-delimited JSON format.
    Ndjson,
}

impl OutputFormat {
    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            _ => Err(FormatError::UnknownFormat(s.to_string())),
        }
    }
}

/// Errors that can occur during formatting.
#[derive(Error, Debug)]
pub enum FormatError {
    /// Unknown output format.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for bar formatters.
pub trait Formatter: Send + Sync {
    /// Writes bars to the output in the given order.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_bars<W: Write + Send>(&self, bars: &[Bar], writer: W) -> Result<(), FormatError>;

    /// Returns the file extension for this format.
    fn extension(&self) -> &str;
}

/// Writes bars in the given format with default formatter settings.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_bars<W: Write + Send>(
    format: OutputFormat,
    bars: &[Bar],
    writer: W,
) -> Result<(), FormatError> {
    match format {
        OutputFormat::Csv => CsvFormatter::new().write_bars(bars, writer),
        OutputFormat::Json => JsonFormatter::new().write_bars(bars, writer),
        OutputFormat::Ndjson => JsonFormatter::ndjson().write_bars(bars, writer),
    }
}

/// Returns the conventional export file name for a series over a date span,
/// e.g. `EURUSD_from_20240101_to_20240131_M5_BID.csv`.
#[must_use]
pub fn export_file_name(
    series: &Series,
    start: NaiveDate,
    end: NaiveDate,
    format: OutputFormat,
) -> String {
    format!(
        "{}_from_{}_to_{}_{}_{}.{}",
        series.symbol,
        start.format("%Y%m%d"),
        end.format("%Y%m%d"),
        series.period.as_str(),
        series.price_type.as_str(),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use candela_types::{Period, PriceType, Source};

    #[test]
    fn test_format_parse() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Ndjson);
        assert!("parquet".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_export_file_name() {
        let series = Series::new("eurusd", Period::Minute5, Source::feed(), PriceType::Bid);
        let name = export_file_name(
            &series,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            OutputFormat::Csv,
        );
        assert_eq!(name, "EURUSD_from_20240101_to_20240131_M5_BID.csv");
    }
}

//! CSV output format.

use candela_types::Bar;
use std::io::Write;

use crate::{FormatError, Formatter};

/// CSV formatter writing a `time,open,high,low,close,volume` header and one
/// row per bar.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFormatter;

impl CsvFormatter {
    /// Creates a CSV formatter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Formatter for CsvFormatter {
    fn write_bars<W: Write + Send>(&self, bars: &[Bar], mut writer: W) -> Result<(), FormatError> {
        writeln!(writer, "time,open,high,low,close,volume")?;

        for bar in bars {
            let ohlcv = &bar.ohlcv;
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                ohlcv.time.format("%Y-%m-%dT%H:%M:%SZ"),
                ohlcv.open,
                ohlcv.high,
                ohlcv.low,
                ohlcv.close,
                ohlcv.volume
            )?;
        }

        writer.flush()?;
        Ok(())
    }

    fn extension(&self) -> &str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candela_types::{Ohlcv, Period, PriceType, Series, Source};
    use chrono::{TimeZone, Utc};
    use std::io::Cursor;

    fn create_test_bar() -> Bar {
        let time = Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 0).unwrap();
        Bar::new(
            Series::new("EURUSD", Period::Minute1, Source::feed(), PriceType::Bid),
            Ohlcv::new(time, 1.1001, 1.1010, 1.0995, 1.1005, 12.5),
        )
    }

    #[test]
    fn test_csv_bars() {
        let formatter = CsvFormatter::new();
        let mut output = Cursor::new(Vec::new());

        formatter.write_bars(&[create_test_bar()], &mut output).unwrap();

        let result = String::from_utf8(output.into_inner()).unwrap();
        let lines: Vec<_> = result.lines().collect();
        assert_eq!(lines[0], "time,open,high,low,close,volume");
        assert_eq!(lines[1], "2024-01-15T12:30:00Z,1.1001,1.101,1.0995,1.1005,12.5");
    }

    #[test]
    fn test_csv_empty_has_header_only() {
        let mut output = Cursor::new(Vec::new());
        CsvFormatter::new().write_bars(&[], &mut output).unwrap();

        let result = String::from_utf8(output.into_inner()).unwrap();
        assert_eq!(result, "time,open,high,low,close,volume\n");
    }
}

//! JSON output format.

use candela_types::Bar;
use std::io::Write;

use crate::{FormatError, Formatter};

/// JSON output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum JsonStyle {
    /// JSON array (standard JSON).
    #[default]
    Array,
    /// Newline-delimited JSON (NDJSON/JSONL).
    Ndjson,
}

/// JSON formatter. Each bar is written with its full identity.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    style: JsonStyle,
}

impl JsonFormatter {
    /// Creates a new JSON formatter with default settings (array style).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            style: JsonStyle::Array,
        }
    }

    /// Creates a new NDJSON formatter.
    #[must_use]
    pub const fn ndjson() -> Self {
        Self {
            style: JsonStyle::Ndjson,
        }
    }
}

impl Formatter for JsonFormatter {
    fn write_bars<W: Write + Send>(&self, bars: &[Bar], mut writer: W) -> Result<(), FormatError> {
        match self.style {
            JsonStyle::Array => {
                serde_json::to_writer(&mut writer, bars)?;
                writeln!(writer)?;
            }
            JsonStyle::Ndjson => {
                for bar in bars {
                    serde_json::to_writer(&mut writer, bar)?;
                    writeln!(writer)?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn extension(&self) -> &str {
        match self.style {
            JsonStyle::Array => "json",
            JsonStyle::Ndjson => "ndjson",
        }
    }
}

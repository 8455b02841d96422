//! Bar export formatters for the candela candle pipeline.
//!
//! - [`CsvFormatter`] - `time,open,high,low,close,volume` rows
//! - [`JsonFormatter`] - JSON array or NDJSON
//! - [`export_file_name`] - Conventional export file name for a series

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod csv;
mod formatter;
mod json;

pub use crate::csv::CsvFormatter;
pub use formatter::{FormatError, Formatter, OutputFormat, export_file_name, write_bars};
pub use json::JsonFormatter;

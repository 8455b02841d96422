//! Error types for candela.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for candela operations.
pub type Result<T> = std::result::Result<T, CandelaError>;

/// Errors that can occur while describing or validating pipeline inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CandelaError {
    /// Instrument symbol is not a currency pair.
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    /// Quote side is neither bid nor ask.
    #[error("Unknown price type '{0}', expected BID or ASK")]
    UnknownPriceType(String),

    /// Invalid date range.
    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    /// Invalid period or period chain.
    #[error(transparent)]
    Period(#[from] PeriodError),
}

/// Error for invalid date ranges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    /// Start date is after end date.
    #[error("Invalid date range: {start} > {end}")]
    InvalidRange {
        /// The start date.
        start: NaiveDate,
        /// The end date.
        end: NaiveDate,
    },
}

/// Error for invalid periods and period chains.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    /// String or minute count does not name a supported period.
    #[error("invalid period '{0}', expected one of: tick, m1, m5, m15, m30, h1, h4, d1, w1, mn")]
    Unknown(String),

    /// Chain is empty.
    #[error("period chain is empty")]
    EmptyChain,

    /// Chain does not start at one minute.
    #[error("period chain must start at m1, found {0}")]
    BadBase(String),

    /// Chain is not strictly ascending.
    #[error("period chain is not strictly ascending at {0}")]
    NotAscending(String),

    /// Period is not part of the chain, or is its base.
    #[error("period {0} has no source period in the chain")]
    NoSource(String),
}

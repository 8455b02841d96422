//! Aggregation error types.

use candela_types::{Period, PeriodError};
use candela_store::StoreError;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while folding a tier.
#[derive(Error, Debug)]
pub enum AggregateError {
    /// The period is a base period and is never folded.
    #[error("period {0} is not a derived period")]
    NotDerived(Period),

    /// The bucket for a date falls outside the representable calendar.
    #[error("no bucket can be formed for {0}")]
    OutOfRange(NaiveDate),

    /// The target period has no source in the chain.
    #[error(transparent)]
    Period(#[from] PeriodError),

    /// Reading source bars or writing derived bars failed.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

/// Result type for aggregation operations.
pub type Result<T> = std::result::Result<T, AggregateError>;

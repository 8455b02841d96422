//! Core types for the candela candle ingestion pipeline.
//!
//! This crate provides the fundamental data structures used throughout candela:
//!
//! - [`Bar`] - A persisted OHLCV candle keyed by its [`Series`] and start time
//! - [`RawBar`] - Raw minute record from the bi5 candle format before descaling
//! - [`Period`] / [`PeriodChain`] - Candle timeframes and their derivation order
//! - [`PriceType`] / [`Source`] - Quote side and provenance tag
//! - [`Instrument`] / [`PriceScale`] - Currency pairs and their descaling divisors
//! - [`DateRange`] - Inclusive calendar date range

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bar;
mod date_range;
mod error;
mod instrument;
mod period;
mod series;

pub use bar::{Bar, Ohlcv, RawBar};
pub use date_range::{DateRange, DayIterator, midnight};
pub use error::{CandelaError, DateRangeError, PeriodError, Result};
pub use instrument::{Instrument, PriceScale};
pub use period::{Period, PeriodChain};
pub use series::{PriceType, Series, Source};

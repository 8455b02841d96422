//! Candle data representation.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{Series, midnight};

/// OHLCV payload of a candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    /// Bucket start instant (UTC).
    pub time: DateTime<Utc>,
    /// Opening price.
    pub open: f64,
    /// Highest price during the period.
    pub high: f64,
    /// Lowest price during the period.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Traded volume, may be zero.
    pub volume: f64,
}

impl Ohlcv {
    /// Creates a new OHLCV payload.
    #[must_use]
    pub const fn new(
        time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if the candle carries genuine trading activity.
    #[must_use]
    pub fn is_trading(&self) -> bool {
        self.volume > 0.0
    }
}

/// A persisted candle: one OHLCV record for one series at one bucket start.
///
/// The identity of a bar is its [`Series`] plus [`Ohlcv::time`]; at most one
/// bar exists per identity and writes overwrite the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Series the bar belongs to.
    #[serde(flatten)]
    pub series: Series,
    /// Bar payload, including its start time.
    #[serde(flatten)]
    pub ohlcv: Ohlcv,
}

impl Bar {
    /// Creates a bar from a series and a payload.
    #[must_use]
    pub const fn new(series: Series, ohlcv: Ohlcv) -> Self {
        Self { series, ohlcv }
    }

    /// Returns the bucket start instant.
    #[must_use]
    pub const fn time(&self) -> DateTime<Utc> {
        self.ohlcv.time
    }
}

/// Raw minute record as read from a bi5 candle archive (before descaling).
///
/// The archive stores records as 24 bytes in big-endian order. The price
/// fields are NOT in OHLC order:
/// - `i32`: seconds offset from the day's midnight
/// - `i32`: open (scaled integer)
/// - `i32`: close (scaled integer)
/// - `i32`: low (scaled integer)
/// - `i32`: high (scaled integer)
/// - `f32`: volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBar {
    /// Seconds offset from the day's midnight.
    pub seconds_offset: i32,
    /// Raw open price.
    pub open_raw: i32,
    /// Raw close price.
    pub close_raw: i32,
    /// Raw low price.
    pub low_raw: i32,
    /// Raw high price.
    pub high_raw: i32,
    /// Volume.
    pub volume: f32,
}

impl RawBar {
    /// Size in bytes of a raw candle record.
    pub const SIZE: usize = 24;

    /// Creates a new raw bar, taking fields in wire order.
    #[must_use]
    pub const fn new(
        seconds_offset: i32,
        open_raw: i32,
        close_raw: i32,
        low_raw: i32,
        high_raw: i32,
        volume: f32,
    ) -> Self {
        Self {
            seconds_offset,
            open_raw,
            close_raw,
            low_raw,
            high_raw,
            volume,
        }
    }

    /// Normalizes the raw record using the instrument's decimal factor.
    ///
    /// For example EUR/USD has a decimal factor of 100,000, so a raw price of
    /// 112345 becomes 1.12345; USD/JPY uses 1,000.
    #[must_use]
    pub fn normalize(self, day: NaiveDate, decimal_factor: f64) -> Ohlcv {
        let time = midnight(day) + TimeDelta::seconds(i64::from(self.seconds_offset));
        Ohlcv {
            time,
            open: f64::from(self.open_raw) / decimal_factor,
            high: f64::from(self.high_raw) / decimal_factor,
            low: f64::from(self.low_raw) / decimal_factor,
            close: f64::from(self.close_raw) / decimal_factor,
            volume: f64::from(self.volume),
        }
    }
}

//! Dukascopy URL construction.

use candela_types::PriceType;
use chrono::{Datelike, NaiveDate};

/// Base URL for Dukascopy data feed.
pub const BASE_URL: &str = "https://datafeed.dukascopy.com/datafeed";

/// Builds the URL for one day of 1-minute candles.
///
/// URL format: `{base}/{INSTRUMENT}/{YEAR}/{MONTH}/{DAY}/{SIDE}_candles_min_1.bi5`
///
/// Note: Dukascopy uses 0-indexed months (January = 00).
///
/// # Example
///
/// ```
/// use candela_fetch::url::{BASE_URL, candle_url};
/// use candela_types::PriceType;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let url = candle_url(BASE_URL, "eurusd", PriceType::Bid, day);
/// assert_eq!(
///     url,
///     "https://datafeed.dukascopy.com/datafeed/EURUSD/2024/00/15/BID_candles_min_1.bi5"
/// );
/// ```
#[must_use]
pub fn candle_url(base: &str, symbol: &str, price_type: PriceType, day: NaiveDate) -> String {
    format!(
        "{}/{}/{}/{:02}/{:02}/{}_candles_min_1.bi5",
        base.trim_end_matches('/'),
        symbol.to_uppercase(),
        day.year(),
        day.month0(), // Dukascopy uses 0-indexed months
        day.day(),
        price_type.as_str()
    )
}

//! Series identity: symbol, period, provenance and quote side.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{CandelaError, Period};

/// Quote side of a price stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriceType {
    /// Bid prices.
    Bid,
    /// Ask (offer) prices.
    Ask,
}

impl PriceType {
    /// Returns the quote side as it appears in archive URLs and paths.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bid => "BID",
            Self::Ask => "ASK",
        }
    }

    /// Returns both quote sides.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Bid, Self::Ask]
    }
}

impl std::fmt::Display for PriceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PriceType {
    type Err = CandelaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BID" => Ok(Self::Bid),
            "ASK" => Ok(Self::Ask),
            _ => Err(CandelaError::UnknownPriceType(s.to_string())),
        }
    }
}

/// Provenance tag of a bar.
///
/// Derived bars inherit the tag of the bars they were folded from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Source(String);

impl Source {
    /// Tag used for bars decoded from the remote candle archive feed.
    pub const FEED: &'static str = "Dukascopy";

    /// Creates a source tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the archive feed tag.
    #[must_use]
    pub fn feed() -> Self {
        Self::new(Self::FEED)
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Source {
    fn default() -> Self {
        Self::feed()
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bar series: every identity component of a [`crate::Bar`] except its time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Series {
    /// Currency-pair code, upper case (e.g. "EURUSD").
    pub symbol: String,
    /// Candle period.
    pub period: Period,
    /// Provenance tag.
    pub source: Source,
    /// Quote side.
    pub price_type: PriceType,
}

impl Series {
    /// Creates a series; the symbol is upper-cased.
    #[must_use]
    pub fn new(
        symbol: impl Into<String>,
        period: Period,
        source: Source,
        price_type: PriceType,
    ) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            period,
            source,
            price_type,
        }
    }

    /// Returns the same series at a different period.
    #[must_use]
    pub fn with_period(&self, period: Period) -> Self {
        Self {
            period,
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Series {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} [{}]",
            self.symbol, self.period, self.price_type, self.source
        )
    }
}

//! Currency-pair instruments and price descaling.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::CandelaError;

/// Descaling divisors keyed by quote currency.
///
/// Archive prices are scaled integers; dividing by the divisor yields the
/// pip/pipette-denominated decimal price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceScale {
    /// Divisor for quote currencies without an override.
    pub default: u32,
    /// Per-quote-currency divisors.
    pub quote_overrides: BTreeMap<String, u32>,
}

impl PriceScale {
    /// Returns the divisor for a quote currency.
    #[must_use]
    pub fn divisor_for(&self, quote: &str) -> u32 {
        self.quote_overrides
            .get(&quote.to_uppercase())
            .copied()
            .unwrap_or(self.default)
    }
}

impl Default for PriceScale {
    fn default() -> Self {
        Self {
            default: 100_000,
            quote_overrides: BTreeMap::from([("JPY".to_string(), 1_000)]),
        }
    }
}

/// A currency pair with its descaling divisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Pair code, upper case (e.g. "EURUSD").
    symbol: String,
    /// Decimal factor for price normalization.
    decimal_factor: u32,
}

impl Instrument {
    /// Creates a currency-pair instrument, taking its divisor from the scale.
    ///
    /// # Errors
    ///
    /// Returns [`CandelaError::UnknownInstrument`] if the symbol is not six
    /// ASCII letters.
    pub fn forex(symbol: &str, scale: &PriceScale) -> Result<Self, CandelaError> {
        if symbol.len() != 6 || !symbol.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CandelaError::UnknownInstrument(symbol.to_string()));
        }
        let symbol = symbol.to_uppercase();
        let decimal_factor = scale.divisor_for(&symbol[3..]);
        Ok(Self {
            symbol,
            decimal_factor,
        })
    }

    /// Returns the pair code.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the base currency (first three letters).
    #[must_use]
    pub fn base_currency(&self) -> &str {
        &self.symbol[..3]
    }

    /// Returns the quote currency (last three letters).
    #[must_use]
    pub fn quote_currency(&self) -> &str {
        &self.symbol[3..]
    }

    /// Returns the decimal factor for price normalization.
    #[must_use]
    pub const fn decimal_factor(&self) -> u32 {
        self.decimal_factor
    }

    /// Returns the decimal factor as f64 for price calculations.
    #[must_use]
    pub fn decimal_factor_f64(&self) -> f64 {
        f64::from(self.decimal_factor)
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base_currency(), self.quote_currency())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_creation() {
        let scale = PriceScale::default();
        let eurusd = Instrument::forex("eurusd", &scale).unwrap();

        assert_eq!(eurusd.symbol(), "EURUSD");
        assert_eq!(eurusd.base_currency(), "EUR");
        assert_eq!(eurusd.quote_currency(), "USD");
        assert_eq!(eurusd.decimal_factor(), 100_000);
        assert_eq!(eurusd.to_string(), "EUR/USD");
    }

    #[test]
    fn test_jpy_quote_uses_override() {
        let scale = PriceScale::default();
        assert_eq!(Instrument::forex("USDJPY", &scale).unwrap().decimal_factor(), 1_000);
        // JPY as base currency does not change the scale.
        assert_eq!(Instrument::forex("JPYUSD", &scale).unwrap().decimal_factor(), 100_000);
    }

    #[test]
    fn test_invalid_symbol() {
        let scale = PriceScale::default();
        assert!(Instrument::forex("EURUS", &scale).is_err());
        assert!(Instrument::forex("EUR/USD", &scale).is_err());
    }

    #[test]
    fn test_custom_scale() {
        let scale = PriceScale {
            default: 10_000,
            quote_overrides: BTreeMap::from([("HUF".to_string(), 100)]),
        };
        assert_eq!(scale.divisor_for("huf"), 100);
        assert_eq!(scale.divisor_for("JPY"), 10_000);
    }
}

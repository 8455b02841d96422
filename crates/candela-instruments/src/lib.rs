//! Instrument universe for the candela candle ingestion pipeline.
//!
//! The universe is an explicit, immutable value handed to the pipeline rather
//! than a process-wide table, so tests can build exactly the instruments they
//! need.
//!
//! # Example
//!
//! ```
//! use candela_instruments::InstrumentUniverse;
//! use candela_types::PriceScale;
//!
//! let universe = InstrumentUniverse::new(["EURUSD", "USDJPY"], &PriceScale::default()).unwrap();
//!
//! if let Some(instrument) = universe.get("usdjpy") {
//!     assert_eq!(instrument.decimal_factor(), 1_000);
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use candela_types::{CandelaError, Instrument, PriceScale};

/// The 28 major and cross pairs ingested by default.
pub const FOREX_PAIRS: [&str; 28] = [
    "AUDCAD", "AUDCHF", "AUDJPY", "AUDNZD", "AUDUSD", "CADCHF", "CADJPY", "CHFJPY", "EURAUD",
    "EURCAD", "EURCHF", "EURGBP", "EURJPY", "EURNZD", "EURUSD", "GBPAUD", "GBPCAD", "GBPCHF",
    "GBPJPY", "GBPNZD", "GBPUSD", "NZDCAD", "NZDCHF", "NZDJPY", "NZDUSD", "USDCAD", "USDCHF",
    "USDJPY",
];

/// Set of instruments a pipeline run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentUniverse {
    instruments: BTreeMap<String, Instrument>,
}

impl InstrumentUniverse {
    /// Builds a universe from pair codes, resolving each divisor from the scale.
    ///
    /// Duplicate symbols collapse into one instrument.
    ///
    /// # Errors
    ///
    /// Returns an error if any symbol is not a currency pair.
    pub fn new<I, S>(symbols: I, scale: &PriceScale) -> Result<Self, CandelaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let instruments = symbols
            .into_iter()
            .map(|symbol| {
                let instrument = Instrument::forex(symbol.as_ref(), scale)?;
                Ok((instrument.symbol().to_string(), instrument))
            })
            .collect::<Result<_, CandelaError>>()?;
        Ok(Self { instruments })
    }

    /// Returns the default forex universe.
    ///
    /// # Errors
    ///
    /// Only fails if the scale table is unusable, which the built-in pairs
    /// cannot trigger.
    pub fn forex(scale: &PriceScale) -> Result<Self, CandelaError> {
        Self::new(FOREX_PAIRS, scale)
    }

    /// Looks up an instrument by symbol (case-insensitive).
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.get(&symbol.to_uppercase())
    }

    /// Returns all instruments, ordered by symbol.
    pub fn all(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.values()
    }

    /// Returns the total number of instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Returns true if the universe is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Returns a universe restricted to the given symbols.
    ///
    /// # Errors
    ///
    /// Returns [`CandelaError::UnknownInstrument`] for a symbol outside this
    /// universe.
    pub fn select<S: AsRef<str>>(&self, symbols: &[S]) -> Result<Self, CandelaError> {
        let instruments = symbols
            .iter()
            .map(|symbol| {
                let symbol = symbol.as_ref();
                self.get(symbol)
                    .map(|i| (i.symbol().to_string(), i.clone()))
                    .ok_or_else(|| CandelaError::UnknownInstrument(symbol.to_string()))
            })
            .collect::<Result<_, CandelaError>>()?;
        Ok(Self { instruments })
    }

    /// Returns all symbols sorted alphabetically.
    pub fn symbols(&self) -> Vec<&str> {
        self.instruments.keys().map(String::as_str).collect()
    }
}

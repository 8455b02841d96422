//! The bar store contract.

use candela_types::{Bar, Series};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::Result;

/// What an upsert did to the stored bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// No bar existed for the identity.
    Created,
    /// A bar existed with a different payload and was overwritten.
    Updated,
    /// A bar existed with the same payload.
    Unchanged,
}

/// Counts of upsert outcomes over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Bars created.
    pub created: usize,
    /// Bars overwritten with a new payload.
    pub updated: usize,
    /// Bars already holding the same payload.
    pub unchanged: usize,
}

impl UpsertSummary {
    /// Records one outcome.
    pub const fn record(&mut self, outcome: Upsert) {
        match outcome {
            Upsert::Created => self.created += 1,
            Upsert::Updated => self.updated += 1,
            Upsert::Unchanged => self.unchanged += 1,
        }
    }

    /// Returns the number of bars written.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.created + self.updated + self.unchanged
    }
}

/// A time-ordered read of one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarQuery {
    /// Series to read.
    pub series: Series,
    /// Earliest bar start (inclusive).
    pub from: DateTime<Utc>,
    /// Latest bar start (inclusive).
    pub to: DateTime<Utc>,
    /// Only return bars with `volume > 0`.
    pub trading_only: bool,
}

impl BarQuery {
    /// Creates a query over `[from, to]`, both ends inclusive.
    #[must_use]
    pub const fn new(series: Series, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            series,
            from,
            to,
            trading_only: false,
        }
    }

    /// Restricts the query to bars with genuine trading volume.
    #[must_use]
    pub const fn trading_only(mut self) -> Self {
        self.trading_only = true;
        self
    }

    /// Returns true if a bar start falls inside the query window.
    #[must_use]
    pub fn covers(&self, time: DateTime<Utc>) -> bool {
        time >= self.from && time <= self.to
    }
}

/// Persistent home of bars, keyed by (series, time).
///
/// Implementations must keep at most one bar per identity and apply each
/// bar write as a whole, so concurrent writers to the same identity end with
/// one of the written payloads (last write wins). No ordering or atomicity
/// is promised across different bars.
pub trait BarStore: Send + Sync + std::fmt::Debug {
    /// Creates the bar or overwrites the payload stored under its identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the write could not be persisted.
    fn upsert(&self, bar: &Bar) -> Result<Upsert>;

    /// Upserts every bar of a batch. Each bar is keyed independently; a
    /// failed batch may be retried as a whole.
    ///
    /// # Errors
    ///
    /// Returns the first write failure.
    fn upsert_batch(&self, bars: &[Bar]) -> Result<UpsertSummary> {
        let mut summary = UpsertSummary::default();
        for bar in bars {
            summary.record(self.upsert(bar)?);
        }
        Ok(summary)
    }

    /// Reads the bars of one series inside a time window, ordered by time.
    ///
    /// # Errors
    ///
    /// Returns an error if stored bars could not be read.
    fn query(&self, query: &BarQuery) -> Result<Vec<Bar>>;
}

impl<T: BarStore + ?Sized> BarStore for Arc<T> {
    fn upsert(&self, bar: &Bar) -> Result<Upsert> {
        (**self).upsert(bar)
    }

    fn upsert_batch(&self, bars: &[Bar]) -> Result<UpsertSummary> {
        (**self).upsert_batch(bars)
    }

    fn query(&self, query: &BarQuery) -> Result<Vec<Bar>> {
        (**self).query(query)
    }
}

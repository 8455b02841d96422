//! In-process bar store.

use candela_types::{Bar, Ohlcv, Series};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::{BarQuery, BarStore, Result, StoreError, Upsert, UpsertSummary};

type SeriesBars = BTreeMap<DateTime<Utc>, Ohlcv>;

/// Bar store held entirely in memory.
///
/// Used by tests and by dry runs that should not touch disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    series: RwLock<BTreeMap<Series, SeriesBars>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series
            .read()
            .map(|series| series.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every stored bar ordered by series, then time.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn snapshot(&self) -> Result<Vec<Bar>> {
        let series = self.series.read().map_err(|_| StoreError::Poisoned)?;
        Ok(series
            .iter()
            .flat_map(|(key, bars)| bars.values().map(|ohlcv| Bar::new(key.clone(), *ohlcv)))
            .collect())
    }
}

fn apply(bars: &mut SeriesBars, ohlcv: Ohlcv) -> Upsert {
    match bars.insert(ohlcv.time, ohlcv) {
        None => Upsert::Created,
        Some(previous) if previous == ohlcv => Upsert::Unchanged,
        Some(_) => Upsert::Updated,
    }
}

impl BarStore for MemoryStore {
    fn upsert(&self, bar: &Bar) -> Result<Upsert> {
        let mut series = self.series.write().map_err(|_| StoreError::Poisoned)?;
        let bars = series.entry(bar.series.clone()).or_default();
        Ok(apply(bars, bar.ohlcv))
    }

    fn upsert_batch(&self, bars: &[Bar]) -> Result<UpsertSummary> {
        let mut series = self.series.write().map_err(|_| StoreError::Poisoned)?;
        let mut summary = UpsertSummary::default();
        for bar in bars {
            let stored = series.entry(bar.series.clone()).or_default();
            summary.record(apply(stored, bar.ohlcv));
        }
        Ok(summary)
    }

    fn query(&self, query: &BarQuery) -> Result<Vec<Bar>> {
        if query.from > query.to {
            return Ok(Vec::new());
        }
        let series = self.series.read().map_err(|_| StoreError::Poisoned)?;
        let Some(bars) = series.get(&query.series) else {
            return Ok(Vec::new());
        };
        Ok(bars
            .range(query.from..=query.to)
            .map(|(_, ohlcv)| *ohlcv)
            .filter(|ohlcv| !query.trading_only || ohlcv.is_trading())
            .map(|ohlcv| Bar::new(query.series.clone(), ohlcv))
            .collect())
    }
}

//! Tier fold-up against a bar store.

use candela_store::{BarQuery, BarStore, UpsertSummary};
use candela_types::{Bar, Ohlcv, PeriodChain, Series};
use chrono::NaiveDate;
use tracing::debug;

use crate::{BarResampler, Bucket, Result};

/// What one fold wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOutcome {
    /// Bucket that was folded.
    pub bucket: Bucket,
    /// Source bars read from the store.
    pub source_bars: usize,
    /// Derived bars written.
    pub written: UpsertSummary,
}

impl AggregateOutcome {
    /// Returns true if the bucket held no source bars and nothing was written.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.source_bars == 0
    }
}

/// Derives coarser bars from finer stored bars along a period chain.
#[derive(Debug, Clone, Default)]
pub struct TimeframeAggregator {
    chain: PeriodChain,
}

impl TimeframeAggregator {
    /// Creates an aggregator over a period chain.
    #[must_use]
    pub const fn new(chain: PeriodChain) -> Self {
        Self { chain }
    }

    /// Returns the period chain.
    #[must_use]
    pub const fn chain(&self) -> &PeriodChain {
        &self.chain
    }

    /// Folds the bucket containing `date` for the `target` series.
    ///
    /// Source bars are read from the tier the target is derived from, with
    /// the target's symbol, source tag and quote side. Derived bars inherit
    /// the source tag. An empty bucket writes nothing; a repeated fold
    /// overwrites the previous result.
    ///
    /// # Errors
    ///
    /// Returns an error if the target has no source tier, no bucket can be
    /// formed, or the store fails.
    pub fn aggregate<S: BarStore + ?Sized>(
        &self,
        store: &S,
        target: &Series,
        date: NaiveDate,
    ) -> Result<AggregateOutcome> {
        let source_period = self.chain.source_for(target.period)?;
        let bucket = Bucket::for_period(date, target.period)?;

        let query = BarQuery::new(
            target.with_period(source_period),
            bucket.from(),
            bucket.before(),
        );
        let source: Vec<Ohlcv> = store.query(&query)?.into_iter().map(|bar| bar.ohlcv).collect();

        if source.is_empty() {
            debug!(series = %target, %bucket, "empty bucket");
            return Ok(AggregateOutcome {
                bucket,
                source_bars: 0,
                written: UpsertSummary::default(),
            });
        }

        let derived: Vec<Bar> = BarResampler::new(target.period, bucket)
            .resample(&source)
            .into_iter()
            .map(|ohlcv| Bar::new(target.clone(), ohlcv))
            .collect();
        let written = store.upsert_batch(&derived)?;

        debug!(
            series = %target,
            %bucket,
            source_bars = source.len(),
            derived = derived.len(),
            "bucket folded"
        );

        Ok(AggregateOutcome {
            bucket,
            source_bars: source.len(),
            written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use candela_store::MemoryStore;
    use candela_types::{Period, PriceType, Source};
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(period: Period) -> Series {
        Series::new("EURUSD", period, Source::feed(), PriceType::Bid)
    }

    fn bar(period: Period, time: DateTime<Utc>, open: f64, close: f64, volume: f64) -> Bar {
        let high = open.max(close) + 0.001;
        let low = open.min(close) - 0.001;
        let ohlcv = Ohlcv::new(time, open, high, low, close, volume);
        Bar::new(series(period), ohlcv)
    }

    fn seed_minutes(store: &MemoryStore, day: NaiveDate, count: i64) {
        let start = candela_types::midnight(day) + TimeDelta::hours(9);
        let bars: Vec<Bar> = (0..count)
            .map(|m| bar(Period::Minute1, start + TimeDelta::minutes(m), 1.10, 1.10, 1.0))
            .collect();
        store.upsert_batch(&bars).unwrap();
    }

    fn window(store: &MemoryStore, period: Period, day: NaiveDate) -> Vec<Bar> {
        let from = candela_types::midnight(day);
        store
            .query(&BarQuery::new(series(period), from, from + TimeDelta::days(40)))
            .unwrap()
    }

    #[test]
    fn test_fold_five_minutes_from_store() {
        let store = MemoryStore::new();
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        let opens = [1.10, 1.11, 1.09, 1.12, 1.10];
        let bars: Vec<Bar> = (0_i64..)
            .zip(opens)
            .map(|(i, open)| bar(Period::Minute1, start + TimeDelta::minutes(i), open, open, 2.0))
            .collect();
        store.upsert_batch(&bars).unwrap();

        let aggregator = TimeframeAggregator::default();
        let outcome = aggregator
            .aggregate(&store, &series(Period::Minute5), date(2024, 1, 10))
            .unwrap();
        assert_eq!(outcome.source_bars, 5);
        assert_eq!(outcome.written.created, 1);

        let derived = window(&store, Period::Minute5, date(2024, 1, 10));
        assert_eq!(derived.len(), 1);
        let ohlcv = derived[0].ohlcv;
        assert_eq!(ohlcv.time, start);
        assert_relative_eq!(ohlcv.open, 1.10, epsilon = 1e-12);
        assert_relative_eq!(ohlcv.close, 1.10, epsilon = 1e-12);
        assert_relative_eq!(ohlcv.high, 1.121, epsilon = 1e-12);
        assert_relative_eq!(ohlcv.low, 1.089, epsilon = 1e-12);
        assert_relative_eq!(ohlcv.volume, 10.0, epsilon = 1e-12);
        assert_eq!(derived[0].series.source, Source::feed());
    }

    #[test]
    fn test_refold_overwrites() {
        let store = MemoryStore::new();
        let day = date(2024, 1, 10);
        seed_minutes(&store, day, 3);

        let aggregator = TimeframeAggregator::default();
        aggregator.aggregate(&store, &series(Period::Minute5), day).unwrap();
        let again = aggregator.aggregate(&store, &series(Period::Minute5), day).unwrap();
        assert_eq!(again.written.unchanged, 1);

        seed_minutes(&store, day, 5);
        let grown = aggregator.aggregate(&store, &series(Period::Minute5), day).unwrap();
        assert_eq!(grown.written.updated, 1);

        let derived = window(&store, Period::Minute5, day);
        assert_eq!(derived.len(), 1);
        assert_relative_eq!(derived[0].ohlcv.volume, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fifteen_before_five_writes_nothing() {
        let store = MemoryStore::new();
        let day = date(2024, 1, 10);
        seed_minutes(&store, day, 30);

        let aggregator = TimeframeAggregator::default();
        let outcome = aggregator
            .aggregate(&store, &series(Period::Minute15), day)
            .unwrap();
        assert!(outcome.is_empty());
        assert!(window(&store, Period::Minute15, day).is_empty());
    }

    #[test]
    fn test_empty_bucket_writes_nothing() {
        let store = MemoryStore::new();
        let aggregator = TimeframeAggregator::default();
        let outcome = aggregator
            .aggregate(&store, &series(Period::Hour1), date(2024, 1, 13))
            .unwrap();
        assert!(outcome.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_weekly_from_daily() {
        let store = MemoryStore::new();
        let days: Vec<Bar> = (8..=12)
            .map(|d| {
                let time = candela_types::midnight(date(2024, 1, d));
                bar(Period::Day1, time, 1.0 + f64::from(d) / 100.0, 1.0, 100.0)
            })
            .collect();
        store.upsert_batch(&days).unwrap();

        let aggregator = TimeframeAggregator::default();
        aggregator
            .aggregate(&store, &series(Period::Week1), date(2024, 1, 10))
            .unwrap();

        let weekly = window(&store, Period::Week1, date(2024, 1, 7));
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].time(), candela_types::midnight(date(2024, 1, 7)));
        assert_relative_eq!(weekly[0].ohlcv.open, 1.08, epsilon = 1e-12);
        assert_relative_eq!(weekly[0].ohlcv.volume, 500.0, epsilon = 1e-12);
    }

    #[test]
    fn test_monthly_from_daily_not_weekly() {
        let store = MemoryStore::new();
        let feb: Vec<Bar> = [1, 15, 29]
            .iter()
            .map(|&d| bar(Period::Day1, candela_types::midnight(date(2024, 2, d)), 1.0, 1.0, 10.0))
            .collect();
        store.upsert_batch(&feb).unwrap();
        store
            .upsert(&bar(Period::Day1, candela_types::midnight(date(2024, 3, 1)), 1.0, 1.0, 10.0))
            .unwrap();
        store
            .upsert(&bar(Period::Week1, candela_types::midnight(date(2024, 2, 4)), 1.0, 1.0, 999.0))
            .unwrap();

        let aggregator = TimeframeAggregator::default();
        let outcome = aggregator
            .aggregate(&store, &series(Period::Month1), date(2024, 2, 10))
            .unwrap();
        assert_eq!(outcome.source_bars, 3);

        let monthly = window(&store, Period::Month1, date(2024, 2, 1));
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].time(), candela_types::midnight(date(2024, 2, 1)));
        assert_relative_eq!(monthly[0].ohlcv.volume, 30.0, epsilon = 1e-12);
    }

    #[test]
    fn test_base_period_rejected() {
        let store = MemoryStore::new();
        let aggregator = TimeframeAggregator::default();
        let result = aggregator.aggregate(&store, &series(Period::Minute1), date(2024, 1, 10));
        assert!(result.is_err());
    }
}

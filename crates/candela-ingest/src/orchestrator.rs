//! End-to-end pipeline driver.

use candela_aggregate::{AggregateOutcome, Bucket, TimeframeAggregator};
use candela_fetch::{ArchiveCache, ArchiveFetcher, ArchiveSource, ArchiveStatus, decode_day};
use candela_instruments::InstrumentUniverse;
use candela_store::{BarStore, UpsertSummary};
use candela_types::{Bar, DateRange, Instrument, Period, PeriodChain, PriceType, Series, Source};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::config::unique_price_types;
use crate::{
    ConfigError, FetchError, FoldFailure, IngestConfig, NoProgress, OrchestratorError,
    ProgressObserver, RunReport, TierReport, TupleOutcome, TupleReport,
};

/// Drives base ingestion and tier fold-up over a date range and universe.
///
/// Phase one fetches, decodes and stores every (day, symbol, quote side)
/// tuple on a bounded pool; a gap or failure in one tuple never blocks the
/// others. Phase two folds each derived tier in ascending chain order, the
/// folds of one tier running on the same bounded pool.
#[derive(Debug)]
pub struct IngestionOrchestrator<S, B: ?Sized> {
    fetcher: ArchiveFetcher<S>,
    store: Arc<B>,
    aggregator: Arc<TimeframeAggregator>,
    universe: InstrumentUniverse,
    price_types: Vec<PriceType>,
    source: Source,
    workers: usize,
    store_retries: u32,
    progress: Arc<dyn ProgressObserver>,
}

impl<S, B> IngestionOrchestrator<S, B>
where
    S: ArchiveSource,
    B: BarStore + ?Sized + 'static,
{
    /// Creates an orchestrator with default settings: both quote sides, the
    /// feed source tag, the default period chain, four workers and three
    /// store retries.
    #[must_use]
    pub fn new(fetcher: ArchiveFetcher<S>, store: Arc<B>, universe: InstrumentUniverse) -> Self {
        Self {
            fetcher,
            store,
            aggregator: Arc::new(TimeframeAggregator::default()),
            universe,
            price_types: PriceType::all().to_vec(),
            source: Source::feed(),
            workers: 4,
            store_retries: 3,
            progress: Arc::new(NoProgress),
        }
    }

    /// Creates an orchestrator from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured symbols do not form a universe.
    pub fn from_config(
        config: &IngestConfig,
        source: S,
        store: Arc<B>,
    ) -> Result<Self, ConfigError> {
        let cache = ArchiveCache::new(config.data_root.clone());
        let fetcher = ArchiveFetcher::new(source, cache, config.jitter());
        Ok(Self::new(fetcher, store, config.universe()?)
            .with_price_types(config.price_types.clone())
            .with_source(config.source.clone())
            .with_chain(config.periods.clone())
            .with_workers(config.workers)
            .with_store_retries(config.store_retries))
    }

    /// Sets the quote sides to ingest; repeated sides are ignored.
    #[must_use]
    pub fn with_price_types(mut self, price_types: Vec<PriceType>) -> Self {
        self.price_types = unique_price_types(&price_types);
        self
    }

    /// Sets the provenance tag of feed bars.
    #[must_use]
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    /// Sets the period chain.
    #[must_use]
    pub fn with_chain(mut self, chain: PeriodChain) -> Self {
        self.aggregator = Arc::new(TimeframeAggregator::new(chain));
        self
    }

    /// Sets the worker pool size (at least one).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets how often a failed store write is retried.
    #[must_use]
    pub const fn with_store_retries(mut self, retries: u32) -> Self {
        self.store_retries = retries;
        self
    }

    /// Sets the progress observer.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the bar store.
    #[must_use]
    pub const fn store(&self) -> &Arc<B> {
        &self.store
    }

    /// Returns the period chain.
    #[must_use]
    pub fn chain(&self) -> &PeriodChain {
        self.aggregator.chain()
    }

    /// Returns the instrument universe.
    #[must_use]
    pub const fn universe(&self) -> &InstrumentUniverse {
        &self.universe
    }

    /// Runs both phases over a date range.
    ///
    /// # Errors
    ///
    /// Returns an error only if fold-up cannot start; per-tuple and per-fold
    /// failures are recorded in the report.
    pub async fn run(&self, range: DateRange) -> Result<RunReport, OrchestratorError> {
        let tuples = self.ingest_base(range).await;
        let tiers = self.fold_up(range, self.chain().derived()).await?;
        Ok(RunReport { tuples, tiers })
    }

    /// Phase one: fetches, decodes and stores base bars for every tuple.
    ///
    /// Reports come back ordered by symbol, quote side and day.
    pub async fn ingest_base(&self, range: DateRange) -> Vec<TupleReport> {
        let tuples: Vec<(&Instrument, PriceType, NaiveDate)> = self
            .universe
            .all()
            .flat_map(|instrument| {
                self.price_types.iter().flat_map(move |&price_type| {
                    range.days().map(move |day| (instrument, price_type, day))
                })
            })
            .collect();

        info!(%range, tuples = tuples.len(), workers = self.workers, "base ingestion started");
        self.progress.base_started(tuples.len());

        let mut reports: Vec<TupleReport> = stream::iter(tuples)
            .map(|(instrument, price_type, day)| self.ingest_tuple(instrument, price_type, day))
            .buffer_unordered(self.workers)
            .inspect(|report| self.progress.tuple_done(report))
            .collect()
            .await;

        reports.sort_by(|a, b| {
            (a.symbol.as_str(), a.price_type, a.day).cmp(&(b.symbol.as_str(), b.price_type, b.day))
        });
        reports
    }

    /// Phase two: folds the given tiers over a date range.
    ///
    /// Tiers run strictly one after another; each fold reads the tier it is
    /// derived from, so tiers must be requested in ascending chain order.
    ///
    /// # Errors
    ///
    /// Returns an error if a tier is not a derived tier of the chain or the
    /// tiers are out of order.
    pub async fn fold_up(
        &self,
        range: DateRange,
        tiers: &[Period],
    ) -> Result<Vec<TierReport>, OrchestratorError> {
        self.check_tiers(tiers)?;

        let mut reports = Vec::with_capacity(tiers.len());
        for &period in tiers {
            reports.push(self.fold_tier(range, period).await?);
        }
        Ok(reports)
    }

    fn check_tiers(&self, tiers: &[Period]) -> Result<(), OrchestratorError> {
        if let Some(&unknown) = tiers.iter().find(|&&p| !self.chain().derived().contains(&p)) {
            return Err(OrchestratorError::UnknownTier(unknown));
        }
        if let Some(pair) = tiers.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(OrchestratorError::TierOrder {
                tier: pair[1],
                after: pair[0],
            });
        }
        Ok(())
    }

    async fn ingest_tuple(
        &self,
        instrument: &Instrument,
        price_type: PriceType,
        day: NaiveDate,
    ) -> TupleReport {
        let symbol = instrument.symbol();
        let outcome = match self.ingest_archive(instrument, price_type, day).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(symbol, %price_type, %day, error = %e, "tuple failed");
                TupleOutcome::Failed(e.to_string())
            }
        };

        TupleReport {
            symbol: symbol.to_string(),
            price_type,
            day,
            outcome,
        }
    }

    async fn ingest_archive(
        &self,
        instrument: &Instrument,
        price_type: PriceType,
        day: NaiveDate,
    ) -> Result<TupleOutcome, FetchError> {
        let symbol = instrument.symbol();
        let (path, cached) = match self.fetcher.fetch(symbol, price_type, day).await? {
            ArchiveStatus::Cached(path) => (path, true),
            ArchiveStatus::Fetched(path) => (path, false),
            ArchiveStatus::Unavailable(reason) => {
                debug!(symbol, %price_type, %day, reason = %reason, "gap");
                return Ok(TupleOutcome::Gap(reason));
            }
        };

        let compressed = ArchiveCache::read(&path).await?;
        let factor = instrument.decimal_factor_f64();
        let decoded =
            tokio::task::spawn_blocking(move || decode_day(&compressed, day, factor)).await??;

        let series = Series::new(symbol, self.chain().base(), self.source.clone(), price_type);
        let bars: Vec<Bar> = decoded
            .bars()
            .map(|ohlcv| Bar::new(series.clone(), ohlcv))
            .collect();
        let count = bars.len();

        let bars = Arc::new(bars);
        let store = Arc::clone(&self.store);
        let written: UpsertSummary = self
            .with_store_retries_blocking(&series, move || store.upsert_batch(&bars))
            .await??;

        debug!(
            symbol,
            %price_type,
            %day,
            bars = count,
            created = written.created,
            cached,
            "base bars stored"
        );
        Ok(TupleOutcome::Ok {
            bars: count,
            cached,
        })
    }

    async fn fold_tier(
        &self,
        range: DateRange,
        period: Period,
    ) -> Result<TierReport, OrchestratorError> {
        // Weekly and monthly tiers fold each bucket once, however many
        // days of the range fall inside it.
        let mut buckets = BTreeSet::new();
        for day in range.days() {
            buckets.insert(Bucket::for_period(day, period)?.start_date());
        }
        let days = &buckets;

        let jobs: Vec<(Series, NaiveDate)> = self
            .universe
            .all()
            .flat_map(|instrument| {
                self.price_types.iter().flat_map(move |&price_type| {
                    let series =
                        Series::new(instrument.symbol(), period, self.source.clone(), price_type);
                    days.iter().map(move |&day| (series.clone(), day))
                })
            })
            .collect();

        info!(%period, folds = jobs.len(), "tier fold started");
        self.progress.tier_started(period, jobs.len());

        let outcomes: Vec<(Series, NaiveDate, Result<AggregateOutcome, String>)> =
            stream::iter(jobs)
                .map(|(series, day)| async move {
                    let result = self.fold_one(series.clone(), day).await;
                    (series, day, result)
                })
                .buffer_unordered(self.workers)
                .inspect(|_| self.progress.fold_done(period))
                .collect()
                .await;

        let mut report = TierReport::new(period);
        for (series, day, result) in outcomes {
            match result {
                Ok(outcome) if outcome.is_empty() => report.empty += 1,
                Ok(outcome) => {
                    report.folded += 1;
                    report.bars += outcome.written.total();
                }
                Err(reason) => {
                    warn!(series = %series, %day, reason = %reason, "fold failed");
                    report.failures.push(FoldFailure {
                        symbol: series.symbol,
                        price_type: series.price_type,
                        day,
                        reason,
                    });
                }
            }
        }
        report.failures.sort_by(|a, b| {
            (a.symbol.as_str(), a.price_type, a.day).cmp(&(b.symbol.as_str(), b.price_type, b.day))
        });

        info!(
            %period,
            folded = report.folded,
            empty = report.empty,
            bars = report.bars,
            "tier fold finished"
        );
        self.progress.tier_done(period);
        Ok(report)
    }

    async fn fold_one(&self, series: Series, day: NaiveDate) -> Result<AggregateOutcome, String> {
        let store = Arc::clone(&self.store);
        let aggregator = Arc::clone(&self.aggregator);
        let target = series.clone();
        match self
            .with_store_retries_blocking(&series, move || {
                aggregator.aggregate(store.as_ref(), &target, day)
            })
            .await
        {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Runs a store-touching operation on the blocking pool, retrying it as a
    /// whole while it fails. Each bar is keyed independently, so a retried
    /// batch converges on the same state.
    async fn with_store_retries_blocking<T, E, F>(
        &self,
        series: &Series,
        op: F,
    ) -> Result<Result<T, E>, JoinError>
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let op = Arc::new(op);
        let mut attempt = 0;
        loop {
            let task = Arc::clone(&op);
            match tokio::task::spawn_blocking(move || (*task)()).await? {
                Ok(value) => return Ok(Ok(value)),
                Err(e) if attempt < self.store_retries => {
                    attempt += 1;
                    warn!(series = %series, attempt, error = %e, "store write failed, retrying");
                    tokio::time::sleep(store_backoff(attempt)).await;
                }
                Err(e) => return Ok(Err(e)),
            }
        }
    }
}

fn store_backoff(attempt: u32) -> Duration {
    Duration::from_millis(50u64.saturating_mul(1 << attempt.min(6)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use bytes::Bytes;
    use candela_fetch::{DownloadError, Jitter, encode_bar};
    use candela_store::{BarQuery, MemoryStore, StoreError, Upsert};
    use candela_types::{PriceScale, RawBar, midnight};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use tempfile::TempDir;

    type Key = (String, PriceType, NaiveDate);

    #[derive(Debug, Default)]
    struct FakeFeed {
        archives: HashMap<Key, Bytes>,
        requests: AtomicUsize,
    }

    impl FakeFeed {
        fn publish(&mut self, symbol: &str, price_type: PriceType, day: NaiveDate, archive: Bytes) {
            self.archives.insert((symbol.to_string(), price_type, day), archive);
        }
    }

    #[async_trait]
    impl ArchiveSource for FakeFeed {
        async fn fetch(
            &self,
            symbol: &str,
            price_type: PriceType,
            day: NaiveDate,
        ) -> Result<Option<Bytes>, DownloadError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(self.archives.get(&(symbol.to_string(), price_type, day)).cloned())
        }
    }

    /// Store that fails the first `failures` batch writes.
    #[derive(Debug)]
    struct FlakyStore {
        inner: MemoryStore,
        failures: AtomicU32,
    }

    impl BarStore for FlakyStore {
        fn upsert(&self, bar: &Bar) -> candela_store::Result<Upsert> {
            self.inner.upsert(bar)
        }

        fn upsert_batch(&self, bars: &[Bar]) -> candela_store::Result<UpsertSummary> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::Poisoned);
            }
            self.inner.upsert_batch(bars)
        }

        fn query(&self, query: &BarQuery) -> candela_store::Result<Vec<Bar>> {
            self.inner.query(query)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Ten minute bars from 09:00, price stepping up one pip per minute.
    fn archive(base: i32) -> Bytes {
        let payload: Vec<u8> = (0..10)
            .map(|i| {
                let open = base + i;
                RawBar::new(9 * 3600 + 60 * i, open, open + 5, open - 3, open + 8, 2.0)
            })
            .flat_map(|bar| encode_bar(&bar))
            .collect();
        let mut compressed = Vec::new();
        lzma_rs::lzma_compress(&mut Cursor::new(payload), &mut compressed).unwrap();
        Bytes::from(compressed)
    }

    /// EURUSD bid published Monday to Friday of the week of 2024-01-08.
    fn weekday_feed() -> FakeFeed {
        let mut feed = FakeFeed::default();
        for d in 8..=12 {
            feed.publish("EURUSD", PriceType::Bid, date(2024, 1, d), archive(110_000));
        }
        feed
    }

    fn universe() -> InstrumentUniverse {
        InstrumentUniverse::new(["EURUSD"], &PriceScale::default()).unwrap()
    }

    fn orchestrator<B: BarStore + 'static>(
        feed: FakeFeed,
        cache: &TempDir,
        store: Arc<B>,
    ) -> IngestionOrchestrator<FakeFeed, B> {
        let fetcher = ArchiveFetcher::new(
            feed,
            ArchiveCache::new(cache.path().to_path_buf()),
            Jitter::none(),
        );
        IngestionOrchestrator::new(fetcher, store, universe())
            .with_price_types(vec![PriceType::Bid])
            .with_store_retries(2)
    }

    fn week() -> DateRange {
        DateRange::new(date(2024, 1, 8), date(2024, 1, 13)).unwrap()
    }

    fn series(period: Period) -> Series {
        Series::new("EURUSD", period, Source::feed(), PriceType::Bid)
    }

    fn read(store: &MemoryStore, period: Period) -> Vec<Bar> {
        let from = midnight(date(2024, 1, 1));
        let to = midnight(date(2024, 2, 1));
        store.query(&BarQuery::new(series(period), from, to)).unwrap()
    }

    #[tokio::test]
    async fn test_full_run_builds_every_tier() {
        let cache = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let pipeline = orchestrator(weekday_feed(), &cache, Arc::clone(&store));

        let report = pipeline.run(week()).await.unwrap();

        assert_eq!(report.ok_count(), 5);
        assert_eq!(report.gap_count(), 1);
        assert_eq!(report.failed_count(), 0);
        assert_eq!(report.base_bars(), 50);
        assert_eq!(report.tiers.len(), 8);
        assert!(report.is_clean());

        assert_eq!(read(&store, Period::Minute1).len(), 50);
        assert_eq!(read(&store, Period::Minute5).len(), 10);
        assert_eq!(read(&store, Period::Hour1).len(), 5);
        assert_eq!(read(&store, Period::Day1).len(), 5);

        let weekly = read(&store, Period::Week1);
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].time(), midnight(date(2024, 1, 7)));
        assert_relative_eq!(weekly[0].ohlcv.volume, 100.0, epsilon = 1e-9);

        let monthly = read(&store, Period::Month1);
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].time(), midnight(date(2024, 1, 1)));
        assert_relative_eq!(monthly[0].ohlcv.open, 1.1, epsilon = 1e-9);
        assert_relative_eq!(monthly[0].ohlcv.high, 1.10017, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_saturday_is_a_gap_without_phantom_bars() {
        let cache = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let pipeline = orchestrator(weekday_feed(), &cache, Arc::clone(&store));

        let report = pipeline.run(week()).await.unwrap();
        let saturday = report
            .tuples
            .iter()
            .find(|tuple| tuple.day == date(2024, 1, 13))
            .unwrap();
        assert!(matches!(saturday.outcome, TupleOutcome::Gap(_)));

        let day_bars = read(&store, Period::Day1);
        assert!(day_bars.iter().all(|bar| bar.time() != midnight(date(2024, 1, 13))));
        let hours = read(&store, Period::Hour1);
        assert!(hours.iter().all(|bar| bar.time().date_naive() != date(2024, 1, 13)));
    }

    #[tokio::test]
    async fn test_second_run_is_identical_and_uses_cache() {
        let cache = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let pipeline = orchestrator(weekday_feed(), &cache, Arc::clone(&store));

        pipeline.run(week()).await.unwrap();
        let first = store.snapshot().unwrap();

        let report = pipeline.run(week()).await.unwrap();
        let second = store.snapshot().unwrap();

        assert_eq!(first, second);
        assert!(report.tuples.iter().all(|tuple| !matches!(
            tuple.outcome,
            TupleOutcome::Ok { cached: false, .. }
        )));
    }

    #[tokio::test]
    async fn test_malformed_archive_fails_only_its_tuple() {
        let cache = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let mut feed = weekday_feed();
        feed.publish(
            "EURUSD",
            PriceType::Bid,
            date(2024, 1, 10),
            Bytes::from_static(&[0x00, 0x01, 0x02, 0x03]),
        );
        let pipeline = orchestrator(feed, &cache, Arc::clone(&store));

        let report = pipeline.run(week()).await.unwrap();

        assert_eq!(report.ok_count(), 4);
        assert_eq!(report.failed_count(), 1);
        let failed = report.failures().next().unwrap();
        assert_eq!(failed.day, date(2024, 1, 10));
        assert!(read(&store, Period::Minute1)
            .iter()
            .all(|bar| bar.time().date_naive() != date(2024, 1, 10)));
        assert_eq!(read(&store, Period::Day1).len(), 4);
    }

    #[tokio::test]
    async fn test_repeated_price_types_run_each_tuple_once() {
        let cache = TempDir::new().unwrap();
        let pipeline = orchestrator(weekday_feed(), &cache, Arc::new(MemoryStore::new()))
            .with_price_types(vec![PriceType::Bid, PriceType::Bid]);

        let tuples = pipeline.ingest_base(week()).await;

        assert_eq!(tuples.len(), 6);
        assert!(tuples.iter().all(|tuple| !matches!(tuple.outcome, TupleOutcome::Failed(_))));
    }

    #[tokio::test]
    async fn test_tiers_must_ascend() {
        let cache = TempDir::new().unwrap();
        let pipeline = orchestrator(FakeFeed::default(), &cache, Arc::new(MemoryStore::new()));

        let err = pipeline
            .fold_up(week(), &[Period::Minute15, Period::Minute5])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::TierOrder {
                tier: Period::Minute5,
                after: Period::Minute15
            }
        ));

        let err = pipeline.fold_up(week(), &[Period::Minute1]).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownTier(Period::Minute1)));
    }

    #[tokio::test]
    async fn test_store_failures_are_retried() {
        let cache = TempDir::new().unwrap();
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            failures: AtomicU32::new(2),
        });
        let pipeline = orchestrator(weekday_feed(), &cache, Arc::clone(&store));

        let range = DateRange::single_day(date(2024, 1, 8));
        let tuples = pipeline.ingest_base(range).await;

        assert!(matches!(tuples[0].outcome, TupleOutcome::Ok { bars: 10, .. }));
        assert_eq!(store.inner.len(), 10);
    }

    #[tokio::test]
    async fn test_store_failure_exhausts_retries() {
        let cache = TempDir::new().unwrap();
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            failures: AtomicU32::new(10),
        });
        let pipeline = orchestrator(weekday_feed(), &cache, Arc::clone(&store));

        let tuples = pipeline
            .ingest_base(DateRange::single_day(date(2024, 1, 8)))
            .await;
        assert!(matches!(tuples[0].outcome, TupleOutcome::Failed(_)));
        assert!(store.inner.is_empty());
    }

    #[derive(Debug, Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ProgressObserver for Recorder {
        fn base_started(&self, tuples: usize) {
            self.events.lock().unwrap().push(format!("base {tuples}"));
        }

        fn tier_started(&self, period: Period, folds: usize) {
            self.events.lock().unwrap().push(format!("{period} {folds}"));
        }
    }

    #[tokio::test]
    async fn test_weekly_folds_once_per_bucket() {
        let cache = TempDir::new().unwrap();
        let recorder = Arc::new(Recorder::default());
        let pipeline = orchestrator(weekday_feed(), &cache, Arc::new(MemoryStore::new()))
            .with_progress(recorder.clone());

        pipeline.run(week()).await.unwrap();

        let events = recorder.events.lock().unwrap();
        assert_eq!(events[0], "base 6");
        for expected in ["M5 6", "W1 1", "MN 1"] {
            assert!(events.iter().any(|event| event == expected), "missing {expected}");
        }
    }
}

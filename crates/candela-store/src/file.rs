//! JSON partition store on the local filesystem.

use candela_types::{Bar, Ohlcv, Series};
use chrono::{DateTime, Datelike, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::{BarQuery, BarStore, Result, StoreError, Upsert, UpsertSummary};

type SeriesBars = BTreeMap<DateTime<Utc>, Ohlcv>;

/// Partitions kept in memory when no capacity is given.
const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Distinguishes temporary files written by one process.
static WRITE_NONCE: AtomicU64 = AtomicU64::new(0);

/// One series' bars for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PartitionKey {
    series: Series,
    year: i32,
    month: u32,
}

impl PartitionKey {
    fn of(series: &Series, time: DateTime<Utc>) -> Self {
        Self {
            series: series.clone(),
            year: time.year(),
            month: time.month(),
        }
    }

    const fn next(&self) -> (i32, u32) {
        if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        }
    }
}

/// Recently used partitions, oldest evicted first.
///
/// Every cached partition matches its file on disk, so eviction never loses
/// data.
#[derive(Debug)]
struct PartitionCache {
    entries: HashMap<PartitionKey, SeriesBars>,
    order: VecDeque<PartitionKey>,
    capacity: usize,
}

impl PartitionCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn get(&mut self, key: &PartitionKey) -> Option<&SeriesBars> {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
        self.entries.get(key)
    }

    fn insert(&mut self, key: PartitionKey, bars: SeriesBars) {
        if self.entries.insert(key.clone(), bars).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}

/// Bar store persisting each (series, month) as one JSON file.
///
/// Partitions live at
/// `{root}/{source}/{SYMBOL}/{SIDE}/{PERIOD}/{YYYY-MM}.json` and hold the
/// month's bars as a compact array ordered by time. The source and symbol
/// components are percent-encoded, so distinct tags never share a directory
/// and no component can step outside the root. Writes go to a temporary file
/// that is renamed into place, so a partition on disk is always complete.
/// All access is serialized by a single store-wide lock; at most a bounded
/// number of recently used partitions stay in memory.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    partitions: Mutex<PartitionCache>,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn open(root: PathBuf) -> Result<Self> {
        Self::with_cache_capacity(root, DEFAULT_CACHE_CAPACITY)
    }

    /// Opens a store that keeps at most `capacity` partitions in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn with_cache_capacity(root: PathBuf, capacity: usize) -> Result<Self> {
        fs::create_dir_all(&root).map_err(|e| StoreError::CreateDir {
            path: root.clone(),
            source: e,
        })?;
        Ok(Self {
            root,
            partitions: Mutex::new(PartitionCache::new(capacity)),
        })
    }

    /// Returns the store root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the number of partitions currently held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn cached_partitions(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, PartitionCache>> {
        self.partitions.lock().map_err(|_| StoreError::Poisoned)
    }

    fn partition_path(&self, key: &PartitionKey) -> PathBuf {
        self.root
            .join(encode_component(key.series.source.as_str()))
            .join(encode_component(&key.series.symbol))
            .join(key.series.price_type.as_str())
            .join(key.series.period.as_str())
            .join(format!("{:04}-{:02}.json", key.year, key.month))
    }

    fn load(&self, key: &PartitionKey) -> Result<SeriesBars> {
        let path = self.partition_path(key);
        if !path.exists() {
            return Ok(SeriesBars::new());
        }

        let content = fs::read_to_string(&path).map_err(|e| StoreError::ReadFile {
            path: path.clone(),
            source: e,
        })?;
        let bars: Vec<Ohlcv> = serde_json::from_str(&content)
            .map_err(|e| StoreError::ParseJson { path, source: e })?;

        Ok(bars.into_iter().map(|ohlcv| (ohlcv.time, ohlcv)).collect())
    }

    fn persist(&self, key: &PartitionKey, bars: &SeriesBars) -> Result<()> {
        let path = self.partition_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let ordered: Vec<&Ohlcv> = bars.values().collect();
        let content = serde_json::to_vec(&ordered)?;

        let nonce = WRITE_NONCE.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.{}.{nonce}.tmp", std::process::id()));
        fs::write(&tmp, content).map_err(|e| StoreError::WriteFile {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        debug!(path = %path.display(), bars = bars.len(), "partition written");
        Ok(())
    }

    /// Returns a partition, reading it from disk on a cache miss.
    fn partition(&self, cache: &mut PartitionCache, key: &PartitionKey) -> Result<SeriesBars> {
        if let Some(bars) = cache.get(key) {
            return Ok(bars.clone());
        }
        let loaded = self.load(key)?;
        cache.insert(key.clone(), loaded.clone());
        Ok(loaded)
    }
}

/// Percent-encodes a tag into a single path component.
///
/// ASCII letters, digits, `-` and `_` pass through; every other byte becomes
/// `%XX`. The empty tag encodes as a lone `%`, which no other tag produces.
fn encode_component(tag: &str) -> String {
    if tag.is_empty() {
        return "%".to_string();
    }
    let mut encoded = String::with_capacity(tag.len());
    for byte in tag.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

impl BarStore for FileStore {
    fn upsert(&self, bar: &Bar) -> Result<Upsert> {
        let summary = self.upsert_batch(std::slice::from_ref(bar))?;
        Ok(if summary.created > 0 {
            Upsert::Created
        } else if summary.updated > 0 {
            Upsert::Updated
        } else {
            Upsert::Unchanged
        })
    }

    fn upsert_batch(&self, bars: &[Bar]) -> Result<UpsertSummary> {
        let mut grouped: HashMap<PartitionKey, Vec<Ohlcv>> = HashMap::new();
        for bar in bars {
            grouped
                .entry(PartitionKey::of(&bar.series, bar.time()))
                .or_default()
                .push(bar.ohlcv);
        }

        let mut cache = self.lock()?;
        let mut summary = UpsertSummary::default();

        for (key, incoming) in grouped {
            let mut staged = self.partition(&mut cache, &key)?;
            let mut dirty = false;

            for ohlcv in incoming {
                let outcome = match staged.insert(ohlcv.time, ohlcv) {
                    None => Upsert::Created,
                    Some(previous) if previous == ohlcv => Upsert::Unchanged,
                    Some(_) => Upsert::Updated,
                };
                dirty |= outcome != Upsert::Unchanged;
                summary.record(outcome);
            }

            if dirty {
                self.persist(&key, &staged)?;
                cache.insert(key, staged);
            }
        }

        Ok(summary)
    }

    fn query(&self, query: &BarQuery) -> Result<Vec<Bar>> {
        if query.from > query.to {
            return Ok(Vec::new());
        }

        let mut cache = self.lock()?;
        let last = PartitionKey::of(&query.series, query.to);
        let mut key = PartitionKey::of(&query.series, query.from);
        let mut bars = Vec::new();

        loop {
            let partition = self.partition(&mut cache, &key)?;
            bars.extend(
                partition
                    .range(query.from..=query.to)
                    .map(|(_, ohlcv)| *ohlcv)
                    .filter(|ohlcv| !query.trading_only || ohlcv.is_trading())
                    .map(|ohlcv| Bar::new(query.series.clone(), ohlcv)),
            );

            if key == last {
                break;
            }
            let (year, month) = key.next();
            key.year = year;
            key.month = month;
        }

        Ok(bars)
    }
}

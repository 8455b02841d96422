//! Cache-first archive retrieval.

use candela_types::PriceType;
use chrono::NaiveDate;
use rand::Rng;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{ArchiveCache, ArchiveSource, CacheError};

/// Random delay applied before every remote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    min: Duration,
    max: Duration,
}

impl Jitter {
    /// Creates a jitter window; bounds are swapped if given in reverse.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// No delay at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Draws one delay from the window.
    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.max.is_zero() || self.min == self.max {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::new(Duration::from_millis(250), Duration::from_millis(1000))
    }
}

/// Where an archive came from, or why there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveStatus {
    /// Already cached; no request was made.
    Cached(PathBuf),
    /// Fetched from the source and written to the cache.
    Fetched(PathBuf),
    /// The source has no archive for the tuple or could not be reached.
    /// Nothing was cached.
    Unavailable(String),
}

impl ArchiveStatus {
    /// Returns the cached path, if any.
    #[must_use]
    pub const fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Cached(path) | Self::Fetched(path) => Some(path),
            Self::Unavailable(_) => None,
        }
    }
}

/// Returns the local path of a day's archive, fetching it on a cache miss.
#[derive(Debug)]
pub struct ArchiveFetcher<S> {
    source: S,
    cache: ArchiveCache,
    jitter: Jitter,
}

impl<S: ArchiveSource> ArchiveFetcher<S> {
    /// Creates a fetcher over a source and a cache.
    #[must_use]
    pub const fn new(source: S, cache: ArchiveCache, jitter: Jitter) -> Self {
        Self {
            source,
            cache,
            jitter,
        }
    }

    /// Returns the underlying cache.
    #[must_use]
    pub const fn cache(&self) -> &ArchiveCache {
        &self.cache
    }

    /// Ensures the archive for a tuple is cached.
    ///
    /// A cache hit returns immediately without touching the source. On a miss
    /// one request is issued after a random jitter delay; a missing or failed
    /// response yields [`ArchiveStatus::Unavailable`] and caches nothing.
    ///
    /// # Errors
    ///
    /// Returns an error only for local cache I/O failures.
    pub async fn fetch(
        &self,
        symbol: &str,
        price_type: PriceType,
        day: NaiveDate,
    ) -> Result<ArchiveStatus, CacheError> {
        if let Some(path) = self.cache.lookup(symbol, price_type, day).await? {
            debug!(symbol, %price_type, %day, path = %path.display(), "archive cache hit");
            return Ok(ArchiveStatus::Cached(path));
        }

        tokio::time::sleep(self.jitter.sample()).await;

        match self.source.fetch(symbol, price_type, day).await {
            Ok(Some(bytes)) => {
                let path = self.cache.store(symbol, price_type, day, &bytes).await?;
                debug!(symbol, %price_type, %day, bytes = bytes.len(), "archive fetched");
                Ok(ArchiveStatus::Fetched(path))
            }
            Ok(None) => {
                debug!(symbol, %price_type, %day, "no archive published");
                Ok(ArchiveStatus::Unavailable("not published".to_string()))
            }
            Err(e) => {
                warn!(symbol, %price_type, %day, error = %e, "archive fetch failed");
                Ok(ArchiveStatus::Unavailable(e.to_string()))
            }
        }
    }
}

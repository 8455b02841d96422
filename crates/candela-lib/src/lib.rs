//! Candle ingestion and fold-up library for Dukascopy-style minute archives.
//!
//! This is a facade crate that re-exports functionality from the candela
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use candela_lib::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = IngestConfig::default();
//!     let client = DownloadClient::new(config.client_config())?;
//!     let source = HttpSource::new(client, config.base_url.clone());
//!     let store = Arc::new(FileStore::open(config.store_root.clone())?);
//!
//!     let orchestrator = IngestionOrchestrator::from_config(&config, source, store)?;
//!     let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
//!     let report = orchestrator.run(DateRange::single_day(day)).await?;
//!     println!("{report}");
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use candela_types::*;

// Re-export the instrument universe
pub use candela_instruments::{FOREX_PAIRS, InstrumentUniverse};

// Re-export bar stores
pub use candela_store::{
    BarQuery, BarStore, FileStore, MemoryStore, StoreError, Upsert, UpsertSummary,
};

// Re-export fetch functionality
#[cfg(feature = "fetch")]
pub use candela_fetch::{
    ArchiveCache, ArchiveFetcher, ArchiveSource, ArchiveStatus, CacheError, ClientConfig,
    DecodeError, DecodedDay, DecompressError, DownloadClient, DownloadError, HttpSource, Jitter,
    ParseError, decode_day,
};

// Re-export aggregation
#[cfg(feature = "aggregate")]
pub use candela_aggregate::{
    AggregateError, AggregateOutcome, BarResampler, Bucket, BucketKind, TimeframeAggregator,
};

// Re-export formatters
#[cfg(feature = "format")]
pub use candela_format::{
    CsvFormatter, FormatError, Formatter, JsonFormatter, OutputFormat, export_file_name,
    write_bars,
};

// Re-export orchestration
#[cfg(feature = "ingest")]
pub use candela_ingest::{
    ConfigError, FetchError, IngestConfig, IngestionOrchestrator, NoProgress,
    OrchestratorError, ProgressObserver, RunReport, TierReport, TupleOutcome, TupleReport,
};

/// Prelude module for convenient imports.
///
/// ```
/// use candela_lib::prelude::*;
/// ```
pub mod prelude {
    pub use candela_types::{
        Bar, CandelaError, DateRange, Instrument, Ohlcv, Period, PeriodChain, PriceType, Result,
        Series, Source,
    };

    pub use candela_instruments::InstrumentUniverse;

    pub use candela_store::{BarQuery, BarStore, FileStore, MemoryStore};

    #[cfg(feature = "fetch")]
    pub use candela_fetch::{ClientConfig, DownloadClient, HttpSource};

    #[cfg(feature = "aggregate")]
    pub use candela_aggregate::TimeframeAggregator;

    #[cfg(feature = "format")]
    pub use candela_format::{CsvFormatter, Formatter, JsonFormatter, OutputFormat};

    #[cfg(feature = "ingest")]
    pub use candela_ingest::{IngestConfig, IngestionOrchestrator, RunReport};
}

//! Configuration and run orchestration for the candela candle pipeline.
//!
//! - [`IngestConfig`] - TOML configuration with defaults and validation
//! - [`IngestionOrchestrator`] - Base ingestion on a bounded pool, then
//!   sequential tier fold-up
//! - [`RunReport`] - Per-tuple ok / gap / failed outcomes and per-tier counts

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod orchestrator;
mod progress;
mod report;

pub use config::{ConfigError, IngestConfig};
pub use error::{FetchError, OrchestratorError};
pub use orchestrator::IngestionOrchestrator;
pub use progress::{NoProgress, ProgressObserver};
pub use report::{FoldFailure, RunReport, TierReport, TupleOutcome, TupleReport};

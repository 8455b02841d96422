//! Orchestration error types.

use candela_aggregate::AggregateError;
use candela_fetch::{CacheError, DecodeError};
use candela_store::StoreError;
use candela_types::Period;
use thiserror::Error;

/// Why a base-ingestion tuple failed. Recorded in the run report, never
/// fatal to a run.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The archive cache could not be read or written.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The archive is corrupt.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Bars could not be stored after every retry.
    #[error("store write failed: {0}")]
    Store(#[from] StoreError),

    /// A blocking worker panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors that stop a run before it starts work.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// A requested tier is not a derived period of the chain.
    #[error("{0} is not a derived tier of the period chain")]
    UnknownTier(Period),

    /// Requested tiers are not in ascending chain order.
    #[error("tier {tier} requested after {after}; tiers must run in ascending order")]
    TierOrder {
        /// The out-of-order tier.
        tier: Period,
        /// The tier it followed.
        after: Period,
    },

    /// No bucket could be formed for the range.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

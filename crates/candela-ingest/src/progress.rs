//! Progress notifications.

use candela_types::Period;

use crate::TupleReport;

/// Receives progress notifications during a run.
///
/// Every method has an empty default, so observers implement only what they
/// display.
pub trait ProgressObserver: Send + Sync + std::fmt::Debug {
    /// Base ingestion is about to process `tuples` tuples.
    fn base_started(&self, _tuples: usize) {}

    /// One base tuple finished.
    fn tuple_done(&self, _report: &TupleReport) {}

    /// A tier is about to fold `folds` buckets.
    fn tier_started(&self, _period: Period, _folds: usize) {}

    /// One fold of a tier finished.
    fn fold_done(&self, _period: Period) {}

    /// A tier finished.
    fn tier_done(&self, _period: Period) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

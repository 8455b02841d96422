//! Calendar-aligned OHLCV fold-up for the candela candle pipeline.
//!
//! - [`Bucket`] - Day, Sunday-start week and calendar month intervals
//! - [`BarResampler`] - Streaming fold of finer bars into coarser ones
//! - [`TimeframeAggregator`] - Reads a source tier from a store and upserts
//!   the derived tier

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod aggregator;
mod bucket;
mod error;
mod resample;

pub use aggregator::{AggregateOutcome, TimeframeAggregator};
pub use bucket::{Bucket, BucketKind};
pub use error::{AggregateError, Result};
pub use resample::BarResampler;

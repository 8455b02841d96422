//! Bar persistence for the candela candle pipeline.
//!
//! - [`BarStore`] - Upsert-by-identity and ordered range reads
//! - [`MemoryStore`] - In-process store
//! - [`FileStore`] - JSON partitions on disk, one file per series and month

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{BarQuery, BarStore, Upsert, UpsertSummary};

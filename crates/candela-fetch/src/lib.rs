//! Archive retrieval and decoding for the candela candle pipeline.
//!
//! This crate turns a (symbol, quote side, day) tuple into minute bars:
//!
//! - [`url::candle_url`] - Constructs Dukascopy candle archive URLs
//! - [`DownloadClient`] - HTTP client with connection pooling and retries
//! - [`ArchiveSource`] / [`HttpSource`] - Where archives come from
//! - [`ArchiveCache`] - Write-once on-disk archive cache
//! - [`ArchiveFetcher`] - Cache-first retrieval with request jitter
//! - [`decompress_bi5`] - LZMA / XZ decompression
//! - [`parse_bars`] - Fixed 24-byte record parsing
//! - [`decode_day`] - Archive bytes to a restartable sequence of minute bars

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cache;
mod client;
mod decode;
mod decompress;
mod fetcher;
mod parse;
mod source;
#[cfg(test)]
mod test_server;
pub mod url;

pub use cache::{ArchiveCache, CacheError};
pub use client::{ClientConfig, DownloadClient, DownloadError};
pub use decode::{DecodeError, DecodedDay, decode_day};
pub use decompress::{CompressionFormat, DecompressError, decompress_bi5};
pub use fetcher::{ArchiveFetcher, ArchiveStatus, Jitter};
pub use parse::{ParseError, bar_count, encode_bar, parse_bars};
pub use source::{ArchiveSource, HttpSource};

//! Write-once on-disk archive cache.

use candela_types::PriceType;
use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::fs;

/// Keeps concurrent writers of the same archive on separate `.part` files.
static PART_NONCE: AtomicU64 = AtomicU64::new(0);

/// Errors that can occur while reading or writing cached archives.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to create a directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Deterministic on-disk cache of raw archives.
///
/// Archives live at `{root}/{SYMBOL}/{YEAR}/{SIDE}/{MM}_{DD}.bi5`. A file's
/// presence is the only cache-hit signal and cached files are never
/// rewritten.
#[derive(Debug, Clone)]
pub struct ArchiveCache {
    root: PathBuf,
}

impl ArchiveCache {
    /// Creates a cache rooted at the given directory.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the cache root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path an archive is cached at.
    #[must_use]
    pub fn path_for(&self, symbol: &str, price_type: PriceType, day: NaiveDate) -> PathBuf {
        self.root
            .join(symbol.to_uppercase())
            .join(day.year().to_string())
            .join(price_type.as_str())
            .join(format!("{:02}_{:02}.bi5", day.month(), day.day()))
    }

    /// Returns the cached path if the archive is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file system cannot be queried.
    pub async fn lookup(
        &self,
        symbol: &str,
        price_type: PriceType,
        day: NaiveDate,
    ) -> Result<Option<PathBuf>, CacheError> {
        let path = self.path_for(symbol, price_type, day);
        match fs::try_exists(&path).await {
            Ok(true) => Ok(Some(path)),
            Ok(false) => Ok(None),
            Err(source) => Err(CacheError::ReadFile { path, source }),
        }
    }

    /// Stores an archive unless one is already cached, returning its path.
    ///
    /// The bytes are written to a temporary sibling first and renamed into
    /// place, so the cache path never holds a partially written file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn store(
        &self,
        symbol: &str,
        price_type: PriceType,
        day: NaiveDate,
        bytes: &[u8],
    ) -> Result<PathBuf, CacheError> {
        let path = self.path_for(symbol, price_type, day);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|source| CacheError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        if fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }

        let nonce = PART_NONCE.fetch_add(1, Ordering::Relaxed);
        let part = path.with_extension(format!("bi5.{}.{nonce}.part", std::process::id()));
        fs::write(&part, bytes)
            .await
            .map_err(|source| CacheError::WriteFile {
                path: part.clone(),
                source,
            })?;
        fs::rename(&part, &path)
            .await
            .map_err(|source| CacheError::WriteFile {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }

    /// Reads a cached archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn read(path: &Path) -> Result<Vec<u8>, CacheError> {
        fs::read(path).await.map_err(|source| CacheError::ReadFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

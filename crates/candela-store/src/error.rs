//! Store error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised when bars cannot be persisted or read back.
#[derive(Error, Debug)]
pub enum StoreError {
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

    /// Failed to parse a partition file.
    #[error("Failed to parse partition '{path}': {source}")]
    ParseJson {
        /// The path that could not be parsed.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Failed to serialize a partition.
    #[error("Failed to serialize partition: {0}")]
    SerializeJson(#[from] serde_json::Error),

    /// A writer panicked while holding the store lock.
    #[error("bar store lock poisoned")]
    Poisoned,
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

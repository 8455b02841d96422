//! LZMA / XZ decompression for bi5 files.

use lzma_rs::{lzma_decompress, xz_decompress};
use std::io::{BufReader, Cursor};
use thiserror::Error;

/// Magic bytes opening an XZ container.
const XZ_MAGIC: [u8; 6] = [0xFD, b'7', b'z', b'X', b'Z', 0x00];

/// Errors that can occur during decompression.
#[derive(Error, Debug)]
pub enum DecompressError {
    /// LZMA decompression failed.
    #[error("LZMA decompression failed: {0}")]
    LzmaError(String),

    /// Empty input data.
    #[error("Empty input data")]
    EmptyInput,
}

/// Container format of a compressed archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Legacy `.lzma` ("LZMA alone") stream, used by the feed.
    Lzma,
    /// XZ container.
    Xz,
}

impl CompressionFormat {
    /// Detects the container format from the leading bytes.
    #[must_use]
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(&XZ_MAGIC) {
            Self::Xz
        } else {
            Self::Lzma
        }
    }
}

/// Decompresses a bi5 archive, auto-detecting LZMA or XZ framing.
///
/// # Errors
///
/// Returns an error if the input is empty or decompression fails.
pub fn decompress_bi5(compressed: &[u8]) -> Result<Vec<u8>, DecompressError> {
    if compressed.is_empty() {
        return Err(DecompressError::EmptyInput);
    }

    let mut decompressed = Vec::new();
    let mut reader = BufReader::new(Cursor::new(compressed));

    match CompressionFormat::detect(compressed) {
        CompressionFormat::Lzma => lzma_decompress(&mut reader, &mut decompressed),
        CompressionFormat::Xz => xz_decompress(&mut reader, &mut decompressed),
    }
    .map_err(|e| DecompressError::LzmaError(e.to_string()))?;

    Ok(decompressed)
}

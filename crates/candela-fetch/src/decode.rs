//! Decoding one day's archive into minute bars.

use candela_types::{Ohlcv, RawBar};
use chrono::NaiveDate;
use thiserror::Error;

use crate::parse::{check_length, parse_record};
use crate::{DecompressError, ParseError, decompress_bi5};

/// A day's archive could not be decoded; no bars are produced from it.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The compressed stream is empty or corrupt.
    #[error("malformed archive: {0}")]
    Decompress(#[from] DecompressError),

    /// The decompressed payload is not a whole number of records.
    #[error("malformed archive: {0}")]
    Parse(#[from] ParseError),
}

/// A fully validated day of minute records.
///
/// Holds the decompressed payload; [`DecodedDay::bars`] walks it lazily and
/// can be called any number of times.
#[derive(Debug, Clone)]
pub struct DecodedDay {
    day: NaiveDate,
    decimal_factor: f64,
    payload: Vec<u8>,
}

impl DecodedDay {
    /// Returns the calendar day the archive covers.
    #[must_use]
    pub const fn day(&self) -> NaiveDate {
        self.day
    }

    /// Returns the number of minute records in the archive.
    #[must_use]
    pub const fn len(&self) -> usize {
        crate::parse::bar_count(self.payload.len())
    }

    /// Returns true if the archive holds no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Returns the day's minute bars, descaled and timestamped.
    pub fn bars(&self) -> impl Iterator<Item = Ohlcv> + '_ {
        self.payload
            .chunks_exact(RawBar::SIZE)
            .map(parse_record)
            .map(move |raw| raw.normalize(self.day, self.decimal_factor))
    }
}

/// Decodes one day's compressed archive.
///
/// The payload is decompressed and its length validated up front, so a
/// corrupt archive yields an error and never a partial series of bars.
///
/// # Errors
///
/// Returns [`DecodeError`] if decompression fails or the payload length is
/// not a multiple of 24 bytes.
pub fn decode_day(
    compressed: &[u8],
    day: NaiveDate,
    decimal_factor: f64,
) -> Result<DecodedDay, DecodeError> {
    let payload = decompress_bi5(compressed)?;
    check_length(&payload)?;
    Ok(DecodedDay {
        day,
        decimal_factor,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::encode_bar;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use std::io::Cursor;

    fn compress(records: &[RawBar]) -> Vec<u8> {
        let payload: Vec<u8> = records.iter().flat_map(encode_bar).collect();
        let mut compressed = Vec::new();
        lzma_rs::lzma_compress(&mut Cursor::new(payload), &mut compressed).unwrap();
        compressed
    }

    #[test]
    fn test_decode_known_records() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let records = [
            RawBar::new(0, 110_000, 110_010, 109_990, 110_020, 1.5),
            RawBar::new(60, 110_010, 110_030, 110_000, 110_040, 2.0),
            RawBar::new(120, 110_030, 110_000, 109_980, 110_035, 0.0),
        ];
        let decoded = decode_day(&compress(&records), day, 100_000.0).unwrap();
        let bars: Vec<_> = decoded.bars().collect();

        assert_eq!(decoded.len(), 3);
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[1].time, Utc.with_ymd_and_hms(2024, 1, 10, 0, 1, 0).unwrap());
        assert_relative_eq!(bars[0].open, 1.1);
        assert_relative_eq!(bars[0].close, 1.1001);
        assert_relative_eq!(bars[0].low, 1.0999);
        assert_relative_eq!(bars[0].high, 1.1002);
        assert_relative_eq!(bars[2].volume, 0.0);
    }

    #[test]
    fn test_decode_jpy_descaling() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let records = [RawBar::new(86_340, 145_123, 145_150, 145_100, 145_200, 3.0)];
        let decoded = decode_day(&compress(&records), day, 1_000.0).unwrap();
        let bar = decoded.bars().next().unwrap();

        assert_eq!(bar.time, Utc.with_ymd_and_hms(2024, 1, 10, 23, 59, 0).unwrap());
        assert_relative_eq!(bar.open, 145.123);
        assert_relative_eq!(bar.close, 145.15);
    }

    #[test]
    fn test_bars_restartable() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let records = [
            RawBar::new(0, 100, 100, 100, 100, 1.0),
            RawBar::new(60, 100, 100, 100, 100, 1.0),
        ];
        let decoded = decode_day(&compress(&records), day, 100_000.0).unwrap();

        let first: Vec<_> = decoded.bars().collect();
        let second: Vec<_> = decoded.bars().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_truncated_payload_is_malformed() {
        let mut payload = encode_bar(&RawBar::new(0, 1, 1, 1, 1, 1.0)).to_vec();
        payload.pop();
        let mut compressed = Vec::new();
        lzma_rs::lzma_compress(&mut Cursor::new(payload), &mut compressed).unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let result = decode_day(&compressed, day, 100_000.0);
        assert!(matches!(result, Err(DecodeError::Parse(_))));
    }

    #[test]
    fn test_empty_archive_has_no_bars() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 13).unwrap();
        let decoded = decode_day(&compress(&[]), day, 100_000.0).unwrap();

        assert!(decoded.is_empty());
        assert_eq!(decoded.bars().count(), 0);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let result = decode_day(&[0x00, 0x01, 0x02, 0x03], day, 100_000.0);
        assert!(matches!(result, Err(DecodeError::Decompress(_))));
    }
}

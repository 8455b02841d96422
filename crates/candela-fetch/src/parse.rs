//! Binary candle parsing from the bi5 minute-candle format.

use byteorder::{BigEndian, ByteOrder};
use candela_types::RawBar;
use thiserror::Error;

/// Errors that can occur during record parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Invalid data length (not a multiple of record size).
    #[error("Invalid data length: {0} bytes (expected multiple of {1})")]
    InvalidLength(usize, usize),
}

/// Parses raw minute records from decompressed bi5 data.
///
/// Each record is 24 bytes in big-endian order:
/// - `i32`: seconds offset from midnight (bytes 0-3)
/// - `i32`: open (bytes 4-7)
/// - `i32`: close (bytes 8-11)
/// - `i32`: low (bytes 12-15)
/// - `i32`: high (bytes 16-19)
/// - `f32`: volume (bytes 20-23)
///
/// # Errors
///
/// Returns an error if the data length is not a multiple of 24.
pub fn parse_bars(data: &[u8]) -> Result<impl Iterator<Item = RawBar> + '_, ParseError> {
    check_length(data)?;
    Ok(data.chunks_exact(RawBar::SIZE).map(parse_record))
}

/// Checks that the payload is a whole number of records.
///
/// # Errors
///
/// Returns [`ParseError::InvalidLength`] if the length is not a multiple of 24.
pub const fn check_length(data: &[u8]) -> Result<(), ParseError> {
    if data.len().is_multiple_of(RawBar::SIZE) {
        Ok(())
    } else {
        Err(ParseError::InvalidLength(data.len(), RawBar::SIZE))
    }
}

/// Parses a single record from a 24-byte chunk.
#[inline]
pub(crate) fn parse_record(data: &[u8]) -> RawBar {
    RawBar::new(
        BigEndian::read_i32(&data[0..4]),
        BigEndian::read_i32(&data[4..8]),
        BigEndian::read_i32(&data[8..12]),
        BigEndian::read_i32(&data[12..16]),
        BigEndian::read_i32(&data[16..20]),
        BigEndian::read_f32(&data[20..24]),
    )
}

/// Returns the number of records in the given data.
#[must_use]
pub const fn bar_count(data_len: usize) -> usize {
    data_len / RawBar::SIZE
}

/// Encodes one record in wire order. Used to build synthetic archives.
#[must_use]
pub fn encode_bar(bar: &RawBar) -> [u8; RawBar::SIZE] {
    let mut bytes = [0u8; RawBar::SIZE];
    BigEndian::write_i32(&mut bytes[0..4], bar.seconds_offset);
    BigEndian::write_i32(&mut bytes[4..8], bar.open_raw);
    BigEndian::write_i32(&mut bytes[8..12], bar.close_raw);
    BigEndian::write_i32(&mut bytes[12..16], bar.low_raw);
    BigEndian::write_i32(&mut bytes[16..20], bar.high_raw);
    BigEndian::write_f32(&mut bytes[20..24], bar.volume);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_bar_field_order() {
        let mut bytes = vec![0u8; 24];
        BigEndian::write_i32(&mut bytes[0..4], 60);
        BigEndian::write_i32(&mut bytes[4..8], 110_000);
        BigEndian::write_i32(&mut bytes[8..12], 110_020);
        BigEndian::write_i32(&mut bytes[12..16], 109_950);
        BigEndian::write_i32(&mut bytes[16..20], 110_080);
        BigEndian::write_f32(&mut bytes[20..24], 4.5);

        let bar = parse_record(&bytes);
        assert_eq!(bar.seconds_offset, 60);
        assert_eq!(bar.open_raw, 110_000);
        assert_eq!(bar.close_raw, 110_020);
        assert_eq!(bar.low_raw, 109_950);
        assert_eq!(bar.high_raw, 110_080);
        assert!((bar.volume - 4.5).abs() < 0.001);
    }

    #[test]
    fn test_parse_multiple_bars() {
        let mut data = encode_bar(&RawBar::new(0, 100, 101, 99, 102, 1.0)).to_vec();
        data.extend(encode_bar(&RawBar::new(60, 101, 100, 98, 103, 2.0)));

        let bars: Vec<_> = parse_bars(&data).unwrap().collect();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].seconds_offset, 0);
        assert_eq!(bars[1].seconds_offset, 60);
        assert_eq!(bars[1].close_raw, 100);
    }

    #[test]
    fn test_invalid_length() {
        let data = vec![0u8; 30];
        let result = parse_bars(&data);
        assert!(matches!(result, Err(ParseError::InvalidLength(30, 24))));
    }

    #[test]
    fn test_check_length() {
        assert!(check_length(&[0u8; 48]).is_ok());
        assert!(check_length(&[]).is_ok());
        assert_eq!(check_length(&[0u8; 47]), Err(ParseError::InvalidLength(47, 24)));
    }

    #[test]
    fn test_empty_data() {
        let bars: Vec<_> = parse_bars(&[]).unwrap().collect();
        assert!(bars.is_empty());
    }

    #[test]
    fn test_bar_count() {
        assert_eq!(bar_count(0), 0);
        assert_eq!(bar_count(24), 1);
        assert_eq!(bar_count(1440 * 24), 1440);
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI variable-length quantities.
//!
//! Seven data bits per byte, most significant group first, continuation
//! bit set on every byte but the last.

use crate::error::RecordingError;

/// Largest value a 4-byte quantity holds
pub const MAX: u32 = 0x0FFF_FFFF;

/// Longest quantity a reader accepts
pub const MAX_LEN: usize = 4;

/// Append the encoding of `value` to `out`.
///
/// Values above [`MAX`] take a fifth byte that [`read_at`] rejects.
pub fn write(value: u32, out: &mut Vec<u8>) {
    let mut groups = [0u8; 5];
    let mut len = 0;
    let mut rest = value;

    loop {
        groups[len] = (rest & 0x7F) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }

    for i in (0..len).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | continuation);
    }
}

/// Encode `value` into a new buffer
pub fn encode(value: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(4);
    write(value, &mut out);
    out
}

/// Read a quantity starting at `pos`, returning the value and the position
/// just past its terminating byte.
///
/// At most [`MAX_LEN`] bytes are read, so the value never exceeds [`MAX`].
pub fn read_at(data: &[u8], pos: usize) -> Result<(u32, usize), RecordingError> {
    let mut value: u32 = 0;

    for cursor in pos..pos + MAX_LEN {
        let Some(&byte) = data.get(cursor) else {
            return Err(RecordingError::TruncatedVlq { offset: pos });
        };
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok((value, cursor + 1));
        }
    }

    Err(RecordingError::OverlongVlq { offset: pos })
}

/// Decode a quantity at the start of `bytes`
pub fn decode(bytes: &[u8]) -> Result<u32, RecordingError> {
    read_at(bytes, 0).map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_encodings() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(127), vec![0x7F]);
        assert_eq!(encode(128), vec![0x81, 0x00]);
        assert_eq!(encode(16383), vec![0xFF, 0x7F]);
        assert_eq!(encode(16384), vec![0x81, 0x80, 0x00]);
        assert_eq!(encode(0x0FFF_FFFF), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_decode_stops_at_terminator() {
        let (value, next) = read_at(&[0x81, 0x00, 0x90, 0x3C], 0).unwrap();
        assert_eq!(value, 128);
        assert_eq!(next, 2);
    }

    #[test]
    fn test_read_at_offset() {
        let data = [0xFF, 0x00, 0x83, 0x60];
        let (value, next) = read_at(&data, 2).unwrap();
        assert_eq!(value, 480);
        assert_eq!(next, 4);
    }

    #[test]
    fn test_truncated() {
        assert_eq!(decode(&[]), Err(RecordingError::TruncatedVlq { offset: 0 }));
        assert_eq!(
            decode(&[0x81, 0x80]),
            Err(RecordingError::TruncatedVlq { offset: 0 })
        );
        assert_eq!(
            read_at(&[0x00, 0xC0], 1),
            Err(RecordingError::TruncatedVlq { offset: 1 })
        );
    }

    #[test]
    fn test_overlong_rejected() {
        assert_eq!(
            decode(&[0x81, 0x80, 0x80, 0x80, 0x00]),
            Err(RecordingError::OverlongVlq { offset: 0 })
        );
        assert_eq!(
            read_at(&[0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F], 1),
            Err(RecordingError::OverlongVlq { offset: 1 })
        );
        assert_eq!(decode(&[0xFF, 0xFF, 0xFF, 0x7F]), Ok(MAX));
    }

    #[test]
    fn test_above_max_needs_fifth_byte() {
        assert_eq!(encode(MAX + 1).len(), 5);
        assert!(decode(&encode(MAX + 1)).is_err());
    }

    #[test]
    fn test_boundaries_round_trip() {
        for shift in 0..28 {
            for value in [(1u32 << shift) - 1, 1u32 << shift] {
                assert_eq!(decode(&encode(value)).unwrap(), value);
            }
        }
    }
}

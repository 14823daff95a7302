// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recorder wire format.
//!
//! The recorder streams fixed 5-byte records with no framing:
//!
//! ```text
//! b0: [note status:1][pitch:7]
//! b1: [pedal flag:1][velocity:7]
//! b2,b3: whole seconds, big-endian
//! b4: fraction of a second in 1/250 s steps
//! ```

use tracing::debug;

use super::{Message, MessageType, Recording};
use crate::error::RecordingError;

/// Bytes per wire record
pub const RECORD_LEN: usize = 5;

/// Sub-second steps per second in the last record byte
pub const FRACTION_STEPS: f64 = 250.0;

/// Decode a single record
pub fn decode_record(record: [u8; RECORD_LEN]) -> Message {
    let note_status = record[0] >> 7;
    let pitch = record[0] & 0x7F;
    let pedal_status = record[1] >> 7;
    let velocity = record[1] & 0x7F;
    let seconds = u16::from_be_bytes([record[2], record[3]]) as f64;
    let time = seconds + record[4] as f64 / FRACTION_STEPS;

    let kind = match (pedal_status != 0, note_status != 0) {
        (true, true) => MessageType::PedalOn,
        (true, false) => MessageType::PedalOff,
        (false, true) => MessageType::NoteOn,
        (false, false) => MessageType::NoteOff,
    };

    Message {
        kind,
        pitch,
        velocity,
        time,
    }
}

/// Encode a message as a wire record, as the recorder would send it.
///
/// Times beyond the 16-bit seconds range saturate.
pub fn encode_record(message: &Message) -> [u8; RECORD_LEN] {
    let (note_status, pedal_status) = match message.kind {
        MessageType::NoteOn => (1, 0),
        MessageType::NoteOff => (0, 0),
        MessageType::PedalOn => (1, 1),
        MessageType::PedalOff => (0, 1),
    };

    let steps = (message.time.max(0.0) * FRACTION_STEPS).round() as u64;
    let seconds = (steps / FRACTION_STEPS as u64).min(u16::MAX as u64) as u16;
    let fraction = (steps % FRACTION_STEPS as u64) as u8;
    let [hi, lo] = seconds.to_be_bytes();

    [
        (note_status << 7) | (message.pitch & 0x7F),
        (pedal_status << 7) | (message.velocity & 0x7F),
        hi,
        lo,
        fraction,
    ]
}

/// Decode a whole buffer of records.
///
/// Fails without decoding anything when the length is not a multiple of
/// [`RECORD_LEN`].
pub fn decode_messages(bytes: &[u8]) -> Result<Vec<Message>, RecordingError> {
    if bytes.len() % RECORD_LEN != 0 {
        return Err(RecordingError::MalformedStream { len: bytes.len() });
    }

    let messages: Vec<Message> = bytes
        .chunks_exact(RECORD_LEN)
        .map(|chunk| decode_record([chunk[0], chunk[1], chunk[2], chunk[3], chunk[4]]))
        .collect();

    debug!("Decoded {} wire records", messages.len());
    Ok(messages)
}

/// Decode a buffer of records into a recording with derived metadata
pub fn decode_recording(
    bytes: &[u8],
    recorded_at: Option<String>,
) -> Result<Recording, RecordingError> {
    let mut recording = Recording::from_messages(decode_messages(bytes)?)?;
    recording.recorded_at = recorded_at;
    Ok(recording)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_note_on() {
        let msg = decode_record([0x80 | 60, 64, 0, 0, 0]);
        assert_eq!(msg, Message::note_on(60, 64, 0.0));
    }

    #[test]
    fn test_decode_note_off_with_fraction() {
        let msg = decode_record([60, 64, 0, 0, 125]);
        assert_eq!(msg.kind, MessageType::NoteOff);
        assert_eq!(msg.time, 0.5);
    }

    #[test]
    fn test_decode_pedal() {
        let on = decode_record([0x80, 0x80, 0, 3, 0]);
        assert_eq!(on.kind, MessageType::PedalOn);
        assert_eq!(on.time, 3.0);

        let off = decode_record([0x00, 0x80, 0, 4, 0]);
        assert_eq!(off.kind, MessageType::PedalOff);
    }

    #[test]
    fn test_decode_big_endian_seconds() {
        // 0x0102 = 258 seconds, 50/250 = 0.2
        let msg = decode_record([0x80 | 72, 100, 0x01, 0x02, 50]);
        assert!((msg.time - 258.2).abs() < 1e-9);
        assert_eq!(msg.pitch, 72);
        assert_eq!(msg.velocity, 100);
    }

    #[test]
    fn test_malformed_lengths() {
        for len in [1usize, 4, 6, 9, 11, 14] {
            let bytes = vec![0u8; len];
            assert_eq!(
                decode_messages(&bytes),
                Err(RecordingError::MalformedStream { len })
            );
        }
    }

    #[test]
    fn test_empty_buffer() {
        assert_eq!(decode_messages(&[]).unwrap(), Vec::new());
        assert_eq!(
            decode_recording(&[], None),
            Err(RecordingError::EmptyRecording)
        );
    }

    #[rustfmt::skip]
    #[test]
    fn test_decode_in_order() {
        let bytes = [
            0x80 | 60, 64, 0, 0, 0,
            60, 64, 0, 0, 125,
            0x80 | 64, 70, 0, 1, 0,
        ];
        let messages = decode_messages(&bytes).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], Message::note_on(60, 64, 0.0));
        assert_eq!(messages[1], Message::note_off(60, 64, 0.5));
        assert_eq!(messages[2], Message::note_on(64, 70, 1.0));
    }

    #[test]
    fn test_encode_record_matches_layout() {
        assert_eq!(
            encode_record(&Message::note_on(60, 64, 258.2)),
            [0x80 | 60, 64, 0x01, 0x02, 50]
        );
        assert_eq!(encode_record(&Message::pedal_off(0.5)), [0x00, 0x80, 0, 0, 125]);
    }

    #[test]
    fn test_decode_recording_sets_timestamp() {
        let bytes = [0x80 | 60, 64, 0, 0, 0, 60, 64, 0, 0, 125];
        let recording = decode_recording(&bytes, Some("2024-01-01".to_string())).unwrap();
        assert_eq!(recording.recorded_at.as_deref(), Some("2024-01-01"));
        assert_eq!(recording.duration(), 0.5);
    }
}

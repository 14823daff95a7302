// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error and anomaly types shared by the decoders.
//!
//! `RecordingError` is fatal for the call that produced it and no partial
//! result is returned. `Anomaly` describes a problem confined to a single
//! event; the operation recovers and reports it alongside its result.

use std::fmt;

use thiserror::Error;

/// Fatal decoding and derivation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    /// Wire buffer length is not a multiple of the record size
    #[error("malformed wire stream: {len} bytes is not a whole number of 5-byte records")]
    MalformedStream { len: usize },

    /// No messages to derive metadata from
    #[error("recording contains no messages")]
    EmptyRecording,

    /// Buffer ended inside a variable-length quantity
    #[error("truncated variable-length quantity starting at byte {offset}")]
    TruncatedVlq { offset: usize },

    /// Variable-length quantity longer than four bytes
    #[error("variable-length quantity at byte {offset} runs past four bytes")]
    OverlongVlq { offset: usize },

    /// MIDI file shorter than its fixed header and track prefix
    #[error("MIDI file too short: {len} bytes")]
    TruncatedFile { len: usize },

    /// Missing `MThd` or `MTrk` chunk id
    #[error("missing {expected} chunk")]
    InvalidHeader { expected: &'static str },
}

/// A recovered, single-event problem
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anomaly {
    /// Unrecognized status byte in a track; parsing stopped there
    UnknownEvent { status: u8, offset: usize },
    /// Event cut off by the end of the buffer; parsing stopped there
    TruncatedEvent { status: u8, offset: usize },
    /// Note on for a pitch that was already sounding
    DanglingNoteOn { pitch: u8, time: f64 },
    /// Note off with no matching note on
    OrphanNoteOff { pitch: u8, time: f64 },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::UnknownEvent { status, offset } => {
                write!(f, "unknown event 0x{:02X} at byte {}", status, offset)
            }
            Anomaly::TruncatedEvent { status, offset } => {
                write!(f, "truncated event 0x{:02X} at byte {}", status, offset)
            }
            Anomaly::DanglingNoteOn { pitch, time } => {
                write!(f, "note on for already sounding pitch {} at {:.3}s", pitch, time)
            }
            Anomaly::OrphanNoteOff { pitch, time } => {
                write!(f, "note off without note on for pitch {} at {:.3}s", pitch, time)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RecordingError::MalformedStream { len: 7 };
        assert!(err.to_string().contains("7 bytes"));

        let err = RecordingError::InvalidHeader { expected: "MTrk" };
        assert_eq!(err.to_string(), "missing MTrk chunk");
    }

    #[test]
    fn test_anomaly_display() {
        let anomaly = Anomaly::UnknownEvent { status: 0xE0, offset: 40 };
        assert_eq!(anomaly.to_string(), "unknown event 0xE0 at byte 40");

        let anomaly = Anomaly::OrphanNoteOff { pitch: 60, time: 1.5 };
        assert!(anomaly.to_string().contains("pitch 60"));
    }
}

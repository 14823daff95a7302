// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI File support.
//!
//! Recordings are stored as single-track Type 0 files at 1000 ticks per
//! quarter note and a fixed 60 BPM, so one tick is one millisecond. Only
//! that subset is read back.

pub mod export;
pub mod import;
pub mod vlq;

pub use export::{encode, export};
pub use import::{decode, import, DecodedFile};

/// Ticks per quarter note
pub const DIVISION: u16 = 1000;

/// Microseconds per quarter note (60 BPM)
pub const TEMPO_MICROS: u32 = 1_000_000;

/// Ticks per second at the fixed tempo
pub const TICKS_PER_SECOND: f64 = 1000.0;

/// `MThd` chunk plus the `MTrk` id and length
pub const PREFIX_LEN: usize = 22;

/// Key of the text event carrying the recording timestamp
pub const RECORD_TIME_KEY: &str = "recordTime";

/// Meta event types
pub mod meta {
    pub const TEXT: u8 = 0x01;
    pub const TRACK_NAME: u8 = 0x03;
    pub const END_OF_TRACK: u8 = 0x2F;
    pub const TEMPO: u8 = 0x51;
    pub const TIME_SIGNATURE: u8 = 0x58;
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recital: codecs and playback for recorded piano performances.
//!
//! This crate provides:
//! - Decoding of the recorder's fixed 5-byte wire records
//! - Recording statistics (duration, pitch histograms, velocity)
//! - Note interval pairing for piano-roll consumers
//! - Standard MIDI File encoding and decoding
//! - A frame-driven playback scheduler feeding MIDI and synth outputs

pub mod audio;
pub mod config;
pub mod error;
pub mod midi;
pub mod music;
pub mod playback;
pub mod recording;
pub mod smf;

pub use error::{Anomaly, RecordingError};
pub use playback::{FrameOutcome, Outputs, PlaybackScheduler, PlaybackStatus, Player, RunToken};
pub use recording::{
    build_notes, compute_metadata, Message, MessageType, Note, NoteIntervalBuilder, NoteIntervals,
    Recording, RecordingMetadata, RecordingSummary,
};

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recorded performances.
//!
//! This module provides:
//! - The message and recording data model shared with the persistence store
//! - Decoding of the recorder's wire format
//! - Statistics derived from a message stream
//! - Note interval pairing

pub mod notes;
pub mod stats;
pub mod wire;

pub use notes::{build_notes, Note, NoteIntervalBuilder, NoteIntervals};
pub use stats::compute_metadata;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RecordingError;

/// Kind of a recorded event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    /// Key pressed
    NoteOn,
    /// Key released
    NoteOff,
    /// Sustain pedal pressed
    PedalOn,
    /// Sustain pedal released
    PedalOff,
}

impl MessageType {
    /// Check if this is a pedal event
    pub fn is_pedal(self) -> bool {
        matches!(self, MessageType::PedalOn | MessageType::PedalOff)
    }
}

/// One musical event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Event kind
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// MIDI note number (0 for pedal events)
    pub pitch: u8,
    /// Velocity (0 for pedal events)
    pub velocity: u8,
    /// Seconds from the start of the recording
    pub time: f64,
}

impl Message {
    /// Create a note on message
    pub fn note_on(pitch: u8, velocity: u8, time: f64) -> Self {
        Self {
            kind: MessageType::NoteOn,
            pitch,
            velocity,
            time,
        }
    }

    /// Create a note off message
    pub fn note_off(pitch: u8, velocity: u8, time: f64) -> Self {
        Self {
            kind: MessageType::NoteOff,
            pitch,
            velocity,
            time,
        }
    }

    /// Create a pedal down message
    pub fn pedal_on(time: f64) -> Self {
        Self {
            kind: MessageType::PedalOn,
            pitch: 0,
            velocity: 0,
            time,
        }
    }

    /// Create a pedal up message
    pub fn pedal_off(time: f64) -> Self {
        Self {
            kind: MessageType::PedalOff,
            pitch: 0,
            velocity: 0,
            time,
        }
    }
}

/// Statistics derived from a recording's messages
///
/// Every field defaults when absent, since older stored records carry only
/// some of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordingMetadata {
    /// Time of the final message in seconds
    pub duration: f64,
    /// Fraction of note ons per pitch class (C = 0)
    pub semitones: [f64; 12],
    /// Note on count per MIDI pitch (128 entries)
    pub pitch_counts: Vec<u32>,
    /// Mean note on velocity
    pub average_velocity: f64,
    /// Population standard deviation of note on velocities
    pub velocity_spread: f64,
    /// Note ons that contributed to the statistics
    pub note_count: usize,
    /// Total messages in the recording
    pub message_count: usize,
}

impl Default for RecordingMetadata {
    fn default() -> Self {
        Self {
            duration: 0.0,
            semitones: [0.0; 12],
            pitch_counts: vec![0; 128],
            average_velocity: 0.0,
            velocity_spread: 0.0,
            note_count: 0,
            message_count: 0,
        }
    }
}

/// A recorded performance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    /// Identity assigned by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// User-supplied title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// User-supplied free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Favourite flag
    #[serde(default)]
    pub starred: bool,
    /// Wall-clock time the performance was recorded, as carried in MIDI files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,
    /// Derived statistics
    #[serde(flatten)]
    pub metadata: RecordingMetadata,
    /// Time-ordered events
    pub messages: Vec<Message>,
}

impl Recording {
    /// Build a recording from a finished message stream, deriving its metadata
    pub fn from_messages(messages: Vec<Message>) -> Result<Self, RecordingError> {
        let metadata = compute_metadata(&messages)?;
        Ok(Self {
            id: None,
            title: None,
            note: None,
            starred: false,
            recorded_at: None,
            metadata,
            messages,
        })
    }

    /// Set the recording timestamp
    pub fn with_recorded_at(mut self, recorded_at: impl Into<String>) -> Self {
        self.recorded_at = Some(recorded_at.into());
        self
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Parse a stored JSON record.
    ///
    /// Stored statistics are discarded and derived again from the messages,
    /// so a stale or partial record plays and reports like a fresh one.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let mut recording: Recording =
            serde_json::from_str(json).context("Failed to parse recording JSON")?;
        let stored_duration = recording.metadata.duration;
        recording.refresh_metadata()?;
        if stored_duration != recording.metadata.duration {
            debug!(
                "Stored duration {:.3}s replaced by {:.3}s",
                stored_duration, recording.metadata.duration
            );
        }
        Ok(recording)
    }

    /// Recompute metadata after the message stream was edited
    pub fn refresh_metadata(&mut self) -> Result<(), RecordingError> {
        self.metadata = compute_metadata(&self.messages)?;
        Ok(())
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.metadata.duration
    }

    /// Pair note ons and note offs into intervals
    pub fn notes(&self) -> NoteIntervals {
        build_notes(&self.messages)
    }

    /// List-view projection without the message stream
    pub fn summary(&self) -> RecordingSummary {
        RecordingSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            note: self.note.clone(),
            starred: self.starred,
            recorded_at: self.recorded_at.clone(),
            metadata: self.metadata.clone(),
            midi_url: None,
        }
    }
}

/// Recording stub kept in list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub starred: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,
    #[serde(flatten)]
    pub metadata: RecordingMetadata,
    /// Location of the exported MIDI file, once uploaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_url: Option<String>,
}

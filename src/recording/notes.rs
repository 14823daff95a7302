// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note interval pairing.
//!
//! Turns the flat on/off message stream into intervals for piano-roll
//! drawing. Pairing problems are recovered in place and reported as
//! [`Anomaly`] records next to the result.

use std::collections::BTreeMap;

use tracing::warn;

use super::{Message, MessageType};
use crate::error::Anomaly;

/// A sounding interval of one key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// MIDI note number
    pub pitch: u8,
    /// Note on velocity
    pub velocity: u8,
    /// Seconds at note on
    pub on_time: f64,
    /// Seconds at note off (None while open)
    pub off_time: Option<f64>,
}

impl Note {
    /// Length in seconds, if closed
    pub fn duration(&self) -> Option<f64> {
        self.off_time.map(|off| off - self.on_time)
    }
}

/// Closed intervals plus the anomalies met while pairing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteIntervals {
    /// Closed notes, unordered
    pub notes: Vec<Note>,
    /// Recovered pairing problems
    pub anomalies: Vec<Anomaly>,
}

/// Incremental note pairing with at most one open note per pitch
#[derive(Debug, Clone, Default)]
pub struct NoteIntervalBuilder {
    open: BTreeMap<u8, Note>,
    closed: Vec<Note>,
    anomalies: Vec<Anomaly>,
    last_time: f64,
}

impl NoteIntervalBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next message in time order
    pub fn push(&mut self, message: &Message) {
        match message.kind {
            MessageType::NoteOn => {
                if let Some(mut stale) = self.open.remove(&message.pitch) {
                    warn!(
                        "Note on for pitch {} at {:.3}s while already sounding, closing previous",
                        message.pitch, message.time
                    );
                    stale.off_time = Some(message.time);
                    self.closed.push(stale);
                    self.anomalies.push(Anomaly::DanglingNoteOn {
                        pitch: message.pitch,
                        time: message.time,
                    });
                }
                self.open.insert(
                    message.pitch,
                    Note {
                        pitch: message.pitch,
                        velocity: message.velocity,
                        on_time: message.time,
                        off_time: None,
                    },
                );
            }
            MessageType::NoteOff => match self.open.remove(&message.pitch) {
                Some(mut note) => {
                    note.off_time = Some(message.time);
                    self.closed.push(note);
                }
                None => {
                    warn!(
                        "Note off for pitch {} at {:.3}s without a note on, dropping",
                        message.pitch, message.time
                    );
                    self.anomalies.push(Anomaly::OrphanNoteOff {
                        pitch: message.pitch,
                        time: message.time,
                    });
                }
            },
            MessageType::PedalOn | MessageType::PedalOff => {}
        }
        self.last_time = message.time;
    }

    /// Number of notes still sounding
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Check if a pitch is sounding
    pub fn is_open(&self, pitch: u8) -> bool {
        self.open.contains_key(&pitch)
    }

    /// Notes closed so far
    pub fn closed(&self) -> &[Note] {
        &self.closed
    }

    /// Anomalies met so far
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// Close every open note at the last message time and return the result
    pub fn finish(mut self) -> NoteIntervals {
        let last_time = self.last_time;
        for (_, mut note) in std::mem::take(&mut self.open) {
            note.off_time = Some(last_time);
            self.closed.push(note);
        }

        NoteIntervals {
            notes: self.closed,
            anomalies: self.anomalies,
        }
    }
}

/// Pair a whole message stream
pub fn build_notes(messages: &[Message]) -> NoteIntervals {
    let mut builder = NoteIntervalBuilder::new();
    for message in messages {
        builder.push(message);
    }
    builder.finish()
}

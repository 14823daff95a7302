// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file export.
//!
//! Writes a recording as a Type 0 file with a fixed track preamble.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use super::{meta, vlq, DIVISION, RECORD_TIME_KEY, TEMPO_MICROS};
use crate::midi::messages;
use crate::recording::{Message, MessageType, Recording};

/// MIDI event for export
#[derive(Debug, Clone)]
struct MidiExportEvent {
    /// Absolute tick
    tick: u64,
    /// Event data
    data: Vec<u8>,
}

impl MidiExportEvent {
    fn from_message(message: &Message) -> Self {
        let tick = (message.time * 1000.0).round().max(0.0) as u64;
        let (pitch, velocity) = (message.pitch & 0x7F, message.velocity & 0x7F);
        let data = match message.kind {
            MessageType::NoteOn => vec![messages::NOTE_ON, pitch, velocity],
            MessageType::NoteOff => vec![messages::NOTE_OFF, pitch, velocity],
            MessageType::PedalOn => vec![messages::CONTROL_CHANGE, messages::SUSTAIN_PEDAL, 0x7F],
            MessageType::PedalOff => vec![messages::CONTROL_CHANGE, messages::SUSTAIN_PEDAL, 0x00],
        };
        Self { tick, data }
    }

    fn meta(kind: u8, payload: &[u8]) -> Self {
        let mut data = vec![0xFF, kind];
        vlq::write(payload.len() as u32, &mut data);
        data.extend_from_slice(payload);
        Self { tick: 0, data }
    }

    fn program_change(program: u8) -> Self {
        Self {
            tick: 0,
            data: vec![messages::PROGRAM_CHANGE, program & 0x7F],
        }
    }

    fn tempo(microseconds: u32) -> Self {
        Self::meta(
            meta::TEMPO,
            &[
                ((microseconds >> 16) & 0xFF) as u8,
                ((microseconds >> 8) & 0xFF) as u8,
                (microseconds & 0xFF) as u8,
            ],
        )
    }

    fn end_of_track() -> Self {
        Self::meta(meta::END_OF_TRACK, &[])
    }
}

/// Fixed events written before the performance
fn preamble(recording: &Recording) -> Vec<MidiExportEvent> {
    let record_time = format!(
        "{}: {}",
        RECORD_TIME_KEY,
        recording.recorded_at.as_deref().unwrap_or_default()
    );

    vec![
        // Single NUL byte name, as the recorder's files have always carried
        MidiExportEvent::meta(meta::TRACK_NAME, &[0x00]),
        // 4/4, 36 clocks per click, 8 thirty-seconds per quarter
        MidiExportEvent::meta(meta::TIME_SIGNATURE, &[0x04, 0x02, 0x24, 0x08]),
        MidiExportEvent::meta(meta::TEXT, record_time.as_bytes()),
        MidiExportEvent::tempo(TEMPO_MICROS),
        MidiExportEvent::program_change(0),
    ]
}

/// Write MIDI file header chunk
fn write_header<W: Write>(writer: &mut W) -> io::Result<()> {
    writer.write_all(b"MThd")?;
    writer.write_all(&6u32.to_be_bytes())?;
    // Format 0, one track
    writer.write_all(&0u16.to_be_bytes())?;
    writer.write_all(&1u16.to_be_bytes())?;
    writer.write_all(&DIVISION.to_be_bytes())?;
    Ok(())
}

/// Build the track body with delta times
fn track_body(recording: &Recording) -> Vec<u8> {
    let mut body = Vec::with_capacity(64 + recording.messages.len() * 4);
    let mut last_tick = 0u64;

    let events = preamble(recording)
        .into_iter()
        .chain(recording.messages.iter().map(MidiExportEvent::from_message))
        .chain(std::iter::once(MidiExportEvent::end_of_track()));

    for event in events {
        // Out-of-order messages get a zero delta; gaps past 4 VLQ bytes are capped
        let delta = event.tick.saturating_sub(last_tick);
        vlq::write(delta.min(vlq::MAX as u64) as u32, &mut body);
        body.extend_from_slice(&event.data);
        last_tick = last_tick.max(event.tick);
    }

    body
}

/// Write a recording as a MIDI file
pub fn write<W: Write>(recording: &Recording, writer: &mut W) -> io::Result<()> {
    let body = track_body(recording);

    write_header(writer)?;
    writer.write_all(b"MTrk")?;
    writer.write_all(&(body.len() as u32).to_be_bytes())?;
    writer.write_all(&body)?;

    debug!(
        "Wrote MIDI file with {} messages ({} track bytes)",
        recording.messages.len(),
        body.len()
    );
    Ok(())
}

/// Encode a recording to MIDI file bytes
pub fn encode(recording: &Recording) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(super::PREFIX_LEN + 64 + recording.messages.len() * 4);
    // Writing into a Vec cannot fail
    let _ = write(recording, &mut buffer);
    buffer
}

/// Export to file
pub fn export<P: AsRef<Path>>(recording: &Recording, path: P) -> io::Result<()> {
    let mut file = File::create(path)?;
    write(recording, &mut file)
}

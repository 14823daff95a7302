// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file import.
//!
//! Reads back the single-track layout written by [`super::export`]. Parsing
//! is best effort: an unrecognized or cut-off event ends the track early and
//! is reported as an [`Anomaly`], while a broken header or an unterminated
//! delta time rejects the whole file.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::{meta, vlq, PREFIX_LEN, RECORD_TIME_KEY, TICKS_PER_SECOND};
use crate::error::{Anomaly, RecordingError};
use crate::midi::messages;
use crate::recording::{Message, Recording};

/// A decoded file and the events that could not be read
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFile {
    pub recording: Recording,
    pub anomalies: Vec<Anomaly>,
}

/// Outcome of reading one event
enum Step {
    /// Keep reading at the given position
    Next(usize),
    /// Stop reading the track
    Done,
}

/// Track reader state
struct TrackReader<'a> {
    data: &'a [u8],
    ticks: u64,
    messages: Vec<Message>,
    anomalies: Vec<Anomaly>,
    recorded_at: Option<String>,
}

impl<'a> TrackReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            ticks: 0,
            messages: Vec::new(),
            anomalies: Vec::new(),
            recorded_at: None,
        }
    }

    fn time(&self) -> f64 {
        self.ticks as f64 / TICKS_PER_SECOND
    }

    fn truncated(&mut self, status: u8, offset: usize) -> Step {
        warn!(
            "MIDI event 0x{:02X} at byte {} runs past the end of the file",
            status, offset
        );
        self.anomalies.push(Anomaly::TruncatedEvent { status, offset });
        Step::Done
    }

    /// Two data bytes following the status at `pos`
    fn data_pair(&self, pos: usize) -> Option<(u8, u8)> {
        match self.data.get(pos + 1..pos + 3) {
            Some(&[a, b]) => Some((a, b)),
            _ => None,
        }
    }

    fn read_track(&mut self) -> Result<(), RecordingError> {
        let mut pos = PREFIX_LEN;

        while pos < self.data.len() {
            let (delta, next) = vlq::read_at(self.data, pos)?;
            self.ticks += delta as u64;

            if next >= self.data.len() {
                break;
            }

            match self.read_event(next)? {
                Step::Next(after) => pos = after,
                Step::Done => break,
            }
        }

        Ok(())
    }

    fn read_event(&mut self, pos: usize) -> Result<Step, RecordingError> {
        let status = self.data[pos];

        let step = match status & 0xF0 {
            messages::NOTE_ON | messages::NOTE_OFF => match self.data_pair(pos) {
                Some((pitch, velocity)) => {
                    let time = self.time();
                    self.messages.push(if status & 0xF0 == messages::NOTE_ON {
                        Message::note_on(pitch, velocity, time)
                    } else {
                        Message::note_off(pitch, velocity, time)
                    });
                    Step::Next(pos + 3)
                }
                None => self.truncated(status, pos),
            },
            messages::CONTROL_CHANGE => match self.data_pair(pos) {
                Some((controller, value)) => {
                    if controller == messages::SUSTAIN_PEDAL {
                        let time = self.time();
                        self.messages.push(if value > 64 {
                            Message::pedal_on(time)
                        } else {
                            Message::pedal_off(time)
                        });
                    }
                    Step::Next(pos + 3)
                }
                None => self.truncated(status, pos),
            },
            messages::PROGRAM_CHANGE => {
                if pos + 2 <= self.data.len() {
                    Step::Next(pos + 2)
                } else {
                    self.truncated(status, pos)
                }
            }
            _ if status == 0xFF => self.read_meta(pos)?,
            _ => {
                warn!(
                    "Unknown MIDI event 0x{:02X} at byte {}, ignoring the rest of the track",
                    status, pos
                );
                self.anomalies.push(Anomaly::UnknownEvent { status, offset: pos });
                Step::Done
            }
        };

        Ok(step)
    }

    fn read_meta(&mut self, pos: usize) -> Result<Step, RecordingError> {
        let Some(&kind) = self.data.get(pos + 1) else {
            return Ok(self.truncated(0xFF, pos));
        };
        let (len, start) = vlq::read_at(self.data, pos + 2)?;
        let end = start + len as usize;

        let Some(payload) = self.data.get(start..end) else {
            return Ok(self.truncated(0xFF, pos));
        };

        match kind {
            meta::END_OF_TRACK => return Ok(Step::Done),
            meta::TEXT => {
                let text = String::from_utf8_lossy(payload);
                if let Some((key, value)) = text.split_once(": ") {
                    if key == RECORD_TIME_KEY && !value.is_empty() {
                        self.recorded_at = Some(value.to_string());
                    }
                }
            }
            _ => {}
        }

        Ok(Step::Next(end))
    }
}

/// Check the fixed header and track prefix
fn check_prefix(data: &[u8]) -> Result<(), RecordingError> {
    if data.len() < PREFIX_LEN {
        return Err(RecordingError::TruncatedFile { len: data.len() });
    }
    if &data[0..4] != b"MThd" {
        return Err(RecordingError::InvalidHeader { expected: "MThd" });
    }
    if &data[14..18] != b"MTrk" {
        return Err(RecordingError::InvalidHeader { expected: "MTrk" });
    }
    Ok(())
}

/// Decode MIDI file bytes into a recording
pub fn decode(data: &[u8]) -> Result<DecodedFile, RecordingError> {
    check_prefix(data)?;

    let mut reader = TrackReader::new(data);
    reader.read_track()?;

    let TrackReader {
        messages,
        anomalies,
        recorded_at,
        ..
    } = reader;

    let mut recording = Recording::from_messages(messages)?;
    recording.recorded_at = recorded_at;

    debug!(
        "Decoded MIDI file: {} messages, {:.3}s, {} anomalies",
        recording.messages.len(),
        recording.duration(),
        anomalies.len()
    );

    Ok(DecodedFile {
        recording,
        anomalies,
    })
}

/// Import from file
pub fn import<P: AsRef<Path>>(path: P) -> Result<DecodedFile> {
    let path = path.as_ref();
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read MIDI file: {}", path.display()))?;
    decode(&data).with_context(|| format!("Failed to decode MIDI file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::MessageType;
    use crate::smf::encode;

    /// Wrap a track body in the fixed prefix
    fn file_with_body(body: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"MThd");
        data.extend_from_slice(&[0, 0, 0, 6, 0, 0, 0, 1, 0x03, 0xE8]);
        data.extend_from_slice(b"MTrk");
        data.extend_from_slice(&(body.len() as u32).to_be_bytes());
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn test_round_trip_single_note() {
        let original = Recording::from_messages(vec![
            Message::note_on(60, 64, 0.0),
            Message::note_off(60, 64, 0.5),
        ])
        .unwrap()
        .with_recorded_at("Mon Mar 04 2024 10:15:00 GMT");

        let decoded = decode(&encode(&original)).unwrap();

        assert!(decoded.anomalies.is_empty());
        assert_eq!(decoded.recording.messages, original.messages);
        assert_eq!(
            decoded.recording.recorded_at.as_deref(),
            Some("Mon Mar 04 2024 10:15:00 GMT")
        );
        assert_eq!(decoded.recording.metadata, original.metadata);
    }

    #[test]
    fn test_times_quantized_to_milliseconds() {
        let original = Recording::from_messages(vec![
            Message::note_on(72, 90, 0.0123),
            Message::pedal_on(0.2567),
            Message::note_off(72, 0, 1.98765),
            Message::pedal_off(2.5),
        ])
        .unwrap();

        let decoded = decode(&encode(&original)).unwrap().recording;

        assert_eq!(decoded.messages.len(), original.messages.len());
        for (a, b) in decoded.messages.iter().zip(original.messages.iter()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.pitch, b.pitch);
            assert_eq!(a.velocity, b.velocity);
            assert!((a.time - b.time).abs() <= 0.001);
        }
    }

    #[test]
    fn test_missing_timestamp_stays_none() {
        let original = Recording::from_messages(vec![Message::note_on(60, 1, 0.0)]).unwrap();
        let decoded = decode(&encode(&original)).unwrap();
        assert!(decoded.recording.recorded_at.is_none());
    }

    #[test]
    fn test_short_buffer() {
        assert_eq!(
            decode(b"MThd").unwrap_err(),
            RecordingError::TruncatedFile { len: 4 }
        );
    }

    #[test]
    fn test_bad_chunk_ids() {
        let mut data = file_with_body(&[0x00, 0x90, 60, 64]);
        data[14..18].copy_from_slice(b"XXXX");
        assert_eq!(
            decode(&data).unwrap_err(),
            RecordingError::InvalidHeader { expected: "MTrk" }
        );

        data[0..4].copy_from_slice(b"RIFF");
        assert_eq!(
            decode(&data).unwrap_err(),
            RecordingError::InvalidHeader { expected: "MThd" }
        );
    }

    #[rustfmt::skip]
    #[test]
    fn test_pedal_threshold() {
        let data = file_with_body(&[
            0x00, 0xB0, 0x40, 65,
            0x0A, 0xB0, 0x40, 64,
            0x0A, 0xB0, 0x40, 0x7F,
            0x0A, 0xB0, 0x40, 0x00,
        ]);
        let kinds: Vec<MessageType> = decode(&data)
            .unwrap()
            .recording
            .messages
            .iter()
            .map(|m| m.kind)
            .collect();

        assert_eq!(
            kinds,
            vec![
                MessageType::PedalOn,
                MessageType::PedalOff,
                MessageType::PedalOn,
                MessageType::PedalOff,
            ]
        );
    }

    #[rustfmt::skip]
    #[test]
    fn test_other_controllers_skipped() {
        let data = file_with_body(&[
            0x00, 0xB0, 0x07, 100,
            0x00, 0x90, 60, 64,
        ]);
        let decoded = decode(&data).unwrap();
        assert_eq!(decoded.recording.messages, vec![Message::note_on(60, 64, 0.0)]);
    }

    #[rustfmt::skip]
    #[test]
    fn test_unknown_event_keeps_partial_result() {
        let data = file_with_body(&[
            0x00, 0x90, 60, 64,
            0x83, 0x74, 0x80, 60, 0,
            0x00, 0xE0, 0x00, 0x40,
            0x00, 0x90, 62, 64,
        ]);
        let decoded = decode(&data).unwrap();

        assert_eq!(decoded.recording.messages.len(), 2);
        assert_eq!(decoded.recording.duration(), 0.5);
        assert_eq!(
            decoded.anomalies,
            vec![Anomaly::UnknownEvent { status: 0xE0, offset: 22 + 10 }]
        );
    }

    #[test]
    fn test_truncated_event_reported() {
        let data = file_with_body(&[0x00, 0x90, 60, 64, 0x00, 0x80, 60]);
        let decoded = decode(&data).unwrap();

        assert_eq!(decoded.recording.messages.len(), 1);
        assert_eq!(
            decoded.anomalies,
            vec![Anomaly::TruncatedEvent { status: 0x80, offset: 22 + 5 }]
        );
    }

    #[test]
    fn test_truncated_delta_is_fatal() {
        let data = file_with_body(&[0x00, 0x90, 60, 64, 0x81]);
        assert_eq!(
            decode(&data).unwrap_err(),
            RecordingError::TruncatedVlq { offset: 22 + 4 }
        );
    }

    #[test]
    fn test_end_of_buffer_without_end_of_track() {
        let data = file_with_body(&[0x00, 0x90, 60, 64, 0x0A]);
        let decoded = decode(&data).unwrap();

        assert_eq!(decoded.recording.messages.len(), 1);
        assert!(decoded.anomalies.is_empty());
    }

    #[test]
    fn test_bytes_after_end_of_track_ignored() {
        let data = file_with_body(&[
            0x00, 0x90, 60, 64, 0x00, 0xFF, 0x2F, 0x00, 0x00, 0x90, 61, 64,
        ]);
        let decoded = decode(&data).unwrap();
        assert_eq!(decoded.recording.messages.len(), 1);
    }

    #[test]
    fn test_meta_only_file_is_empty() {
        let data = file_with_body(&[0x00, 0xFF, 0x03, 0x01, 0x00, 0x00, 0xFF, 0x2F, 0x00]);
        assert_eq!(decode(&data).unwrap_err(), RecordingError::EmptyRecording);
    }

    #[test]
    fn test_unrelated_text_event_ignored() {
        let mut body = vec![0x00, 0xFF, 0x01, 0x0B];
        body.extend_from_slice(b"hello: moon");
        body.extend_from_slice(&[0x00, 0x90, 60, 64]);

        let decoded = decode(&file_with_body(&body)).unwrap();
        assert!(decoded.recording.recorded_at.is_none());
        assert_eq!(decoded.recording.messages.len(), 1);
    }

    #[test]
    fn test_import_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mid");
        std::fs::write(&path, b"MThd").unwrap();

        let err = import(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.mid"));
        assert!(format!("{:#}", err).contains("too short"));
    }
}

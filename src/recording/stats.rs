// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Statistics derived from a message stream.

use super::{Message, MessageType, RecordingMetadata};
use crate::error::RecordingError;

/// Check whether a message counts towards the note statistics.
///
/// Note ons at pitch 0 are pedal-shaped records from the recorder and are
/// left out of the histograms and velocity figures.
fn is_counted_note(message: &Message) -> bool {
    message.kind == MessageType::NoteOn && message.pitch > 0
}

/// Derive metadata from a finished message stream.
///
/// With no counted notes the histograms stay zero and both velocity
/// figures are 0.
pub fn compute_metadata(messages: &[Message]) -> Result<RecordingMetadata, RecordingError> {
    let last = messages.last().ok_or(RecordingError::EmptyRecording)?;

    let mut semitone_counts = [0u32; 12];
    let mut pitch_counts = vec![0u32; 128];
    let mut velocity_sum = 0.0;
    let mut note_count = 0usize;

    for message in messages.iter().filter(|m| is_counted_note(m)) {
        let pitch = (message.pitch & 0x7F) as usize;
        semitone_counts[pitch % 12] += 1;
        pitch_counts[pitch] += 1;
        velocity_sum += message.velocity as f64;
        note_count += 1;
    }

    let mut metadata = RecordingMetadata {
        duration: last.time,
        pitch_counts,
        note_count,
        message_count: messages.len(),
        ..RecordingMetadata::default()
    };

    if note_count == 0 {
        return Ok(metadata);
    }

    let count = note_count as f64;
    for (fraction, &hits) in metadata.semitones.iter_mut().zip(semitone_counts.iter()) {
        *fraction = hits as f64 / count;
    }

    let average = velocity_sum / count;
    let squared_error: f64 = messages
        .iter()
        .filter(|m| is_counted_note(m))
        .map(|m| {
            let diff = m.velocity as f64 - average;
            diff * diff
        })
        .sum();

    metadata.average_velocity = average;
    metadata.velocity_spread = (squared_error / count).sqrt();

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_note() {
        let messages = vec![
            Message::note_on(60, 64, 0.0),
            Message::note_off(60, 64, 0.5),
        ];
        let meta = compute_metadata(&messages).unwrap();

        assert_eq!(meta.duration, 0.5);
        assert_eq!(meta.average_velocity, 64.0);
        assert_eq!(meta.velocity_spread, 0.0);
        assert_eq!(meta.semitones[0], 1.0);
        assert!(meta.semitones[1..].iter().all(|&s| s == 0.0));
        assert_eq!(meta.pitch_counts[60], 1);
        assert_eq!(meta.note_count, 1);
    }

    #[test]
    fn test_empty_fails() {
        assert_eq!(compute_metadata(&[]), Err(RecordingError::EmptyRecording));
    }

    #[test]
    fn test_no_notes_is_all_zero() {
        let messages = vec![Message::pedal_on(0.0), Message::pedal_off(2.0)];
        let meta = compute_metadata(&messages).unwrap();

        assert_eq!(meta.duration, 2.0);
        assert!(meta.semitones.iter().all(|&s| s == 0.0));
        assert!(meta.pitch_counts.iter().all(|&c| c == 0));
        assert_eq!(meta.average_velocity, 0.0);
        assert_eq!(meta.velocity_spread, 0.0);
        assert!(!meta.average_velocity.is_nan());
    }

    #[test]
    fn test_pitch_zero_note_on_excluded() {
        let messages = vec![
            Message::note_on(0, 127, 0.0),
            Message::note_on(67, 40, 0.1),
        ];
        let meta = compute_metadata(&messages).unwrap();

        assert_eq!(meta.note_count, 1);
        assert_eq!(meta.pitch_counts[0], 0);
        assert_eq!(meta.semitones[7], 1.0);
        assert_eq!(meta.average_velocity, 40.0);
    }

    #[test]
    fn test_velocity_spread_is_population_stddev() {
        let messages = vec![
            Message::note_on(60, 40, 0.0),
            Message::note_on(64, 60, 0.1),
            Message::note_on(67, 80, 0.2),
            Message::note_on(72, 100, 0.3),
        ];
        let meta = compute_metadata(&messages).unwrap();

        assert_eq!(meta.average_velocity, 70.0);
        // deviations 30, 10, 10, 30 -> mean square 500
        assert!((meta.velocity_spread - 500f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_semitones_sum_to_one() {
        let messages: Vec<Message> = (21u8..=108)
            .step_by(5)
            .enumerate()
            .map(|(i, pitch)| Message::note_on(pitch, 64, i as f64 * 0.1))
            .collect();
        let meta = compute_metadata(&messages).unwrap();

        let sum: f64 = meta.semitones.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert_eq!(meta.pitch_counts.iter().sum::<u32>() as usize, messages.len());
    }

    #[test]
    fn test_idempotent() {
        let messages = vec![
            Message::note_on(61, 33, 0.0),
            Message::note_on(73, 97, 0.4),
            Message::note_off(61, 0, 0.9),
            Message::note_on(50, 12, 1.3),
        ];
        let first = compute_metadata(&messages).unwrap();
        let second = compute_metadata(&messages).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.velocity_spread.to_bits(),
            second.velocity_spread.to_bits()
        );
    }
}

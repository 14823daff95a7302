// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Real-time replay of recordings.
//!
//! This module provides:
//! - The `Outputs` context holding the currently attached sinks
//! - A frame-driven `PlaybackScheduler` state machine
//! - A `Player` that ties a scheduler to its outputs
//!
//! Nothing here owns a clock. The caller drives every frame with a
//! monotonic millisecond timestamp.

pub mod player;
pub mod scheduler;

pub use player::Player;
pub use scheduler::{
    FrameOutcome, PlaybackScheduler, PlaybackStatus, RunToken, LEAD_IN_SECONDS, TAIL_SECONDS,
};

use anyhow::Result;
use tracing::{trace, warn};

use crate::audio::Synthesizer;
use crate::midi::{messages, MidiOutput};
use crate::music::note_name;
use crate::recording::{Message, MessageType};

/// Sinks a frame dispatches into.
///
/// Either sink may be absent or swapped between frames; the scheduler looks
/// them up on every dispatch.
#[derive(Default)]
pub struct Outputs {
    /// External instrument
    pub midi: Option<Box<dyn MidiOutput>>,
    /// Software piano
    pub synth: Option<Box<dyn Synthesizer>>,
    /// MIDI channel (0-15)
    pub channel: u8,
}

impl Outputs {
    /// No sinks, channel 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a MIDI sink
    pub fn with_midi(mut self, midi: Box<dyn MidiOutput>) -> Self {
        self.midi = Some(midi);
        self
    }

    /// Attach a synth sink
    pub fn with_synth(mut self, synth: Box<dyn Synthesizer>) -> Self {
        self.synth = Some(synth);
        self
    }

    /// Set the MIDI channel (0-15)
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel & 0x0F;
        self
    }

    /// Check if no sink is attached
    pub fn is_empty(&self) -> bool {
        self.midi.is_none() && self.synth.is_none()
    }

    /// Send one message to every attached sink.
    ///
    /// A failing sink is logged and skipped; the other sink still receives
    /// the message.
    pub fn dispatch(&mut self, message: &Message) {
        trace!(
            "{:?} {} vel {} at {:.3}s",
            message.kind,
            note_name(message.pitch),
            message.velocity,
            message.time
        );

        let channel = self.channel;

        if let Some(midi) = self.midi.as_deref_mut() {
            if let Err(e) = send_midi(midi, channel, message) {
                warn!("MIDI output failed for {:?}: {:#}", message.kind, e);
            }
        }

        if let Some(synth) = self.synth.as_deref_mut() {
            if let Err(e) = send_synth(synth, message) {
                warn!("Synth failed for {:?}: {:#}", message.kind, e);
            }
        }
    }

    /// Release every key and the pedal on every attached sink
    pub fn silence(&mut self) {
        let channel = self.channel;

        if let Some(midi) = self.midi.as_deref_mut() {
            let mut failures = (0..=127u8)
                .filter(|&pitch| midi.stop_note(pitch, channel).is_err())
                .count();
            if midi
                .send_control_change(channel, messages::SUSTAIN_PEDAL, 0)
                .is_err()
            {
                failures += 1;
            }
            if failures > 0 {
                warn!("MIDI output rejected {} stop messages", failures);
            }
        }

        if let Some(synth) = self.synth.as_deref_mut() {
            let mut failures = (0..=127u8)
                .filter(|&pitch| synth.key_up(pitch).is_err())
                .count();
            if synth.pedal_up().is_err() {
                failures += 1;
            }
            if let Err(e) = synth.stop_all() {
                warn!("Synth stop all failed: {:#}", e);
            }
            if failures > 0 {
                warn!("Synth rejected {} stop messages", failures);
            }
        }
    }
}

fn send_midi(midi: &mut dyn MidiOutput, channel: u8, message: &Message) -> Result<()> {
    match message.kind {
        MessageType::NoteOn => midi.play_note(message.pitch, channel, message.velocity),
        MessageType::NoteOff => midi.stop_note(message.pitch, channel),
        MessageType::PedalOn => {
            // Release first so a repeated press re-articulates
            midi.send_control_change(channel, messages::SUSTAIN_PEDAL, 0)?;
            midi.send_control_change(channel, messages::SUSTAIN_PEDAL, 127)
        }
        MessageType::PedalOff => midi.send_control_change(channel, messages::SUSTAIN_PEDAL, 0),
    }
}

fn send_synth(synth: &mut dyn Synthesizer, message: &Message) -> Result<()> {
    match message.kind {
        MessageType::NoteOn => synth.key_down(message.pitch, message.velocity),
        MessageType::NoteOff => synth.key_up(message.pitch),
        MessageType::PedalOn => {
            synth.pedal_up()?;
            synth.pedal_down()
        }
        MessageType::PedalOff => synth.pedal_up(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tests::{MockSynth, SynthCall};
    use crate::midi::tests::MockMidiOutput;

    fn both_sinks() -> (Outputs, MockMidiOutput, MockSynth) {
        let midi = MockMidiOutput::new();
        let synth = MockSynth::new();
        let outputs = Outputs::new()
            .with_midi(Box::new(midi.clone()))
            .with_synth(Box::new(synth.clone()));
        (outputs, midi, synth)
    }

    #[test]
    fn test_dispatch_notes() {
        let (mut outputs, midi, synth) = both_sinks();

        outputs.dispatch(&Message::note_on(60, 80, 0.0));
        outputs.dispatch(&Message::note_off(60, 0, 0.5));

        assert_eq!(midi.get_messages(), vec![vec![0x90, 60, 80], vec![0x80, 60, 0]]);
        assert_eq!(
            synth.calls(),
            vec![SynthCall::KeyDown(60, 80), SynthCall::KeyUp(60)]
        );
    }

    #[test]
    fn test_pedal_on_retriggers() {
        let (mut outputs, midi, synth) = both_sinks();

        outputs.dispatch(&Message::pedal_on(1.0));
        outputs.dispatch(&Message::pedal_off(2.0));

        assert_eq!(
            midi.get_messages(),
            vec![vec![0xB0, 0x40, 0], vec![0xB0, 0x40, 127], vec![0xB0, 0x40, 0]]
        );
        assert_eq!(
            synth.calls(),
            vec![SynthCall::PedalUp, SynthCall::PedalDown, SynthCall::PedalUp]
        );
    }

    #[test]
    fn test_channel_applied() {
        let midi = MockMidiOutput::new();
        let mut outputs = Outputs::new()
            .with_midi(Box::new(midi.clone()))
            .with_channel(9);

        outputs.dispatch(&Message::note_on(36, 100, 0.0));
        assert_eq!(midi.get_messages(), vec![vec![0x99, 36, 100]]);
    }

    #[test]
    fn test_failing_sink_does_not_block_other() {
        let synth = MockSynth::new();
        let mut outputs = Outputs::new()
            .with_midi(Box::new(MockMidiOutput::failing()))
            .with_synth(Box::new(synth.clone()));

        outputs.dispatch(&Message::note_on(60, 80, 0.0));
        outputs.silence();

        assert_eq!(synth.calls()[0], SynthCall::KeyDown(60, 80));
    }

    #[test]
    fn test_no_sinks_is_noop() {
        let mut outputs = Outputs::new();
        assert!(outputs.is_empty());
        outputs.dispatch(&Message::note_on(60, 80, 0.0));
        outputs.silence();
    }

    #[test]
    fn test_silence_sweeps_every_pitch() {
        let (mut outputs, midi, synth) = both_sinks();

        outputs.silence();

        let sent = midi.get_messages();
        assert_eq!(sent.len(), 129);
        for (pitch, message) in sent.iter().take(128).enumerate() {
            assert_eq!(message, &vec![0x80, pitch as u8, 0]);
        }
        assert_eq!(sent[128], vec![0xB0, 0x40, 0]);

        let calls = synth.calls();
        assert_eq!(calls.len(), 130);
        assert_eq!(calls[0], SynthCall::KeyUp(0));
        assert_eq!(calls[127], SynthCall::KeyUp(127));
        assert_eq!(calls[128], SynthCall::PedalUp);
        assert_eq!(calls[129], SynthCall::StopAll);
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI output abstraction layer.
//!
//! This module provides a trait-based abstraction for MIDI output so the
//! playback scheduler can drive a hardware device, or a test double, through
//! the same calls. The `midi-device` feature adds a midir backend.

#[cfg(feature = "midi-device")]
pub mod midir_backend;

use anyhow::Result;

#[cfg(feature = "midi-device")]
pub use midir_backend::{list_destinations, print_destinations, MidirOutput};

/// Trait for MIDI output implementations.
///
/// Only [`MidiOutput::send`] is required; the channel voice helpers build
/// their raw bytes on top of it. Channels are 0-15.
pub trait MidiOutput: Send {
    /// Send a MIDI message immediately.
    ///
    /// # Arguments
    /// * `message` - Raw MIDI bytes (e.g., `[0x90, 60, 127]` for Note On)
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if the message could not be sent
    fn send(&mut self, message: &[u8]) -> Result<()>;

    /// Start a note
    fn play_note(&mut self, pitch: u8, channel: u8, velocity: u8) -> Result<()> {
        self.send(&[
            messages::NOTE_ON | (channel & 0x0F),
            pitch & 0x7F,
            velocity & 0x7F,
        ])
    }

    /// Release a note
    fn stop_note(&mut self, pitch: u8, channel: u8) -> Result<()> {
        self.send(&[messages::NOTE_OFF | (channel & 0x0F), pitch & 0x7F, 0])
    }

    /// Send a control change
    fn send_control_change(&mut self, channel: u8, controller: u8, value: u8) -> Result<()> {
        self.send(&[
            messages::CONTROL_CHANGE | (channel & 0x0F),
            controller & 0x7F,
            value & 0x7F,
        ])
    }
}

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;

    // Controllers
    pub const SUSTAIN_PEDAL: u8 = 0x40;
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Software piano sink.
//!
//! This module provides:
//! - The `Synthesizer` trait the playback scheduler drives
//! - FluidSynth integration for software synthesis (`synth` feature)
//! - Audio output via cpal (`synth` feature)

#[cfg(feature = "synth")]
mod engine;
#[cfg(feature = "synth")]
pub mod fluidsynth;
#[cfg(feature = "synth")]
pub mod output;

#[cfg(feature = "synth")]
pub use engine::AudioEngine;
#[cfg(feature = "synth")]
pub use fluidsynth::FluidSynth;
#[cfg(feature = "synth")]
pub use output::{AudioConfig, AudioOutput};

use anyhow::Result;
use thiserror::Error;

/// A keyboard-shaped instrument.
///
/// Unlike [`crate::midi::MidiOutput`] there is no channel: the synthesizer
/// is a single piano. Implementations need not be `Send` since audio streams
/// are pinned to the thread that opened them.
pub trait Synthesizer {
    /// Press a key
    fn key_down(&mut self, note: u8, velocity: u8) -> Result<()>;

    /// Release a key
    fn key_up(&mut self, note: u8) -> Result<()>;

    /// Press the sustain pedal
    fn pedal_down(&mut self) -> Result<()>;

    /// Release the sustain pedal
    fn pedal_up(&mut self) -> Result<()>;

    /// Silence every sounding voice
    fn stop_all(&mut self) -> Result<()>;
}

/// Audio error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    /// Failed to initialize audio
    #[error("Audio initialization failed: {0}")]
    InitFailed(String),
    /// Failed to load soundfont
    #[error("Soundfont load failed: {0}")]
    SoundfontLoadFailed(String),
    /// Failed to start audio stream
    #[error("Audio stream failed: {0}")]
    StreamFailed(String),
    /// Synth rejected an event
    #[error("Synth event failed: {0}")]
    EventFailed(String),
    /// Failed to acquire lock
    #[error("Failed to acquire audio lock")]
    LockFailed,
    /// No audio device available
    #[error("No audio device available")]
    NoDevice,
}

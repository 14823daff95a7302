// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! FluidSynth integration for software synthesis.
//!
//! Provides a wrapper around FluidLite for SF2 piano playback.

use fluidlite::{IsSettings, Settings, Synth};
use std::path::Path;

use super::AudioError;
use crate::midi::messages;

/// CC 120
const ALL_SOUND_OFF: u32 = 120;
/// CC 123
const ALL_NOTES_OFF: u32 = 123;

/// FluidSynth wrapper for software synthesis
pub struct FluidSynth {
    /// FluidLite synth instance
    synth: Synth,
    /// Current gain (0.0 - 1.0)
    gain: f32,
    /// Loaded soundfont ID
    soundfont_id: Option<u32>,
    /// Sample rate
    sample_rate: f64,
}

fn event_error(what: &str, err: impl std::fmt::Debug) -> AudioError {
    AudioError::EventFailed(format!("{}: {:?}", what, err))
}

impl FluidSynth {
    /// Create with the given sample rate
    pub fn with_sample_rate(sample_rate: f64) -> Result<Self, AudioError> {
        let settings = Settings::new()
            .map_err(|e| AudioError::InitFailed(format!("FluidLite settings: {:?}", e)))?;

        if let Some(setting) = settings.num("synth.sample-rate") {
            setting.set(sample_rate);
        }
        if let Some(setting) = settings.num("synth.gain") {
            setting.set(0.5);
        }
        if let Some(setting) = settings.int("synth.polyphony") {
            setting.set(256);
        }

        let synth = Synth::new(settings)
            .map_err(|e| AudioError::InitFailed(format!("FluidLite synth: {:?}", e)))?;

        // Dry piano keeps latency down
        synth.set_reverb_on(false);
        synth.set_chorus_on(false);

        Ok(Self {
            synth,
            gain: 0.5,
            soundfont_id: None,
            sample_rate,
        })
    }

    /// Load a soundfont file
    pub fn load_soundfont(&mut self, path: &str) -> Result<(), AudioError> {
        if !Path::new(path).exists() {
            return Err(AudioError::SoundfontLoadFailed(format!(
                "Soundfont file not found: {}",
                path
            )));
        }

        // Unload previous soundfont if any
        if let Some(id) = self.soundfont_id.take() {
            let _ = self.synth.sfunload(id, true);
        }

        let id = self.synth.sfload(path, true).map_err(|_| {
            AudioError::SoundfontLoadFailed(format!("Failed to load soundfont: {}", path))
        })?;
        self.soundfont_id = Some(id);
        Ok(())
    }

    /// Check if a soundfont is loaded
    pub fn has_soundfont(&self) -> bool {
        self.soundfont_id.is_some()
    }

    /// Render audio to buffer (interleaved)
    pub fn render(&mut self, buffer: &mut [f32], channels: usize) {
        match channels {
            2 => {
                let _ = self.synth.write(&mut *buffer);
                for sample in buffer.iter_mut() {
                    *sample *= self.gain;
                }
            }
            1 => {
                // Render stereo then mix down
                let frames = buffer.len();
                let mut stereo = vec![0.0f32; frames * 2];
                let _ = self.synth.write(stereo.as_mut_slice());
                for (i, sample) in buffer.iter_mut().enumerate() {
                    *sample = (stereo[i * 2] + stereo[i * 2 + 1]) * 0.5 * self.gain;
                }
            }
            _ => {}
        }
    }

    /// Send note on
    pub fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), AudioError> {
        self.synth
            .note_on(channel as u32, note as u32, velocity as u32)
            .map_err(|e| event_error("note on", e))
    }

    /// Send note off
    pub fn note_off(&mut self, channel: u8, note: u8) -> Result<(), AudioError> {
        // FluidLite reports releasing a silent key as an error
        let _ = self.synth.note_off(channel as u32, note as u32);
        Ok(())
    }

    /// Send control change
    pub fn control_change(
        &mut self,
        channel: u8,
        control: u8,
        value: u8,
    ) -> Result<(), AudioError> {
        self.synth
            .cc(channel as u32, control as u32, value as u32)
            .map_err(|e| event_error("control change", e))
    }

    /// Set the sustain pedal
    pub fn sustain(&mut self, channel: u8, down: bool) -> Result<(), AudioError> {
        self.control_change(channel, messages::SUSTAIN_PEDAL, if down { 127 } else { 0 })
    }

    /// All notes off on all channels
    pub fn all_notes_off(&mut self) -> Result<(), AudioError> {
        for channel in 0..16 {
            self.synth
                .cc(channel, ALL_NOTES_OFF, 0)
                .and_then(|_| self.synth.cc(channel, ALL_SOUND_OFF, 0))
                .map_err(|e| event_error("all notes off", e))?;
        }
        Ok(())
    }

    /// Set master gain (0.0 - 1.0)
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }

    /// Get current gain
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Get sample rate
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

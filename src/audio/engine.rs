// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! FluidSynth rendered through cpal, exposed as a [`Synthesizer`].

use std::sync::{Arc, Mutex};

use anyhow::Result;
use tracing::info;

use super::{AudioConfig, AudioError, AudioOutput, FluidSynth, Synthesizer};
use crate::config::PlayerConfig;

/// Audio engine combining synth and output
pub struct AudioEngine {
    synth: Arc<Mutex<FluidSynth>>,
    output: Option<AudioOutput>,
    /// Synth channel the piano plays on
    channel: u8,
    sample_rate: u32,
    buffer_size: u32,
}

impl AudioEngine {
    /// Create a stopped engine
    pub fn new(sample_rate: u32) -> Result<Self, AudioError> {
        Ok(Self {
            synth: Arc::new(Mutex::new(FluidSynth::with_sample_rate(sample_rate as f64)?)),
            output: None,
            channel: 0,
            sample_rate,
            buffer_size: 512,
        })
    }

    /// Build and start an engine from player settings
    pub fn from_config(config: &PlayerConfig) -> Result<Self, AudioError> {
        let mut engine = Self::new(config.sample_rate)?;
        engine.set_buffer_size(config.buffer_size);
        engine.set_volume(config.gain)?;
        if let Some(ref path) = config.soundfont {
            engine.load_soundfont(path)?;
        }
        engine.start()?;
        Ok(engine)
    }

    fn with_synth<T>(
        &self,
        f: impl FnOnce(&mut FluidSynth) -> Result<T, AudioError>,
    ) -> Result<T, AudioError> {
        let mut synth = self.synth.lock().map_err(|_| AudioError::LockFailed)?;
        f(&mut synth)
    }

    /// Load a soundfont
    pub fn load_soundfont(&mut self, path: &str) -> Result<(), AudioError> {
        self.with_synth(|synth| synth.load_soundfont(path))?;
        info!("Loaded soundfont {}", path);
        Ok(())
    }

    /// Start audio output
    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.output.is_some() {
            return Ok(());
        }

        let config = AudioConfig {
            sample_rate: self.sample_rate,
            buffer_size: self.buffer_size,
            channels: 2,
        };

        let synth = Arc::clone(&self.synth);
        let output = AudioOutput::new(config, move |buffer, channels| {
            if let Ok(mut synth) = synth.lock() {
                synth.render(buffer, channels);
            }
        })?;

        self.output = Some(output);
        Ok(())
    }

    /// Stop audio output
    pub fn stop(&mut self) {
        self.output = None;
    }

    /// Check if running
    pub fn is_running(&self) -> bool {
        self.output.is_some()
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_volume(&self, volume: f32) -> Result<(), AudioError> {
        self.with_synth(|synth| {
            synth.set_gain(volume);
            Ok(())
        })
    }

    /// Get sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Set buffer size (requires restart)
    pub fn set_buffer_size(&mut self, size: u32) {
        self.buffer_size = size.clamp(64, 4096);
    }
}

impl Synthesizer for AudioEngine {
    fn key_down(&mut self, note: u8, velocity: u8) -> Result<()> {
        let channel = self.channel;
        Ok(self.with_synth(|synth| synth.note_on(channel, note, velocity))?)
    }

    fn key_up(&mut self, note: u8) -> Result<()> {
        let channel = self.channel;
        Ok(self.with_synth(|synth| synth.note_off(channel, note))?)
    }

    fn pedal_down(&mut self) -> Result<()> {
        let channel = self.channel;
        Ok(self.with_synth(|synth| synth.sustain(channel, true))?)
    }

    fn pedal_up(&mut self) -> Result<()> {
        let channel = self.channel;
        Ok(self.with_synth(|synth| synth.sustain(channel, false))?)
    }

    fn stop_all(&mut self) -> Result<()> {
        Ok(self.with_synth(|synth| synth.all_notes_off())?)
    }
}

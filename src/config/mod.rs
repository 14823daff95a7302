// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Player configuration.
//!
//! Output sinks and the frame clock are configured from a small YAML file:
//!
//! ```yaml
//! midi_output: "Digital Piano"
//! midi_channel: 1
//! soundfont: "/usr/share/sounds/sf2/piano.sf2"
//! gain: 0.6
//! frame_rate: 60
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Playback settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerConfig {
    /// Partial name of the MIDI destination to open
    #[serde(default)]
    pub midi_output: Option<String>,
    /// MIDI channel (1-16)
    #[serde(default = "default_channel")]
    pub midi_channel: u8,
    /// SF2 soundfont for the software piano
    #[serde(default)]
    pub soundfont: Option<String>,
    /// Sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Audio buffer size in frames
    #[serde(default = "default_buffer_size")]
    pub buffer_size: u32,
    /// Synth gain (0.0 - 1.0)
    #[serde(default = "default_gain")]
    pub gain: f32,
    /// Frame callbacks per second
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

fn default_channel() -> u8 {
    1
}
fn default_sample_rate() -> u32 {
    44100
}
fn default_buffer_size() -> u32 {
    512
}
fn default_gain() -> f32 {
    0.5
}
fn default_frame_rate() -> u32 {
    60
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            midi_output: None,
            midi_channel: default_channel(),
            soundfont: None,
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            gain: default_gain(),
            frame_rate: default_frame_rate(),
        }
    }
}

impl PlayerConfig {
    /// Load a player configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a player configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Describe every out-of-range setting
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if !(1..=16).contains(&self.midi_channel) {
            problems.push(format!(
                "midi_channel must be 1-16, got {}",
                self.midi_channel
            ));
        }
        if !(8000..=192_000).contains(&self.sample_rate) {
            problems.push(format!(
                "sample_rate must be 8000-192000 Hz, got {}",
                self.sample_rate
            ));
        }
        if !(64..=4096).contains(&self.buffer_size) {
            problems.push(format!(
                "buffer_size must be 64-4096 frames, got {}",
                self.buffer_size
            ));
        }
        if !(0.0..=1.0).contains(&self.gain) {
            problems.push(format!("gain must be 0.0-1.0, got {}", self.gain));
        }
        if !(1..=1000).contains(&self.frame_rate) {
            problems.push(format!(
                "frame_rate must be 1-1000 per second, got {}",
                self.frame_rate
            ));
        }

        problems
    }

    /// Zero-based MIDI channel for the wire
    pub fn channel_index(&self) -> u8 {
        self.midi_channel.clamp(1, 16) - 1
    }

    /// Time between frame callbacks
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.frame_rate.max(1) as u64)
    }
}

/// Load a configuration file and reject it if any setting is out of range
pub fn validate_config<P: AsRef<Path>>(path: P) -> Result<PlayerConfig> {
    let config = PlayerConfig::load(path.as_ref())?;
    let problems = config.validate();
    if !problems.is_empty() {
        bail!(
            "Invalid config file {:?}: {}",
            path.as_ref(),
            problems.join("; ")
        );
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = PlayerConfig::from_yaml("{}").unwrap();
        assert_eq!(config, PlayerConfig::default());
        assert_eq!(config.midi_channel, 1);
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.buffer_size, 512);
        assert_eq!(config.frame_rate, 60);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_parse_player_config() {
        let yaml = r#"
midi_output: "Digital Piano"
midi_channel: 3
soundfont: "piano.sf2"
gain: 0.8
"#;
        let config = PlayerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.midi_output.as_deref(), Some("Digital Piano"));
        assert_eq!(config.midi_channel, 3);
        assert_eq!(config.channel_index(), 2);
        assert_eq!(config.soundfont.as_deref(), Some("piano.sf2"));
        assert!((config.gain - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let config = PlayerConfig {
            midi_channel: 0,
            gain: 1.5,
            frame_rate: 0,
            ..PlayerConfig::default()
        };
        let problems = config.validate();
        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("midi_channel"));
        assert!(problems[1].contains("gain"));
        assert!(problems[2].contains("frame_rate"));
    }

    #[test]
    fn test_frame_interval() {
        let config = PlayerConfig {
            frame_rate: 50,
            ..PlayerConfig::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_millis(20));

        let config = PlayerConfig {
            frame_rate: 0,
            ..PlayerConfig::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("player.yaml");

        let config = PlayerConfig {
            midi_output: Some("IAC".to_string()),
            midi_channel: 10,
            ..PlayerConfig::default()
        };
        config.save(&path).unwrap();

        assert_eq!(PlayerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_validate_config() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.yaml");
        let bad = dir.path().join("bad.yaml");
        let broken = dir.path().join("broken.yaml");

        fs::write(&good, "midi_channel: 16\n").unwrap();
        fs::write(&bad, "midi_channel: 17\n").unwrap();
        fs::write(&broken, "this is not valid yaml: [").unwrap();

        assert_eq!(validate_config(&good).unwrap().midi_channel, 16);
        assert!(validate_config(&bad)
            .unwrap_err()
            .to_string()
            .contains("midi_channel"));
        assert!(validate_config(&broken).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = PlayerConfig::load("/nonexistent/player.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}

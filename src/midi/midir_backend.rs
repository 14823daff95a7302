// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Cross-platform MIDI backend.
//!
//! This module provides a midir implementation of the `MidiOutput` trait,
//! allowing recordings to be played on an external instrument.

use anyhow::{anyhow, Result};
use midir::{MidiOutput as MidirClient, MidiOutputConnection};

use super::MidiOutput;

const CLIENT_NAME: &str = "recital";

/// midir output connected to one destination
pub struct MidirOutput {
    connection: MidiOutputConnection,
    name: String,
}

impl MidirOutput {
    /// Create a new output connected to the specified destination.
    ///
    /// # Arguments
    /// * `destination_index` - Index of the destination in the system's MIDI device list
    ///
    /// # Returns
    /// * `Ok(MidirOutput)` on success
    /// * `Err` if the client or connection could not be created
    pub fn new(destination_index: usize) -> Result<Self> {
        let client = MidirClient::new(CLIENT_NAME)
            .map_err(|e| anyhow!("Failed to create MIDI client: {}", e))?;

        let ports = client.ports();
        let port = ports.get(destination_index).ok_or_else(|| {
            anyhow!(
                "MIDI destination {} not found (only {} available)",
                destination_index,
                ports.len()
            )
        })?;

        let name = client
            .port_name(port)
            .unwrap_or_else(|_| format!("Unknown {}", destination_index));

        let connection = client
            .connect(port, "recital-output")
            .map_err(|e| anyhow!("Failed to connect to MIDI destination '{}': {}", name, e))?;

        Ok(Self { connection, name })
    }

    /// Create a new output connected to a destination by name.
    ///
    /// # Arguments
    /// * `name` - Partial name to match against destination names
    ///
    /// # Returns
    /// * `Ok(MidirOutput)` on success
    /// * `Err` if no matching destination is found
    pub fn new_by_name(name: &str) -> Result<Self> {
        let needle = name.to_lowercase();
        let (index, _) = list_destinations()
            .into_iter()
            .find(|(_, n)| n.to_lowercase().contains(&needle))
            .ok_or_else(|| anyhow!("No MIDI destination matching '{}' found", name))?;

        Self::new(index)
    }

    /// Name of the connected destination
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl MidiOutput for MidirOutput {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        self.connection
            .send(message)
            .map_err(|e| anyhow!("Failed to send MIDI message to '{}': {}", self.name, e))
    }
}

/// List all available MIDI destinations.
///
/// # Returns
/// A vector of (index, name) tuples.
pub fn list_destinations() -> Vec<(usize, String)> {
    let Ok(client) = MidirClient::new(CLIENT_NAME) else {
        return Vec::new();
    };

    client
        .ports()
        .iter()
        .enumerate()
        .map(|(i, port)| {
            let name = client
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown {}", i));
            (i, name)
        })
        .collect()
}

/// Print all available MIDI destinations to stdout.
pub fn print_destinations() {
    let destinations = list_destinations();
    if destinations.is_empty() {
        println!("No MIDI destinations found.");
    } else {
        println!("Available MIDI destinations:");
        for (i, name) in destinations {
            println!("  {}: {}", i, name);
        }
    }
}

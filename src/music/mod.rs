// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory utilities.
//!
//! This module provides pitch naming for logs and note listings.

pub mod pitch;

pub use pitch::{note_name, octave, PitchClass};

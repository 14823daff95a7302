// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch names in scientific pitch notation.

use std::fmt;

/// Pitch classes, sharps only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

impl PitchClass {
    /// All pitch classes in chromatic order
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Index 0-11 with C = 0, matching the semitone histogram
    pub fn index(self) -> usize {
        self as usize
    }

    /// Pitch class from an index, wrapping past B
    pub fn from_index(pc: usize) -> Self {
        PitchClass::ALL[pc % 12]
    }

    /// Pitch class of a MIDI note
    pub fn of(pitch: u8) -> Self {
        Self::from_index(pitch as usize)
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Octave number where middle C (60) is octave 4
pub fn octave(pitch: u8) -> i8 {
    (pitch / 12) as i8 - 1
}

/// Name a MIDI note, e.g. 60 -> `C4`, 61 -> `C#4`, 21 -> `A0`
pub fn note_name(pitch: u8) -> String {
    let pitch = pitch & 0x7F;
    format!("{}{}", PitchClass::of(pitch), octave(pitch))
}

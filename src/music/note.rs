// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch classes and semitone transposition.
//!
//! Chord sheets spell notes with sharps, flats, or their unicode forms.
//! Everything is normalized to one of twelve pitch classes and written
//! back out with sharp spelling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semitone offset type. Any integer is accepted; the effective shift is mod 12.
pub type Semitones = i32;

/// Note names (pitch classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Note {
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

/// Flat spellings and their sharp equivalents
const FLAT_TO_SHARP: [(&str, &str); 7] = [
    ("Db", "C#"),
    ("Eb", "D#"),
    ("Gb", "F#"),
    ("Ab", "G#"),
    ("Bb", "A#"),
    ("Cb", "B"),
    ("Fb", "E"),
];

/// Sharp spellings indexed by pitch class, starting at C
const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    /// Get the pitch class (0-11) for this note
    pub fn pitch_class(self) -> u8 {
        self as u8
    }

    /// Get note from pitch class
    pub fn from_pitch_class(pc: u8) -> Self {
        Note::ALL[(pc % 12) as usize]
    }

    /// Parse a note spelling such as "C", "C#", "Db", "F♯" or "B♭".
    ///
    /// The letter must be uppercase; an accidental is optional.
    pub fn parse(spelling: &str) -> Option<Self> {
        let normalized = normalize_accidentals(spelling);
        let sharp = FLAT_TO_SHARP
            .iter()
            .find(|(flat, _)| *flat == normalized)
            .map(|(_, sharp)| *sharp)
            .unwrap_or(normalized.as_str());

        SHARP_NAMES
            .iter()
            .position(|name| *name == sharp)
            .map(|i| Note::ALL[i])
    }

    /// Transpose by semitones
    pub fn transpose(self, semitones: Semitones) -> Self {
        let shifted = ((self.pitch_class() as i32 + semitones % 12) % 12 + 12) % 12;
        Note::from_pitch_class(shifted as u8)
    }

    /// Sharp spelling of this note
    pub fn sharp_name(self) -> &'static str {
        SHARP_NAMES[self.pitch_class() as usize]
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sharp_name())
    }
}

/// Replace unicode accidentals with their ASCII forms.
pub fn normalize_accidentals(spelling: &str) -> String {
    spelling.replace('♯', "#").replace('♭', "b")
}

/// True for the characters that may follow a note letter as an accidental.
pub fn is_accidental(c: char) -> bool {
    matches!(c, '#' | 'b' | '♯' | '♭')
}

/// True for the seven note letters.
pub fn is_note_letter(c: char) -> bool {
    matches!(c, 'A'..='G')
}

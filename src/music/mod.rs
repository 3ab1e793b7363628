// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory utilities.
//!
//! Pitch classes, accidental normalization and semitone transposition
//! used by the chord sheet transposer.

pub mod note;

pub use note::{Note, Semitones};

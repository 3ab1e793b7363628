// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Songs and band roles as seen from the live session.
//!
//! Song records are owned by the band's song library; the session only
//! reads them. Role checks also live outside this crate, but the decision
//! table is exposed here so callers agree on who may lead.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::chart::{self, ParsedLine};
use crate::music::Semitones;
use crate::session::SongId;

/// One section of a song (verse, chorus, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSection {
    pub id: String,
    /// Position within the song, unique per song
    pub index: usize,
    pub name: String,
    /// Raw chord/lyric text
    pub content: String,
    /// Free-text stage note
    #[serde(default)]
    pub cues: Option<String>,
}

impl SongSection {
    /// Render this section transposed by `semitones`
    pub fn render(&self, semitones: Semitones) -> Vec<ParsedLine> {
        chart::classify_and_transpose(&self.content, semitones)
    }
}

/// A persisted song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    /// Key as root plus quality, e.g. "G" or "F#m"
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub sections: Vec<SongSection>,
}

impl Song {
    /// Get the section at `index`, if it exists
    pub fn section(&self, index: usize) -> Option<&SongSection> {
        self.sections.get(index)
    }

    /// Number of sections
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Clamp a section index into range; `None` for a song without sections
    pub fn clamp_section(&self, index: usize) -> Option<usize> {
        if self.sections.is_empty() {
            None
        } else {
            Some(index.min(self.sections.len() - 1))
        }
    }

    /// The song key shifted by `semitones`, spelled with sharps
    pub fn transposed_key(&self, semitones: Semitones) -> String {
        if chart::is_chord_like(&self.key) {
            chart::transpose_chord(&self.key, semitones)
        } else {
            self.key.clone()
        }
    }
}

/// Read access to the band's songs
pub trait SongLibrary: Send + Sync {
    /// Look up a song by id
    fn song(&self, id: &SongId) -> Option<Song>;
}

/// In-memory song library
#[derive(Debug, Clone, Default)]
pub struct MemorySongLibrary {
    songs: Arc<RwLock<HashMap<SongId, Song>>>,
}

impl MemorySongLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a song
    pub fn insert(&self, song: Song) {
        if let Ok(mut songs) = self.songs.write() {
            songs.insert(song.id.clone(), song);
        }
    }
}

impl SongLibrary for MemorySongLibrary {
    fn song(&self, id: &SongId) -> Option<Song> {
        self.songs.read().ok()?.get(id).cloned()
    }
}

/// Member role within a band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandRole {
    Owner,
    Admin,
    Leader,
    Member,
}

/// Whether a role may drive the live session
pub fn can_control_regency(role: BandRole) -> bool {
    matches!(role, BandRole::Owner | BandRole::Admin | BandRole::Leader)
}

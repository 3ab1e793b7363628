// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The shared session record and field-level updates.

use serde::{Deserialize, Serialize};

use super::{CueId, PlaylistId, SongId, Timestamp, UserId};
use crate::music::Semitones;
use crate::song::Song;

/// Scroll parameters replicated to every client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollState {
    pub is_playing: bool,
    /// Index into the speed table, slowest first
    pub speed: usize,
}

/// Where a cue came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueType {
    Preset,
    Custom,
}

/// Short stage message broadcast by the leader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    pub id: CueId,
    #[serde(rename = "type")]
    pub cue_type: CueType,
    pub message: String,
    pub created_at: Timestamp,
}

impl Cue {
    /// Create a cue with a fresh id
    pub fn new(message: impl Into<String>, cue_type: CueType, created_at: Timestamp) -> Self {
        Self {
            id: CueId::new(uuid::Uuid::new_v4().to_string()),
            cue_type,
            message: message.into(),
            created_at,
        }
    }
}

/// Identity of the device driving the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    pub id: UserId,
    pub name: String,
}

impl Leader {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Per-band live session document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegencySession {
    pub is_active: bool,
    pub leader_id: Option<UserId>,
    pub leader_name: Option<String>,
    pub current_song_id: Option<SongId>,
    pub current_section_index: Option<usize>,
    /// Semitones, any integer; the effective shift is mod 12
    #[serde(default)]
    pub transpose_amount: Semitones,
    #[serde(default)]
    pub scroll_state: ScrollState,
    pub cue: Option<Cue>,
    pub playlist_id: Option<PlaylistId>,
    pub updated_at: Timestamp,
}

impl Default for RegencySession {
    /// The inactive rest state
    fn default() -> Self {
        Self {
            is_active: false,
            leader_id: None,
            leader_name: None,
            current_song_id: None,
            current_section_index: None,
            transpose_amount: 0,
            scroll_state: ScrollState::default(),
            cue: None,
            playlist_id: None,
            updated_at: 0,
        }
    }
}

impl RegencySession {
    /// A freshly started session
    pub fn fresh(
        leader: &Leader,
        playlist_id: Option<PlaylistId>,
        initial_song_id: Option<SongId>,
        default_speed: usize,
        now: Timestamp,
    ) -> Self {
        Self {
            is_active: true,
            leader_id: Some(leader.id.clone()),
            leader_name: Some(leader.name.clone()),
            current_section_index: initial_song_id.as_ref().map(|_| 0),
            current_song_id: initial_song_id,
            transpose_amount: 0,
            scroll_state: ScrollState {
                is_playing: false,
                speed: default_speed,
            },
            cue: None,
            playlist_id,
            updated_at: now,
        }
    }

    /// Transposition reduced to 0..12
    pub fn effective_transpose(&self) -> Semitones {
        self.transpose_amount.rem_euclid(12)
    }

    /// Check whether `user` is the recorded leader
    pub fn is_led_by(&self, user: &UserId) -> bool {
        self.leader_id.as_ref() == Some(user)
    }

    /// Current section of `song`, clamped into range.
    ///
    /// `None` when `song` is not the current song, no section is selected,
    /// or the song has no sections.
    pub fn section_for(&self, song: &Song) -> Option<usize> {
        if self.current_song_id.as_ref() != Some(&song.id) {
            return None;
        }
        self.current_section_index
            .and_then(|index| song.clamp_section(index))
    }
}

/// Field-level partial update.
///
/// `None` leaves a field untouched; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionPatch {
    pub is_active: Option<bool>,
    pub leader_id: Option<Option<UserId>>,
    pub leader_name: Option<Option<String>>,
    pub current_song_id: Option<Option<SongId>>,
    pub current_section_index: Option<Option<usize>>,
    pub transpose_amount: Option<Semitones>,
    pub scroll_playing: Option<bool>,
    pub scroll_speed: Option<usize>,
    pub cue: Option<Option<Cue>>,
    pub playlist_id: Option<Option<PlaylistId>>,
    pub updated_at: Option<Timestamp>,
}

impl SessionPatch {
    /// Leadership takeover of a running session
    pub fn takeover(leader: &Leader, now: Timestamp) -> Self {
        Self {
            leader_id: Some(Some(leader.id.clone())),
            leader_name: Some(Some(leader.name.clone())),
            updated_at: Some(now),
            ..Default::default()
        }
    }

    /// Full reset to the inactive rest state
    pub fn end(now: Timestamp) -> Self {
        Self {
            is_active: Some(false),
            leader_id: Some(None),
            leader_name: Some(None),
            current_song_id: Some(None),
            current_section_index: Some(None),
            transpose_amount: Some(0),
            scroll_playing: Some(false),
            scroll_speed: Some(0),
            cue: Some(None),
            updated_at: Some(now),
            ..Default::default()
        }
    }

    /// Switch songs: first section, no transposition, scrolling stopped
    pub fn song(song_id: SongId, now: Timestamp) -> Self {
        Self {
            current_song_id: Some(Some(song_id)),
            current_section_index: Some(Some(0)),
            transpose_amount: Some(0),
            scroll_playing: Some(false),
            updated_at: Some(now),
            ..Default::default()
        }
    }

    pub fn section(index: usize, now: Timestamp) -> Self {
        Self {
            current_section_index: Some(Some(index)),
            updated_at: Some(now),
            ..Default::default()
        }
    }

    pub fn transpose(amount: Semitones, now: Timestamp) -> Self {
        Self {
            transpose_amount: Some(amount),
            updated_at: Some(now),
            ..Default::default()
        }
    }

    pub fn scroll_playing(is_playing: bool, now: Timestamp) -> Self {
        Self {
            scroll_playing: Some(is_playing),
            updated_at: Some(now),
            ..Default::default()
        }
    }

    pub fn scroll_speed(speed: usize, now: Timestamp) -> Self {
        Self {
            scroll_speed: Some(speed),
            updated_at: Some(now),
            ..Default::default()
        }
    }

    pub fn cue(cue: Cue, now: Timestamp) -> Self {
        Self {
            cue: Some(Some(cue)),
            updated_at: Some(now),
            ..Default::default()
        }
    }

    /// Apply the set fields to `session`
    pub fn apply(&self, session: &mut RegencySession) {
        if let Some(is_active) = self.is_active {
            session.is_active = is_active;
        }
        if let Some(leader_id) = &self.leader_id {
            session.leader_id = leader_id.clone();
        }
        if let Some(leader_name) = &self.leader_name {
            session.leader_name = leader_name.clone();
        }
        if let Some(song_id) = &self.current_song_id {
            session.current_song_id = song_id.clone();
        }
        if let Some(index) = self.current_section_index {
            session.current_section_index = index;
        }
        if let Some(amount) = self.transpose_amount {
            session.transpose_amount = amount;
        }
        if let Some(is_playing) = self.scroll_playing {
            session.scroll_state.is_playing = is_playing;
        }
        if let Some(speed) = self.scroll_speed {
            session.scroll_state.speed = speed;
        }
        if let Some(cue) = &self.cue {
            session.cue = cue.clone();
        }
        if let Some(playlist_id) = &self.playlist_id {
            session.playlist_id = playlist_id.clone();
        }
        if let Some(updated_at) = self.updated_at {
            session.updated_at = updated_at;
        }
    }

    /// Return a copy of `session` with the patch applied
    pub fn applied_to(&self, session: &RegencySession) -> RegencySession {
        let mut merged = session.clone();
        self.apply(&mut merged);
        merged
    }
}

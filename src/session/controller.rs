// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Leader-side session actions.
//!
//! The controller keeps an optimistic copy of the session so the leader's
//! UI reacts immediately; whatever the store pushes next replaces it via
//! [`SessionController::observe`]. Each action writes only the fields it
//! owns. Role checks happen before a controller is ever handed to a user.

use tracing::{debug, info, warn};

use super::state::{Cue, CueType, Leader, RegencySession, SessionPatch};
use super::store::SessionStore;
use super::{now_millis, BandId, PlaylistId, SongId, UserId};
use crate::config::RegencyConfig;
use crate::error::{Result, SessionError};
use crate::music::Semitones;
use crate::scroll::SpeedTable;
use crate::song::Song;

/// How a pushed document relates to this leader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderStatus {
    /// Still the recorded leader of an active session
    Leading,
    /// Another device now leads the session
    TakenOver {
        leader_id: Option<UserId>,
        leader_name: Option<String>,
    },
    /// The session is inactive, missing, or unreachable
    Ended,
}

/// Drives the shared session for one band
pub struct SessionController<S: SessionStore> {
    store: S,
    band: BandId,
    leader: Leader,
    speeds: SpeedTable,
    default_speed: usize,
    presets: Vec<String>,
    local: Option<RegencySession>,
}

impl<S: SessionStore> SessionController<S> {
    /// Create a controller; nothing is written until `start_session`
    pub fn new(store: S, band: BandId, leader: Leader, config: &RegencyConfig) -> Self {
        let speeds = config.speed_table();
        Self {
            store,
            band,
            leader,
            default_speed: speeds.clamp_index(config.scroll.default_speed),
            speeds,
            presets: config.cues.presets.clone(),
            local: None,
        }
    }

    /// Last known session (optimistic)
    pub fn session(&self) -> Option<&RegencySession> {
        self.local.as_ref()
    }

    /// Start or resume the band's session.
    ///
    /// An active session is resumed when no playlist is requested or the
    /// same playlist is requested; only the leader fields are written and
    /// playback continues where it was. Anything else starts fresh.
    pub async fn start_session(
        &mut self,
        playlist_id: Option<PlaylistId>,
        initial_song_id: Option<SongId>,
    ) -> Result<RegencySession> {
        let now = now_millis();
        let existing = self.store.read(&self.band).await?;

        let resumable = existing.filter(|current| {
            current.is_active
                && (playlist_id.is_none() || playlist_id == current.playlist_id)
        });

        let session = match resumable {
            Some(current) => {
                if let Some(previous) = current.leader_id.as_ref().filter(|id| **id != self.leader.id) {
                    warn!(
                        band = %self.band,
                        previous = %previous,
                        leader = %self.leader.id,
                        "taking over a session led by another device"
                    );
                }
                let patch = SessionPatch::takeover(&self.leader, now);
                self.store.update(&self.band, patch.clone()).await?;
                info!(band = %self.band, leader = %self.leader.id, "resumed live session");
                patch.applied_to(&current)
            }
            None => {
                let fresh = RegencySession::fresh(
                    &self.leader,
                    playlist_id,
                    initial_song_id,
                    self.default_speed,
                    now,
                );
                self.store.write(&self.band, fresh.clone()).await?;
                info!(band = %self.band, leader = %self.leader.id, "started fresh live session");
                fresh
            }
        };

        self.local = Some(session.clone());
        Ok(session)
    }

    /// Reset the session to its inactive rest state
    pub async fn end_session(&mut self) -> Result<()> {
        let patch = SessionPatch::end(now_millis());
        if let Some(local) = self.local.as_mut() {
            patch.apply(local);
        }
        self.store.merge(&self.band, patch).await?;
        info!(band = %self.band, "ended live session");
        Ok(())
    }

    /// Switch songs; resets section, transposition and scrolling
    pub async fn set_current_song(&mut self, song_id: SongId) -> Result<RegencySession> {
        debug!(song = %song_id, "set current song");
        self.write(SessionPatch::song(song_id, now_millis())).await
    }

    pub async fn set_current_section(&mut self, index: usize) -> Result<RegencySession> {
        debug!(index, "set current section");
        self.write(SessionPatch::section(index, now_millis())).await
    }

    /// Move to the next section of `song`, stopping at the last one
    pub async fn next_section(&mut self, song: &Song) -> Result<RegencySession> {
        let current = self.active()?.section_for(song);
        let target = current.map_or(0, |index| index + 1);
        let index = song.clamp_section(target).unwrap_or(0);
        self.set_current_section(index).await
    }

    /// Move to the previous section of `song`, stopping at the first one
    pub async fn previous_section(&mut self, song: &Song) -> Result<RegencySession> {
        let current = self.active()?.section_for(song);
        let index = current.map_or(0, |index| index.saturating_sub(1));
        self.set_current_section(index).await
    }

    pub async fn set_transpose(&mut self, amount: Semitones) -> Result<RegencySession> {
        debug!(amount, "set transpose");
        self.write(SessionPatch::transpose(amount, now_millis())).await
    }

    /// Shift the current transposition by `delta` semitones
    pub async fn step_transpose(&mut self, delta: Semitones) -> Result<RegencySession> {
        let amount = self.active()?.transpose_amount.saturating_add(delta);
        self.set_transpose(amount).await
    }

    pub async fn toggle_scroll_play(&mut self) -> Result<RegencySession> {
        let is_playing = !self.active()?.scroll_state.is_playing;
        debug!(is_playing, "toggle scroll");
        self.write(SessionPatch::scroll_playing(is_playing, now_millis())).await
    }

    /// Set the speed index, clamped to the speed table
    pub async fn set_scroll_speed(&mut self, speed: usize) -> Result<RegencySession> {
        let speed = self.speeds.clamp_index(speed);
        debug!(speed, "set scroll speed");
        self.write(SessionPatch::scroll_speed(speed, now_millis())).await
    }

    pub async fn speed_up(&mut self) -> Result<RegencySession> {
        let speed = self.active()?.scroll_state.speed.saturating_add(1);
        self.set_scroll_speed(speed).await
    }

    pub async fn speed_down(&mut self) -> Result<RegencySession> {
        let speed = self.active()?.scroll_state.speed.saturating_sub(1);
        self.set_scroll_speed(speed).await
    }

    /// Broadcast a cue with a fresh id
    pub async fn send_cue(&mut self, message: impl Into<String>, cue_type: CueType) -> Result<Cue> {
        let now = now_millis();
        let cue = Cue::new(message, cue_type, now);
        info!(cue = %cue.message, id = %cue.id, "sending cue");
        self.write(SessionPatch::cue(cue.clone(), now)).await?;
        Ok(cue)
    }

    /// Broadcast one of the configured preset cues; `None` for an unknown index
    pub async fn send_preset_cue(&mut self, index: usize) -> Result<Option<Cue>> {
        let Some(message) = self.presets.get(index).cloned() else {
            return Ok(None);
        };
        self.send_cue(message, CueType::Preset).await.map(Some)
    }

    /// Reconcile with a pushed document.
    ///
    /// The pushed document is authoritative and replaces the optimistic copy.
    /// `None` is treated as no active session.
    pub fn observe(&mut self, pushed: Option<&RegencySession>) -> LeaderStatus {
        let Some(session) = pushed else {
            self.local = None;
            return LeaderStatus::Ended;
        };

        self.local = Some(session.clone());
        if !session.is_active {
            LeaderStatus::Ended
        } else if session.is_led_by(&self.leader.id) {
            LeaderStatus::Leading
        } else {
            warn!(
                band = %self.band,
                leader = ?session.leader_id,
                "session taken over by another device"
            );
            LeaderStatus::TakenOver {
                leader_id: session.leader_id.clone(),
                leader_name: session.leader_name.clone(),
            }
        }
    }

    fn active(&self) -> Result<&RegencySession> {
        self.local
            .as_ref()
            .filter(|session| session.is_active)
            .ok_or_else(|| SessionError::NotActive(self.band.clone()))
    }

    /// Apply locally first, then write the same fields to the store
    async fn write(&mut self, patch: SessionPatch) -> Result<RegencySession> {
        let band = &self.band;
        let local = self
            .local
            .as_mut()
            .filter(|session| session.is_active)
            .ok_or_else(|| SessionError::NotActive(band.clone()))?;
        patch.apply(local);
        let snapshot = local.clone();

        self.store.update(&self.band, patch).await?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::session::store::MemorySessionStore;
    use crate::session::ScrollState;
    use crate::song::SongSection;

    fn band() -> BandId {
        BandId::from("band-1")
    }

    fn controller(store: &MemorySessionStore, id: &str, name: &str) -> SessionController<MemorySessionStore> {
        SessionController::new(
            store.clone(),
            band(),
            Leader::new(id, name),
            &RegencyConfig::default(),
        )
    }

    fn song(id: &str, sections: usize) -> Song {
        Song {
            id: SongId::from(id),
            title: id.to_string(),
            artist: String::new(),
            key: "G".to_string(),
            sections: (0..sections)
                .map(|i| SongSection {
                    id: format!("{id}-{i}"),
                    index: i,
                    name: format!("Parte {i}"),
                    content: "G D".to_string(),
                    cues: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_fresh_start() {
        let store = MemorySessionStore::new();
        let mut leader = controller(&store, "u1", "Ana");

        let session = leader
            .start_session(Some(PlaylistId::from("p1")), Some(SongId::from("s1")))
            .await
            .unwrap();

        assert!(session.is_active);
        assert_eq!(session.current_song_id, Some(SongId::from("s1")));
        assert_eq!(session.current_section_index, Some(0));
        assert_eq!(session.transpose_amount, 0);
        assert_eq!(session.scroll_state, ScrollState { is_playing: false, speed: 2 });
        assert_eq!(session.playlist_id, Some(PlaylistId::from("p1")));
        assert_eq!(store.read(&band()).await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_takeover_keeps_playback_state() {
        let store = MemorySessionStore::new();
        let mut first = controller(&store, "u1", "Ana");
        first.start_session(None, Some(SongId::from("S"))).await.unwrap();
        first.set_current_section(2).await.unwrap();
        first.set_transpose(3).await.unwrap();
        first.toggle_scroll_play().await.unwrap();
        let before = store.read(&band()).await.unwrap().unwrap();

        let mut second = controller(&store, "u2", "Bia");
        let merged = second.start_session(None, None).await.unwrap();

        let after = store.read(&band()).await.unwrap().unwrap();
        assert_eq!(merged, after);
        assert_eq!(after.current_song_id, Some(SongId::from("S")));
        assert_eq!(after.current_section_index, Some(2));
        assert_eq!(after.transpose_amount, 3);
        assert!(after.scroll_state.is_playing);
        assert_eq!(after.leader_id, Some(UserId::from("u2")));
        assert_eq!(after.leader_name.as_deref(), Some("Bia"));
        assert!(after.updated_at >= before.updated_at);

        // Nothing but the leader fields changed
        let mut expected = before.clone();
        expected.leader_id = after.leader_id.clone();
        expected.leader_name = after.leader_name.clone();
        expected.updated_at = after.updated_at;
        assert_eq!(after, expected);
    }

    #[tokio::test]
    async fn test_same_playlist_resumes() {
        let store = MemorySessionStore::new();
        let mut first = controller(&store, "u1", "Ana");
        first.start_session(Some(PlaylistId::from("p1")), Some(SongId::from("S"))).await.unwrap();
        first.set_transpose(5).await.unwrap();

        let mut second = controller(&store, "u2", "Bia");
        let session = second
            .start_session(Some(PlaylistId::from("p1")), Some(SongId::from("other")))
            .await
            .unwrap();
        assert_eq!(session.transpose_amount, 5);
        assert_eq!(session.current_song_id, Some(SongId::from("S")));
    }

    #[tokio::test]
    async fn test_different_playlist_resets() {
        let store = MemorySessionStore::new();
        let mut first = controller(&store, "u1", "Ana");
        first.start_session(Some(PlaylistId::from("p1")), Some(SongId::from("S"))).await.unwrap();
        first.set_transpose(5).await.unwrap();
        first.toggle_scroll_play().await.unwrap();

        let session = first
            .start_session(Some(PlaylistId::from("p2")), None)
            .await
            .unwrap();
        assert_eq!(session.transpose_amount, 0);
        assert!(!session.scroll_state.is_playing);
        assert_eq!(session.current_song_id, None);
        assert_eq!(session.current_section_index, None);
        assert_eq!(session.playlist_id, Some(PlaylistId::from("p2")));
    }

    #[tokio::test]
    async fn test_inactive_session_starts_fresh() {
        let store = MemorySessionStore::new();
        let mut leader = controller(&store, "u1", "Ana");
        leader.start_session(None, Some(SongId::from("S"))).await.unwrap();
        leader.set_transpose(4).await.unwrap();
        leader.end_session().await.unwrap();

        let session = leader.start_session(None, None).await.unwrap();
        assert!(session.is_active);
        assert_eq!(session.transpose_amount, 0);
        assert_eq!(session.current_song_id, None);
    }

    #[tokio::test]
    async fn test_end_session_resets() {
        let store = MemorySessionStore::new();
        let mut leader = controller(&store, "u1", "Ana");
        leader.start_session(None, Some(SongId::from("S"))).await.unwrap();
        leader.set_scroll_speed(5).await.unwrap();
        leader.toggle_scroll_play().await.unwrap();
        leader.send_cue("REPEAT", CueType::Preset).await.unwrap();
        leader.end_session().await.unwrap();

        let document = store.read(&band()).await.unwrap().unwrap();
        assert!(!document.is_active);
        assert_eq!(document.current_song_id, None);
        assert_eq!(document.current_section_index, None);
        assert_eq!(document.transpose_amount, 0);
        assert_eq!(document.scroll_state, ScrollState { is_playing: false, speed: 0 });
        assert_eq!(document.cue, None);
        assert_eq!(document.leader_id, None);
    }

    #[tokio::test]
    async fn test_end_without_document_creates_rest_state() {
        let store = MemorySessionStore::new();
        let mut leader = controller(&store, "u1", "Ana");
        leader.end_session().await.unwrap();
        let document = store.read(&band()).await.unwrap().unwrap();
        assert!(!document.is_active);
    }

    #[tokio::test]
    async fn test_set_current_song_resets_song_state() {
        let store = MemorySessionStore::new();
        let mut leader = controller(&store, "u1", "Ana");
        leader.start_session(None, Some(SongId::from("S"))).await.unwrap();
        leader.set_current_section(3).await.unwrap();
        leader.set_transpose(-2).await.unwrap();
        leader.set_scroll_speed(4).await.unwrap();
        leader.toggle_scroll_play().await.unwrap();

        let session = leader.set_current_song(SongId::from("T")).await.unwrap();
        assert_eq!(session.current_song_id, Some(SongId::from("T")));
        assert_eq!(session.current_section_index, Some(0));
        assert_eq!(session.transpose_amount, 0);
        assert!(!session.scroll_state.is_playing);
        assert_eq!(session.scroll_state.speed, 4);
        assert_eq!(store.read(&band()).await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_mutators_require_active_session() {
        let store = MemorySessionStore::new();
        let mut leader = controller(&store, "u1", "Ana");
        let result = leader.set_transpose(2).await;
        assert_eq!(result, Err(SessionError::NotActive(band())));
        assert!(leader.toggle_scroll_play().await.is_err());
    }

    #[tokio::test]
    async fn test_transport_errors_propagate() {
        let store = MemorySessionStore::new();
        let mut leader = controller(&store, "u1", "Ana");
        leader.start_session(None, None).await.unwrap();

        store.set_offline(true);
        let result = leader.set_transpose(1).await;
        assert!(matches!(result, Err(SessionError::Store(StoreError::Unavailable(_)))));
        // The optimistic copy already moved
        assert_eq!(leader.session().unwrap().transpose_amount, 1);
    }

    #[tokio::test]
    async fn test_speed_and_transpose_steps() {
        let store = MemorySessionStore::new();
        let mut leader = controller(&store, "u1", "Ana");
        leader.start_session(None, None).await.unwrap();

        let fastest = SpeedTable::DEFAULT_RATES.len() - 1;
        for _ in 0..20 {
            leader.speed_up().await.unwrap();
        }
        assert_eq!(leader.session().unwrap().scroll_state.speed, fastest);
        for _ in 0..20 {
            leader.speed_down().await.unwrap();
        }
        assert_eq!(leader.session().unwrap().scroll_state.speed, 0);

        assert_eq!(leader.set_scroll_speed(100).await.unwrap().scroll_state.speed, fastest);

        leader.step_transpose(-1).await.unwrap();
        let session = leader.step_transpose(-1).await.unwrap();
        assert_eq!(session.transpose_amount, -2);
        assert_eq!(session.effective_transpose(), 10);
    }

    #[tokio::test]
    async fn test_section_navigation_clamps() {
        let store = MemorySessionStore::new();
        let mut leader = controller(&store, "u1", "Ana");
        let song = song("S", 3);
        leader.start_session(None, Some(song.id.clone())).await.unwrap();

        leader.previous_section(&song).await.unwrap();
        assert_eq!(leader.session().unwrap().current_section_index, Some(0));

        for _ in 0..5 {
            leader.next_section(&song).await.unwrap();
        }
        assert_eq!(leader.session().unwrap().current_section_index, Some(2));

        leader.previous_section(&song).await.unwrap();
        assert_eq!(leader.session().unwrap().current_section_index, Some(1));
    }

    #[tokio::test]
    async fn test_cues_get_fresh_ids() {
        let store = MemorySessionStore::new();
        let mut leader = controller(&store, "u1", "Ana");
        leader.start_session(None, None).await.unwrap();

        let first = leader.send_cue("REPEAT", CueType::Preset).await.unwrap();
        let second = leader.send_cue("REPEAT", CueType::Preset).await.unwrap();
        assert_ne!(first.id, second.id);

        let document = store.read(&band()).await.unwrap().unwrap();
        assert_eq!(document.cue, Some(second));

        let preset = leader.send_preset_cue(0).await.unwrap().unwrap();
        assert_eq!(preset.message, "REPEAT");
        assert_eq!(preset.cue_type, CueType::Preset);
        assert_eq!(leader.send_preset_cue(99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_observe_detects_takeover_and_end() {
        let store = MemorySessionStore::new();
        let mut first = controller(&store, "u1", "Ana");
        let session = first.start_session(None, None).await.unwrap();
        assert_eq!(first.observe(Some(&session)), LeaderStatus::Leading);

        let mut second = controller(&store, "u2", "Bia");
        let taken = second.start_session(None, None).await.unwrap();
        assert_eq!(
            first.observe(Some(&taken)),
            LeaderStatus::TakenOver {
                leader_id: Some(UserId::from("u2")),
                leader_name: Some("Bia".to_string()),
            }
        );

        second.end_session().await.unwrap();
        let ended = store.read(&band()).await.unwrap();
        assert_eq!(second.observe(ended.as_ref()), LeaderStatus::Ended);
        assert_eq!(first.observe(None), LeaderStatus::Ended);
        assert!(first.session().is_none());
    }
}

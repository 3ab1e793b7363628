// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for REGENCY
//!
//! These tests verify that multiple components work together correctly
//! through the public API only.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use regency::chart::{join_lines, transpose_chord};
use regency::scroll::{ScrollParams, ScrollTarget};
use regency::session::{
    now_millis, BandId, CueType, FollowerEvent, LatencyLevel, Leader, PlaylistId, ScrollState,
    SessionPatch, SongId,
};
use regency::song::{MemorySongLibrary, SongLibrary};
use regency::{
    can_control_regency, classify_and_transpose, follow, BandRole, LeaderStatus, LineType,
    MemorySessionStore, RegencyConfig, SessionController, SessionError, SessionStore, Song,
    SongSection, StoreError,
};

const SHEET: &str = "[Intro]
C#m7   F#/A#   B7

G#7        C#m7
Esta é a primeira linha
D#sus4   A#m7(b5)/E
Tu és santo, ó Senhor

Refrão:
F#7(9)  B7/D#  C#m7";

fn band() -> BandId {
    BandId::from("band-1")
}

fn song() -> Song {
    Song {
        id: SongId::from("s1"),
        title: "Santo".to_string(),
        artist: "Ministério".to_string(),
        key: "C#m".to_string(),
        sections: SHEET
            .split("\n\n")
            .enumerate()
            .map(|(index, content)| SongSection {
                id: format!("s1-{}", index),
                index,
                name: format!("Parte {}", index + 1),
                content: content.to_string(),
                cues: None,
            })
            .collect(),
    }
}

fn leader(store: &MemorySessionStore, id: &str, name: &str) -> SessionController<MemorySessionStore> {
    SessionController::new(store.clone(), band(), Leader::new(id, name), &RegencyConfig::default())
}

#[derive(Default)]
struct Viewport {
    pixels: AtomicU64,
}

impl Viewport {
    fn scrolled(&self) -> u64 {
        self.pixels.load(Ordering::SeqCst)
    }
}

impl ScrollTarget for Viewport {
    fn scroll_by(&self, pixels: u32) {
        self.pixels.fetch_add(pixels as u64, Ordering::SeqCst);
    }
}

// ============================================================================
// Chord sheets
// ============================================================================

#[test]
fn test_classification_examples() {
    let line_type = |text: &str| classify_and_transpose(text, 0)[0].line_type;
    assert_eq!(line_type("G  D  Em  C"), LineType::Chord);
    assert_eq!(line_type("Esta é a primeira linha"), LineType::Lyric);

    let refrao = &classify_and_transpose("[Refrão]", 0)[0];
    assert_eq!(refrao.line_type, LineType::Header);
    assert_eq!(refrao.content, "Refrão");

    let instrumental = &classify_and_transpose("Instrumental:", 0)[0];
    assert_eq!(instrumental.line_type, LineType::Header);
    assert_eq!(instrumental.content, "Instrumental");
}

#[test]
fn test_zero_shift_keeps_lyrics_and_headers() {
    let lines = classify_and_transpose(SHEET, 0);
    let source: Vec<&str> = SHEET.split('\n').collect();
    assert_eq!(lines.len(), source.len());

    for (line, original) in lines.iter().zip(source.iter()) {
        match line.line_type {
            LineType::Lyric | LineType::Empty => assert_eq!(line.content, *original),
            LineType::Header => assert_eq!(line.content, original.trim().trim_matches(['[', ']', ':'])),
            LineType::Chord => assert_eq!(line.content, *original),
        }
    }
}

#[test]
fn test_sharp_sheet_round_trip() {
    let original = classify_and_transpose(SHEET, 0);

    for n in -13..=13 {
        let shifted = join_lines(&classify_and_transpose(SHEET, n));
        let back = classify_and_transpose(&shifted, -n);

        for (restored, expected) in back.iter().zip(original.iter()) {
            assert_eq!(restored.line_type, expected.line_type, "shift {}", n);
            assert_eq!(restored.content, expected.content, "shift {}", n);
        }
    }
}

#[test]
fn test_whitespace_runs_preserved() {
    let gap = " ".repeat(8);
    let source = format!("G#7{}C#m7\nEsta é a primeira linha", gap);
    let lines = classify_and_transpose(&source, 1);
    assert_eq!(lines[0].content, format!("A7{}Dm7", gap));
    assert_eq!(lines[1].content, "Esta é a primeira linha");
}

#[test]
fn test_suffix_preservation() {
    assert_eq!(transpose_chord("Bm7(b5)/E", 2), "C#m7(b5)/F#");
    assert_eq!(transpose_chord("(Bbmaj7)", 1), "(Bmaj7)");
    // Flats come back sharp
    assert_eq!(transpose_chord("Eb", 0), "D#");
}

#[test]
fn test_configured_word_list() {
    let config = RegencyConfig::from_yaml("chords:\n  extra_blacklist: [Cade]\n").unwrap();
    let transposer = config.transposer();
    assert!(transposer.blacklist().contains("cade"));

    // "Em" is a Portuguese word in the default list and stays put
    let default_render = classify_and_transpose("G  Em  C", 2);
    assert_eq!(default_render[0].content, "A  Em  D");

    let config = RegencyConfig::from_yaml("chords:\n  blacklist: []\n").unwrap();
    let render = config.transposer().classify_and_transpose("G  Em  C", 2);
    assert_eq!(render[0].content, "A  F#m  D");
}

#[test]
fn test_song_render_and_key() {
    let song = song();
    assert_eq!(song.section_count(), 3);
    assert_eq!(song.transposed_key(3), "Em");

    let section = &song.sections[1];
    let source = section.content.lines().next().unwrap();
    let lines = section.render(-1);
    assert_eq!(lines[0].line_type, LineType::Chord);
    assert_eq!(lines[0].content, source.replace("G#7", "G7").replace("C#m7", "Cm7"));
    assert_eq!(lines[1].line_type, LineType::Lyric);
}

// ============================================================================
// Session protocol
// ============================================================================

#[test]
fn test_role_check() {
    assert!(can_control_regency(BandRole::Owner));
    assert!(can_control_regency(BandRole::Admin));
    assert!(can_control_regency(BandRole::Leader));
    assert!(!can_control_regency(BandRole::Member));
}

#[tokio::test]
async fn test_takeover_leaves_playback_untouched() {
    let store = MemorySessionStore::new();
    let mut first = leader(&store, "u1", "Ana");
    first.start_session(None, Some(SongId::from("S"))).await.unwrap();
    first.set_current_section(2).await.unwrap();

    let mut second = leader(&store, "u2", "Bia");
    let merged = second.start_session(None, None).await.unwrap();

    let document = store.read(&band()).await.unwrap().unwrap();
    assert_eq!(merged, document);
    assert_eq!(document.current_song_id, Some(SongId::from("S")));
    assert_eq!(document.current_section_index, Some(2));
    assert_eq!(document.leader_name.as_deref(), Some("Bia"));

    assert!(matches!(
        first.observe(Some(&document)),
        LeaderStatus::TakenOver { .. }
    ));
}

#[tokio::test]
async fn test_fresh_start_on_other_playlist() {
    let store = MemorySessionStore::new();
    let mut controller = leader(&store, "u1", "Ana");
    controller
        .start_session(Some(PlaylistId::from("domingo")), Some(SongId::from("S")))
        .await
        .unwrap();
    controller.set_transpose(4).await.unwrap();
    controller.toggle_scroll_play().await.unwrap();

    controller
        .start_session(Some(PlaylistId::from("quarta")), None)
        .await
        .unwrap();
    let document = store.read(&band()).await.unwrap().unwrap();
    assert_eq!(document.transpose_amount, 0);
    assert!(!document.scroll_state.is_playing);
    assert_eq!(document.playlist_id, Some(PlaylistId::from("quarta")));
}

#[tokio::test]
async fn test_end_session_reset() {
    let store = MemorySessionStore::new();
    let mut controller = leader(&store, "u1", "Ana");
    controller.start_session(None, Some(SongId::from("S"))).await.unwrap();
    controller.toggle_scroll_play().await.unwrap();
    controller.end_session().await.unwrap();

    let document = store.read(&band()).await.unwrap().unwrap();
    assert!(!document.is_active);
    assert_eq!(document.current_song_id, None);
    assert_eq!(document.scroll_state, ScrollState { is_playing: false, speed: 0 });

    assert_eq!(
        controller.set_transpose(1).await,
        Err(SessionError::NotActive(band()))
    );
}

#[tokio::test]
async fn test_offline_store_surfaces_transport_error() {
    let store = MemorySessionStore::new();
    store.set_offline(true);
    let mut controller = leader(&store, "u1", "Ana");
    let result = controller.start_session(None, None).await;
    assert!(matches!(
        result,
        Err(SessionError::Store(StoreError::Unavailable(_)))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_leader_to_follower_end_to_end() {
    let store = MemorySessionStore::new();
    let library = MemorySongLibrary::new();
    library.insert(song());
    let song = library.song(&SongId::from("s1")).unwrap();

    let mut controller = leader(&store, "u1", "Ana");
    controller.start_session(None, Some(song.id.clone())).await.unwrap();

    let viewport = Arc::new(Viewport::default());
    let mut follower = follow(&store, &band(), &RegencyConfig::default(), viewport.clone());
    tokio::time::sleep(Duration::from_millis(20)).await;

    let mut hydrated = Vec::new();
    while let Some(event) = follower.try_next_event() {
        hydrated.push(event);
    }
    assert!(hydrated.contains(&FollowerEvent::SongChanged(Some(SongId::from("s1")))));
    assert!(hydrated.contains(&FollowerEvent::SectionChanged(Some(0))));

    controller.step_transpose(-2).await.unwrap();
    controller.next_section(&song).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(follower.transpose(), 10);
    let session = follower.session().unwrap();
    assert_eq!(session.section_for(&song), Some(1));

    controller.toggle_scroll_play().await.unwrap();
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    let scrolled = viewport.scrolled();
    assert!(scrolled > 0);

    let cue = controller.send_cue("REPEAT", CueType::Preset).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let mut received = Vec::new();
    while let Some(event) = follower.try_next_event() {
        if let FollowerEvent::CueReceived(cue) = event {
            received.push(cue);
        }
    }
    assert_eq!(received, vec![cue.clone()]);
    assert_eq!(follower.visible_cue(now_millis()), Some(cue));
    assert_eq!(follower.latency(now_millis()), Some(LatencyLevel::Good));

    controller.end_session().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(follower.has_ended());
    assert!(!follower.is_scrolling_active());

    let stopped_at = viewport.scrolled();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(viewport.scrolled(), stopped_at);
}

#[tokio::test(start_paused = true)]
async fn test_connection_loss_stops_follower() {
    let store = MemorySessionStore::new();
    let mut controller = leader(&store, "u1", "Ana");
    controller.start_session(None, Some(SongId::from("s1"))).await.unwrap();
    controller.toggle_scroll_play().await.unwrap();

    let viewport = Arc::new(Viewport::default());
    let mut follower = follow(&store, &band(), &RegencyConfig::default(), viewport.clone());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(viewport.scrolled() > 0);

    store.set_offline(true);
    let mut ended = false;
    while let Some(event) = follower.next_event().await {
        ended |= event == FollowerEvent::SessionEnded;
    }
    assert!(ended);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let stopped_at = viewport.scrolled();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(viewport.scrolled(), stopped_at);
}

#[tokio::test(start_paused = true)]
async fn test_manual_scroll_override_and_resync() {
    let store = MemorySessionStore::new();
    let song = song();
    let mut controller = leader(&store, "u1", "Ana");
    controller.start_session(None, Some(song.id.clone())).await.unwrap();
    controller.toggle_scroll_play().await.unwrap();

    let viewport = Arc::new(Viewport::default());
    let follower = follow(&store, &band(), &RegencyConfig::default(), viewport.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(follower.user_scrolled());
    controller.set_current_song(SongId::from("s2")).await.unwrap();
    controller.toggle_scroll_play().await.unwrap();
    controller.set_current_section(1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(follower.is_detached());

    let action = follower.resync();
    assert_eq!(action.reload_song, Some(SongId::from("s2")));
    assert_eq!(action.snap_to_section, Some(1));
    assert_eq!(
        action.scroll,
        ScrollParams {
            is_playing: true,
            speed_index: 2,
        }
    );
    assert!(!follower.is_detached());

    let before = viewport.scrolled();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(viewport.scrolled() > before);
}

#[tokio::test]
async fn test_patch_through_store_subscription() {
    let store = MemorySessionStore::new();
    let mut rx = store.subscribe(&band());
    let mut controller = leader(&store, "u1", "Ana");
    controller.start_session(None, None).await.unwrap();
    rx.changed().await.unwrap();

    store
        .update(&band(), SessionPatch::scroll_speed(5, 42))
        .await
        .unwrap();
    rx.changed().await.unwrap();
    let pushed = rx.borrow_and_update().clone().unwrap();
    assert_eq!(pushed.scroll_state.speed, 5);
    assert_eq!(pushed.updated_at, 42);
    assert!(pushed.is_active);
}

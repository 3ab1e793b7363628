// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Viewer-side session mirroring.
//!
//! [`SessionFollower`] turns full-document pushes into the handful of
//! changes a viewer cares about. A follower that scrolls by hand while the
//! leader is scrolling detaches: its scroll loop stops and section snaps are
//! suppressed until it resyncs.
//!
//! [`follow`] wires a follower to a store subscription and a
//! [`ScrollRunner`] on a background task.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::latency::LatencyLevel;
use super::state::{Cue, RegencySession};
use super::store::SessionStore;
use super::{now_millis, BandId, CueId, SongId, Timestamp, UserId};
use crate::config::{LatencyConfig, RegencyConfig};
use crate::music::Semitones;
use crate::scroll::{ScrollParams, ScrollRunner, ScrollTarget};

/// A change worth reacting to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowerEvent {
    /// Session inactive, missing or unreachable; stop following
    SessionEnded,
    LeaderChanged {
        leader_id: Option<UserId>,
        leader_name: Option<String>,
    },
    /// The current song changed; reload and re-render
    SongChanged(Option<SongId>),
    /// Snap the view to this section (not sent while detached)
    SectionChanged(Option<usize>),
    /// Effective transposition, 0..12
    TransposeChanged(Semitones),
    /// Effective scroll parameters (not sent while detached)
    ScrollChanged(ScrollParams),
    /// A cue not seen before
    CueReceived(Cue),
}

/// What a resync asks the view to do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResyncAction {
    /// Song to reload, if it changed while detached
    pub reload_song: Option<SongId>,
    /// Section to snap to
    pub snap_to_section: Option<usize>,
    /// Scroll parameters to resume with
    pub scroll: ScrollParams,
}

#[derive(Debug, Clone)]
struct ShownCue {
    cue: Cue,
    received_at: Timestamp,
}

/// Last-seen session state for one viewer
#[derive(Debug, Clone)]
pub struct SessionFollower {
    last: Option<RegencySession>,
    ended: bool,
    user_has_scrolled: bool,
    song_changed_while_detached: bool,
    last_cue_id: Option<CueId>,
    shown_cue: Option<ShownCue>,
    display_ms: u64,
    latency: LatencyConfig,
}

impl SessionFollower {
    pub fn new(config: &RegencyConfig) -> Self {
        Self {
            last: None,
            ended: false,
            user_has_scrolled: false,
            song_changed_while_detached: false,
            last_cue_id: None,
            shown_cue: None,
            display_ms: config.cues.display_ms,
            latency: config.latency.clone(),
        }
    }

    /// Last active session seen
    pub fn session(&self) -> Option<&RegencySession> {
        self.last.as_ref()
    }

    /// Whether the session has ended for this viewer
    pub fn has_ended(&self) -> bool {
        self.ended
    }

    /// Whether the viewer scrolled by hand and has not resynced
    pub fn is_detached(&self) -> bool {
        self.user_has_scrolled
    }

    /// Effective transposition for rendering
    pub fn transpose(&self) -> Semitones {
        self.last.as_ref().map_or(0, RegencySession::effective_transpose)
    }

    /// Diff a pushed document against the last one seen.
    ///
    /// `None` and inactive documents both end the session. The first
    /// active push reports every field so a new viewer can hydrate.
    pub fn apply(&mut self, pushed: Option<RegencySession>, now: Timestamp) -> Vec<FollowerEvent> {
        let session = match pushed {
            Some(session) if session.is_active => session,
            _ => {
                if !self.ended {
                    info!("session ended or connection lost; no longer following");
                }
                self.ended = true;
                self.last = None;
                self.user_has_scrolled = false;
                self.song_changed_while_detached = false;
                return vec![FollowerEvent::SessionEnded];
            }
        };

        self.ended = false;
        let previous = self.last.take();
        let first = previous.is_none();
        let previous = previous.unwrap_or_default();
        let mut events = Vec::new();

        if first
            || previous.leader_id != session.leader_id
            || previous.leader_name != session.leader_name
        {
            events.push(FollowerEvent::LeaderChanged {
                leader_id: session.leader_id.clone(),
                leader_name: session.leader_name.clone(),
            });
        }

        let song_changed = first || previous.current_song_id != session.current_song_id;
        if song_changed {
            if self.user_has_scrolled {
                self.song_changed_while_detached = true;
            }
            events.push(FollowerEvent::SongChanged(session.current_song_id.clone()));
        }

        let section_changed =
            song_changed || previous.current_section_index != session.current_section_index;
        if section_changed && !self.user_has_scrolled {
            events.push(FollowerEvent::SectionChanged(session.current_section_index));
        }

        if first || previous.effective_transpose() != session.effective_transpose() {
            events.push(FollowerEvent::TransposeChanged(session.effective_transpose()));
        }

        if (first || previous.scroll_state != session.scroll_state) && !self.user_has_scrolled {
            events.push(FollowerEvent::ScrollChanged(ScrollParams::from(session.scroll_state)));
        }

        if let Some(cue) = &session.cue {
            if self.last_cue_id.as_ref() != Some(&cue.id) {
                self.last_cue_id = Some(cue.id.clone());
                // A cue already on the document when joining is shown only if still fresh
                let fresh = !first || now.saturating_sub(cue.created_at) < self.display_ms;
                if fresh {
                    debug!(cue = %cue.message, id = %cue.id, "cue received");
                    self.shown_cue = Some(ShownCue {
                        cue: cue.clone(),
                        received_at: now,
                    });
                    events.push(FollowerEvent::CueReceived(cue.clone()));
                }
            }
        }

        self.last = Some(session);
        events
    }

    /// Record a manual scroll.
    ///
    /// Only detaches while the leader is scrolling; returns whether it did.
    pub fn user_scrolled(&mut self) -> bool {
        let leader_playing = self
            .last
            .as_ref()
            .is_some_and(|session| session.scroll_state.is_playing);
        if leader_playing && !self.user_has_scrolled {
            debug!("viewer scrolled by hand; detached from leader");
            self.user_has_scrolled = true;
            return true;
        }
        false
    }

    /// Re-attach to the leader
    pub fn resync(&mut self) -> ResyncAction {
        let reload = std::mem::take(&mut self.song_changed_while_detached);
        self.user_has_scrolled = false;

        let action = ResyncAction {
            reload_song: if reload {
                self.last.as_ref().and_then(|s| s.current_song_id.clone())
            } else {
                None
            },
            snap_to_section: self.last.as_ref().and_then(|s| s.current_section_index),
            scroll: self.scroll_params(),
        };
        debug!(?action, "viewer resynced with leader");
        action
    }

    /// Parameters the local scroll loop should run with
    pub fn scroll_params(&self) -> ScrollParams {
        match &self.last {
            Some(session) if !self.user_has_scrolled => ScrollParams::from(session.scroll_state),
            Some(session) => ScrollParams {
                is_playing: false,
                speed_index: session.scroll_state.speed,
            },
            None => ScrollParams::default(),
        }
    }

    /// The cue to display at `now`, if its display window is still open
    pub fn visible_cue(&self, now: Timestamp) -> Option<&Cue> {
        self.shown_cue
            .as_ref()
            .filter(|shown| now.saturating_sub(shown.received_at) < self.display_ms)
            .map(|shown| &shown.cue)
    }

    /// Sync delay indicator for the last push
    pub fn latency(&self, now: Timestamp) -> Option<LatencyLevel> {
        self.last
            .as_ref()
            .map(|session| LatencyLevel::since(session.updated_at, now, &self.latency))
    }
}

fn lock(follower: &Mutex<SessionFollower>) -> MutexGuard<'_, SessionFollower> {
    follower.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running follower: events out, manual-scroll input in
#[derive(Debug)]
pub struct FollowerHandle {
    follower: Arc<Mutex<SessionFollower>>,
    runner: Arc<ScrollRunner>,
    events: mpsc::UnboundedReceiver<FollowerEvent>,
    task: JoinHandle<()>,
}

impl FollowerHandle {
    /// Next event; `None` once following has stopped and all events are read
    pub async fn next_event(&mut self) -> Option<FollowerEvent> {
        self.events.recv().await
    }

    /// Next event if one is queued
    pub fn try_next_event(&mut self) -> Option<FollowerEvent> {
        self.events.try_recv().ok()
    }

    /// Report a manual scroll; stops the local scroll loop if it detaches
    pub fn user_scrolled(&self) -> bool {
        let mut follower = lock(&self.follower);
        let detached = follower.user_scrolled();
        if detached {
            self.runner.set_params(follower.scroll_params());
        }
        detached
    }

    /// Re-attach to the leader and resume its scrolling
    pub fn resync(&self) -> ResyncAction {
        let mut follower = lock(&self.follower);
        let action = follower.resync();
        self.runner.set_params(action.scroll);
        action
    }

    /// Parameters the local scroll loop is running with
    pub fn scroll_params(&self) -> ScrollParams {
        self.runner.params()
    }

    /// Whether the local scroll loop is still alive
    pub fn is_scrolling_active(&self) -> bool {
        !self.runner.is_finished()
    }

    pub fn is_detached(&self) -> bool {
        lock(&self.follower).is_detached()
    }

    pub fn has_ended(&self) -> bool {
        lock(&self.follower).has_ended()
    }

    pub fn transpose(&self) -> Semitones {
        lock(&self.follower).transpose()
    }

    pub fn session(&self) -> Option<RegencySession> {
        lock(&self.follower).session().cloned()
    }

    pub fn visible_cue(&self, now: Timestamp) -> Option<Cue> {
        lock(&self.follower).visible_cue(now).cloned()
    }

    pub fn latency(&self, now: Timestamp) -> Option<LatencyLevel> {
        lock(&self.follower).latency(now)
    }

    /// Stop following
    pub fn stop(self) {
        self.task.abort();
        self.runner.stop();
    }
}

impl Drop for FollowerHandle {
    fn drop(&mut self) {
        self.task.abort();
        self.runner.stop();
    }
}

/// Follow `band`, scrolling `target` in step with the leader.
///
/// Following stops when the session ends or the subscription reports no
/// session, and the scroll loop stops with it. Must be called from within a
/// tokio runtime.
pub fn follow<S, T>(store: &S, band: &BandId, config: &RegencyConfig, target: Arc<T>) -> FollowerHandle
where
    S: SessionStore,
    T: ScrollTarget,
{
    let follower = Arc::new(Mutex::new(SessionFollower::new(config)));
    let runner = Arc::new(ScrollRunner::spawn(
        config.speed_table(),
        config.scroll.tick_period(),
        target,
    ));
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let mut rx = store.subscribe(band);

    let task_follower = follower.clone();
    let task_runner = runner.clone();
    let band = band.clone();
    let task = tokio::spawn(async move {
        info!(%band, "following live session");
        loop {
            let pushed = rx.borrow_and_update().clone();
            // Params must be sent under the lock; manual scrolls race this
            let (events, ended) = {
                let mut follower = lock(&task_follower);
                let events = follower.apply(pushed, now_millis());
                task_runner.set_params(follower.scroll_params());
                (events, follower.has_ended())
            };

            for event in events {
                let _ = events_tx.send(event);
            }
            if ended {
                break;
            }

            if rx.changed().await.is_err() {
                debug!(%band, "session subscription closed");
                {
                    let mut follower = lock(&task_follower);
                    follower.apply(None, now_millis());
                    task_runner.set_params(follower.scroll_params());
                }
                let _ = events_tx.send(FollowerEvent::SessionEnded);
                break;
            }
        }
        task_runner.stop();
        info!(%band, "stopped following live session");
    });

    FollowerHandle {
        follower,
        runner,
        events: events_rx,
        task,
    }
}

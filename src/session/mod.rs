// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Live session ("regency") shared between a leader and its followers.
//!
//! One session document exists per band. The leader writes small field
//! groups to it; every write is pushed in full to all subscribers, which
//! diff it against what they last saw. There is no locking: each write is
//! last-write-wins for the fields it touches, and two devices starting a
//! session at the same moment will race. That is accepted, not handled.
//!
//! - `state`: the session record and partial updates
//! - `store`: document store abstraction and in-memory implementation
//! - `controller`: leader-side actions
//! - `follower`: viewer-side diffing, manual-scroll override and cues
//! - `latency`: advisory sync-delay indicator

pub mod controller;
pub mod follower;
pub mod latency;
pub mod state;
pub mod store;

pub use controller::{LeaderStatus, SessionController};
pub use follower::{follow, FollowerEvent, FollowerHandle, ResyncAction, SessionFollower};
pub use latency::{latency_ms, LatencyLevel};
pub use state::{Cue, CueType, Leader, RegencySession, ScrollState, SessionPatch};
pub use store::{MemorySessionStore, SessionStore};

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch
pub type Timestamp = u64;

/// Current wall-clock time in milliseconds
pub fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or(0)
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Band identifier; one session document per band
    BandId
);
string_id!(
    /// Song identifier
    SongId
);
string_id!(
    /// User identifier
    UserId
);
string_id!(
    /// Playlist identifier
    PlaylistId
);
string_id!(
    /// Cue identifier, fresh for every send
    CueId
);

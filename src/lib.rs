// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Live "regency" mode for a worship band.
//!
//! One leader device drives a shared per-band session: current song and
//! section, key transposition, auto-scroll and stage cues. Followers mirror
//! it, rendering chord sheets transposed locally and scrolling with their
//! own timer from the replicated `{is_playing, speed}` pair.

pub mod chart;
pub mod config;
pub mod error;
pub mod music;
pub mod scroll;
pub mod session;
pub mod song;

pub use chart::{classify_and_transpose, LineType, ParsedLine, Transposer};
pub use config::RegencyConfig;
pub use error::{SessionError, StoreError};
pub use session::{
    follow, FollowerEvent, FollowerHandle, LeaderStatus, MemorySessionStore, RegencySession,
    SessionController, SessionFollower, SessionStore,
};
pub use song::{can_control_regency, BandRole, Song, SongSection};

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Local teleprompter scrolling.
//!
//! Each device runs its own loop from the replicated `{is_playing, speed}`
//! pair; pixel offsets are never shared.

pub mod engine;
pub mod runner;

pub use engine::{ScrollEngine, ScrollParams, SpeedTable};
pub use runner::{ScrollRunner, ScrollTarget};

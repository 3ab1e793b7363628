// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Deterministic teleprompter stepper.
//!
//! Only `{is_playing, speed_index}` is shared between devices. Every client
//! runs this same stepper at a fixed tick, so motion looks synchronized
//! without streaming scroll offsets.
//!
//! Rates are fractional pixels per tick. The fraction is carried in an
//! accumulator and only whole pixels are emitted.

use serde::{Deserialize, Serialize};

use crate::session::ScrollState;

/// Ordered pixel-per-tick rates, index 0 slowest
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedTable {
    rates: Vec<f64>,
}

impl SpeedTable {
    /// Built-in rates
    pub const DEFAULT_RATES: [f64; 7] = [0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0];

    /// Create a table; an empty list falls back to the built-in rates
    pub fn new(rates: Vec<f64>) -> Self {
        if rates.is_empty() {
            Self::default()
        } else {
            Self { rates }
        }
    }

    /// Clamp an index into the table
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.rates.len().saturating_sub(1))
    }

    /// Rate for an index, clamped
    pub fn rate(&self, index: usize) -> f64 {
        self.rates[self.clamp_index(index)]
    }
}

impl Default for SpeedTable {
    fn default() -> Self {
        Self {
            rates: Self::DEFAULT_RATES.to_vec(),
        }
    }
}

/// Motion parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScrollParams {
    pub is_playing: bool,
    pub speed_index: usize,
}

impl From<ScrollState> for ScrollParams {
    fn from(state: ScrollState) -> Self {
        Self {
            is_playing: state.is_playing,
            speed_index: state.speed,
        }
    }
}

/// Fractional-accumulator scroll stepper
#[derive(Debug, Clone)]
pub struct ScrollEngine {
    table: SpeedTable,
    params: ScrollParams,
    accumulator: f64,
    total_pixels: u64,
}

impl ScrollEngine {
    /// Create a stopped engine
    pub fn new(table: SpeedTable) -> Self {
        Self {
            table,
            params: ScrollParams::default(),
            accumulator: 0.0,
            total_pixels: 0,
        }
    }

    /// Apply new parameters.
    ///
    /// Stopping clears the accumulator so resuming does not jump; a speed
    /// change keeps it and takes effect on the next tick.
    pub fn set_params(&mut self, params: ScrollParams) {
        if !params.is_playing {
            self.accumulator = 0.0;
        }
        self.params = params;
    }

    /// Current parameters
    pub fn params(&self) -> ScrollParams {
        self.params
    }

    /// Fraction carried to the next tick
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Pixels emitted since creation
    pub fn total_pixels(&self) -> u64 {
        self.total_pixels
    }

    /// Advance one tick; returns whole pixels to scroll
    pub fn tick(&mut self) -> u32 {
        if !self.params.is_playing {
            return 0;
        }

        self.accumulator += self.table.rate(self.params.speed_index);
        if self.accumulator < 1.0 {
            return 0;
        }

        let pixels = self.accumulator.floor();
        self.accumulator -= pixels;
        self.total_pixels += pixels as u64;
        pixels as u32
    }
}

impl Default for ScrollEngine {
    fn default() -> Self {
        Self::new(SpeedTable::default())
    }
}

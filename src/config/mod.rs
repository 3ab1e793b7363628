// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for the live session.
//!
//! Scroll speeds, cue timing, latency thresholds and the chord-shaped word
//! list are loaded from a YAML or TOML file. Every field has a default so
//! an empty file is a valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::chart::{Transposer, WordBlacklist};
use crate::scroll::SpeedTable;

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RegencyConfig {
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub cues: CueConfig,
    #[serde(default)]
    pub latency: LatencyConfig,
    #[serde(default)]
    pub chords: ChordConfig,
}

impl RegencyConfig {
    /// Load from a `.yaml`/`.yml` or `.toml` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&contents)?,
            _ => Self::from_yaml(&contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as null, not as an empty map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML configuration")
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let speeds = &self.scroll.speeds;
        if speeds.is_empty() {
            bail!("scroll.speeds must not be empty");
        }
        if speeds.iter().any(|rate| !rate.is_finite() || *rate <= 0.0) {
            bail!("scroll.speeds must all be positive");
        }
        if speeds.windows(2).any(|pair| pair[1] <= pair[0]) {
            bail!("scroll.speeds must be ordered slowest first");
        }
        if self.scroll.default_speed >= speeds.len() {
            bail!(
                "scroll.default_speed {} is out of range (0..{})",
                self.scroll.default_speed,
                speeds.len()
            );
        }
        if self.scroll.tick_ms == 0 {
            bail!("scroll.tick_ms must be at least 1");
        }
        if self.latency.warn_ms < self.latency.good_ms {
            bail!("latency.warn_ms must not be below latency.good_ms");
        }
        Ok(())
    }

    /// Speed table for the scroll engine
    pub fn speed_table(&self) -> SpeedTable {
        SpeedTable::new(self.scroll.speeds.clone())
    }

    /// Chord transposer using the configured word list
    pub fn transposer(&self) -> Transposer {
        Transposer::new(self.chords.blacklist())
    }
}

/// Teleprompter settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrollConfig {
    /// Tick period in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Pixels per tick, slowest first
    #[serde(default = "default_speeds")]
    pub speeds: Vec<f64>,
    /// Speed index used when a session starts fresh
    #[serde(default = "default_speed")]
    pub default_speed: usize,
}

fn default_tick_ms() -> u64 {
    16
}
fn default_speeds() -> Vec<f64> {
    SpeedTable::DEFAULT_RATES.to_vec()
}
fn default_speed() -> usize {
    2
}

impl ScrollConfig {
    /// Tick period as a duration
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            speeds: default_speeds(),
            default_speed: default_speed(),
        }
    }
}

/// Cue popup settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CueConfig {
    /// How long followers show a cue
    #[serde(default = "default_display_ms")]
    pub display_ms: u64,
    /// Quick-send messages offered to the leader
    #[serde(default = "default_presets")]
    pub presets: Vec<String>,
}

fn default_display_ms() -> u64 {
    3000
}
fn default_presets() -> Vec<String> {
    ["REPEAT", "CHORUS", "BRIDGE", "END", "INSTRUMENTAL", "SOFTER", "LOUDER"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            display_ms: default_display_ms(),
            presets: default_presets(),
        }
    }
}

/// Latency indicator thresholds (inclusive upper bounds)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatencyConfig {
    #[serde(default = "default_good_ms")]
    pub good_ms: u64,
    #[serde(default = "default_warn_ms")]
    pub warn_ms: u64,
}

fn default_good_ms() -> u64 {
    500
}
fn default_warn_ms() -> u64 {
    2000
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            good_ms: default_good_ms(),
            warn_ms: default_warn_ms(),
        }
    }
}

/// Chord detection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChordConfig {
    /// Replaces the built-in word list when set
    #[serde(default)]
    pub blacklist: Option<Vec<String>>,
    /// Appended to the active word list
    #[serde(default)]
    pub extra_blacklist: Vec<String>,
}

impl ChordConfig {
    /// Build the effective word list
    pub fn blacklist(&self) -> WordBlacklist {
        let mut list = match &self.blacklist {
            Some(words) => WordBlacklist::from_words(words),
            None => WordBlacklist::default(),
        };
        list.extend(&self.extra_blacklist);
        list
    }
}

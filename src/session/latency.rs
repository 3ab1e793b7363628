// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Advisory sync-delay indicator.
//!
//! Shown to musicians only; never used to gate scrolling or transposition.

use serde::{Deserialize, Serialize};

use super::Timestamp;
use crate::config::LatencyConfig;

/// Bucketed delay between now and the last session write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyLevel {
    Good,
    Warn,
    Bad,
}

impl LatencyLevel {
    /// Bucket a delay in milliseconds
    pub fn classify(latency_ms: u64, config: &LatencyConfig) -> Self {
        if latency_ms <= config.good_ms {
            LatencyLevel::Good
        } else if latency_ms <= config.warn_ms {
            LatencyLevel::Warn
        } else {
            LatencyLevel::Bad
        }
    }

    /// Bucket the delay since `updated_at`
    pub fn since(updated_at: Timestamp, now: Timestamp, config: &LatencyConfig) -> Self {
        Self::classify(latency_ms(now, updated_at), config)
    }
}

/// `abs(now - updated_at)`; clocks on different devices may disagree either way
pub fn latency_ms(now: Timestamp, updated_at: Timestamp) -> u64 {
    now.abs_diff(updated_at)
}

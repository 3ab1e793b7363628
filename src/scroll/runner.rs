// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timer task that drives a [`ScrollEngine`] against a view.
//!
//! The task sleeps on its parameter channel while stopped and ticks at the
//! configured period while playing. Stopping or dropping the runner cancels
//! the task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use super::engine::{ScrollEngine, ScrollParams, SpeedTable};

/// Something that can be scrolled by whole pixels
pub trait ScrollTarget: Send + Sync + 'static {
    fn scroll_by(&self, pixels: u32);
}

/// Handle to a running scroll loop
#[derive(Debug)]
pub struct ScrollRunner {
    params_tx: watch::Sender<ScrollParams>,
    task: JoinHandle<()>,
}

impl ScrollRunner {
    /// Spawn the loop on the current tokio runtime, initially stopped
    pub fn spawn<T: ScrollTarget>(table: SpeedTable, tick: Duration, target: Arc<T>) -> Self {
        let (params_tx, mut params_rx) = watch::channel(ScrollParams::default());
        let tick = tick.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut engine = ScrollEngine::new(table);
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            debug!(tick_ms = tick.as_millis() as u64, "scroll loop started");

            loop {
                if !engine.params().is_playing {
                    if params_rx.changed().await.is_err() {
                        break;
                    }
                    engine.set_params(*params_rx.borrow_and_update());
                    interval.reset();
                    continue;
                }

                interval.tick().await;

                if params_rx.has_changed().unwrap_or(false) {
                    engine.set_params(*params_rx.borrow_and_update());
                }

                let pixels = engine.tick();
                if pixels > 0 {
                    trace!(pixels, "scroll step");
                    target.scroll_by(pixels);
                }
            }

            debug!(total_pixels = engine.total_pixels(), "scroll loop stopped");
        });

        Self { params_tx, task }
    }

    /// Replace the motion parameters
    pub fn set_params(&self, params: ScrollParams) {
        self.params_tx.send_if_modified(|current| {
            let changed = *current != params;
            *current = params;
            changed
        });
    }

    /// Current motion parameters
    pub fn params(&self) -> ScrollParams {
        *self.params_tx.borrow()
    }

    /// Cancel the loop; the target is not scrolled again
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Whether the loop has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ScrollRunner {
    fn drop(&mut self) {
        self.task.abort();
    }
}

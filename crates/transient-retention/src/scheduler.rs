// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixed-interval driver for the retention sweeper.
//
// Each tick spawns a sweep attempt; the sweeper's own state machine drops the
// attempt if the previous sweep is still running.  Missed ticks are skipped
// rather than replayed in a burst.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::sweeper::RetentionSweeper;

/// Runs sweeps on a timer until told to stop.
pub struct SweepScheduler {
    sweeper: Arc<RetentionSweeper>,
    interval: Duration,
}

impl SweepScheduler {
    /// Schedule at the sweeper's configured interval.
    pub fn new(sweeper: Arc<RetentionSweeper>) -> Self {
        let interval = sweeper.window().interval();
        Self { sweeper, interval }
    }

    /// Schedule at an explicit interval.
    pub fn with_interval(sweeper: Arc<RetentionSweeper>, interval: Duration) -> Self {
        Self { sweeper, interval }
    }

    /// Start ticking in the background.  The first tick fires immediately.
    /// The task ends once `shutdown` reads `true` or its sender is dropped.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval_secs = self.interval.as_secs(), "sweep scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let sweeper = Arc::clone(&self.sweeper);
                        tokio::spawn(async move {
                            if sweeper.try_sweep().await.is_none() {
                                debug!("scheduled tick dropped, previous sweep still running");
                            }
                        });
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("sweep scheduler stopped");
        })
    }
}

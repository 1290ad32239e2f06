// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retention sweeper — deletes temporary objects older than the TTL.
//
// Two states: Idle and Sweeping.  A trigger while a sweep is running is
// dropped, not queued; whatever it would have found is picked up by the next
// trigger after the running sweep finishes.  Failures never escape a sweep:
// a failed delete is recorded and the sweep moves on, and a failed listing
// zeroes that resource kind's contribution without touching the other kinds.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use transient_core::clock::Clock;
use transient_core::config::RetentionWindow;
use transient_core::error::{Result, TransientError};
use transient_core::{ObjectId, ResourceKind, TEMPORARY_TAG};
use tracing::{debug, info, instrument, warn};
use transient_store::ObjectStore;

use crate::scanner::{RetentionScanner, ScanLimits};

/// Sweeper lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SweepState {
    Idle,
    Sweeping,
}

/// A delete that did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    pub id: ObjectId,
    pub error: String,
}

/// Outcome of sweeping one resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindReport {
    pub kind: ResourceKind,
    /// Tagged objects examined.
    pub examined: usize,
    /// Examined objects older than the TTL.
    pub expired: usize,
    pub deleted: Vec<ObjectId>,
    pub failures: Vec<DeleteFailure>,
    /// Set when the listing for this kind failed.
    pub listing_error: Option<String>,
}

impl KindReport {
    fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            examined: 0,
            expired: 0,
            deleted: Vec::new(),
            failures: Vec::new(),
            listing_error: None,
        }
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

/// Aggregate outcome of one sweep across every resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub kinds: Vec<KindReport>,
}

impl SweepReport {
    pub fn deleted(&self) -> usize {
        self.kinds.iter().map(KindReport::deleted_count).sum()
    }

    /// Tagged objects examined across all kinds.
    pub fn attempted(&self) -> usize {
        self.kinds.iter().map(|k| k.examined).sum()
    }

    pub fn expired(&self) -> usize {
        self.kinds.iter().map(|k| k.expired).sum()
    }

    pub fn failed(&self) -> usize {
        self.kinds.iter().map(|k| k.failures.len()).sum()
    }

    pub fn kind(&self, kind: ResourceKind) -> Option<&KindReport> {
        self.kinds.iter().find(|k| k.kind == kind)
    }

    /// `Err(PartialSweepFailure)` if any delete failed.
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failed();
        if failed == 0 {
            Ok(self)
        } else {
            Err(TransientError::PartialSweepFailure {
                failed,
                attempted: self.attempted(),
            })
        }
    }
}

/// Returns the sweeper to Idle when a sweep ends, including by cancellation.
struct SweepingGuard<'a>(&'a AtomicBool);

impl Drop for SweepingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Lists, classifies, and deletes expired temporary objects.
pub struct RetentionSweeper {
    store: Arc<dyn ObjectStore>,
    scanner: RetentionScanner,
    clock: Arc<dyn Clock>,
    window: RetentionWindow,
    tag: String,
    sweeping: AtomicBool,
}

impl RetentionSweeper {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        clock: Arc<dyn Clock>,
        window: RetentionWindow,
        limits: ScanLimits,
    ) -> Self {
        let scanner = RetentionScanner::new(Arc::clone(&store), Arc::clone(&clock), limits);
        Self {
            store,
            scanner,
            clock,
            window,
            tag: TEMPORARY_TAG.to_string(),
            sweeping: AtomicBool::new(false),
        }
    }

    pub fn window(&self) -> RetentionWindow {
        self.window
    }

    pub fn state(&self) -> SweepState {
        if self.sweeping.load(Ordering::Acquire) {
            SweepState::Sweeping
        } else {
            SweepState::Idle
        }
    }

    /// Run one sweep unless one is already running.
    ///
    /// Returns `None` when the trigger was dropped because a sweep was in
    /// progress.
    #[instrument(skip_all)]
    pub async fn try_sweep(&self) -> Option<SweepReport> {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("sweep already in progress, trigger dropped");
            return None;
        }
        let _guard = SweepingGuard(&self.sweeping);

        let started_at = self.clock.now();
        let timer = Instant::now();
        info!(ttl_secs = self.window.ttl().as_secs(), "retention sweep started");

        let mut kinds = Vec::with_capacity(ResourceKind::ALL.len());
        for kind in ResourceKind::ALL {
            kinds.push(self.sweep_kind(kind).await);
        }

        let report = SweepReport {
            started_at,
            elapsed_ms: timer.elapsed().as_millis() as u64,
            kinds,
        };

        for kind in &report.kinds {
            info!(
                kind = %kind.kind,
                examined = kind.examined,
                expired = kind.expired,
                deleted = kind.deleted_count(),
                failed = kind.failures.len(),
                listing_failed = kind.listing_error.is_some(),
                "sweep breakdown"
            );
        }
        info!(
            deleted = report.deleted(),
            attempted = report.attempted(),
            elapsed_ms = report.elapsed_ms,
            "retention sweep finished"
        );
        if report.failed() > 0 {
            warn!(failed = report.failed(), "some expired objects could not be deleted");
        }

        Some(report)
    }

    /// Sweep one resource kind.
    ///
    /// The listing is drained before anything is deleted: deleting while
    /// paging would shift later objects under an offset cursor and hide them
    /// from this sweep.  Only ids are kept between the two phases.
    async fn sweep_kind(&self, kind: ResourceKind) -> KindReport {
        let (mut report, expired) = self
            .scanner
            .list_tagged(&self.tag, kind)
            .fold(
                (KindReport::new(kind), Vec::new()),
                move |(mut report, mut expired), listed| async move {
                    match listed {
                        Ok(object) => {
                            report.examined += 1;
                            if self.scanner.is_expired(&object, &self.window) {
                                expired.push(object.id);
                            }
                        }
                        Err(err) => {
                            warn!(%kind, %err, "listing failed, skipping this kind");
                            report.listing_error = Some(err.to_string());
                        }
                    }
                    (report, expired)
                },
            )
            .await;

        // A partial listing contributes nothing; the next sweep starts over.
        if report.listing_error.is_some() {
            return report;
        }

        report.expired = expired.len();
        stream::iter(expired)
            .fold(report, move |mut report, id| async move {
                self.delete_into(&mut report, id).await;
                report
            })
            .await
    }

    async fn delete_into(&self, report: &mut KindReport, id: ObjectId) {
        let kind = report.kind;
        match self.store.delete(&id, kind).await {
            Ok(()) => {
                debug!(%id, %kind, "expired object deleted");
                report.deleted.push(id);
            }
            Err(err) => {
                warn!(%id, %kind, %err, "failed to delete expired object");
                report.failures.push(DeleteFailure {
                    id,
                    error: err.to_string(),
                });
            }
        }
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// transient-retention — reclaims temporary objects once they outlive the TTL.
//
// The scanner lists tagged objects lazily and classifies them by age, the
// sweeper deletes the expired ones under an Idle/Sweeping state machine, and
// the scheduler drives the sweeper from a fixed-interval timer.

pub mod scanner;
pub mod scheduler;
pub mod sweeper;

pub use scanner::{RetentionScanner, ScanLimits};
pub use scheduler::SweepScheduler;
pub use sweeper::{KindReport, RetentionSweeper, SweepReport, SweepState};

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use anyhow::Result;
use tracing::{info, warn};

use super::print_json;
use crate::services::app_services::TransientService;

/// Run one retention sweep now and print its report.
///
/// Failed deletions are reported, not treated as a command failure; the
/// objects stay tagged and the next sweep retries them.
pub async fn execute(service: &TransientService) -> Result<()> {
    let Some(report) = service.run_retention_sweep().await else {
        anyhow::bail!("a retention sweep is already running");
    };

    if report.failed() > 0 {
        warn!(
            failed = report.failed(),
            attempted = report.attempted(),
            "sweep finished with failed deletions"
        );
    } else {
        info!(deleted = report.deleted(), "sweep finished");
    }
    print_json(&report)
}

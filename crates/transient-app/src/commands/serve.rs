// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::info;

use crate::services::app_services::TransientService;

/// Run scheduled retention sweeps until Ctrl-C.
pub async fn execute(service: &TransientService) -> Result<()> {
    let (stop, stopped) = watch::channel(false);
    let scheduler = service.scheduler().spawn(stopped);
    info!(store = service.store_name(), "transient serving, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("listening for Ctrl-C")?;
    info!("shutdown requested");

    // The scheduler may already have exited; nothing to notify then.
    let _ = stop.send(true);
    scheduler.await.context("joining the sweep scheduler")?;
    Ok(())
}

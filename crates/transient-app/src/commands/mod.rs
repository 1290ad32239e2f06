// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations.  Each command takes its parsed arguments and
// the shared service facade, and prints a JSON summary on stdout.

pub mod documents;
pub mod serve;
pub mod sweep;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// Read an input file, naming it in the error.
pub(crate) async fn read_input(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

/// Write an output file, naming it in the error.
pub(crate) async fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    tokio::fs::write(path, data)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

/// Pretty-print a summary to stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transient — temporary PDF processing with tag-based retention
//
// Entry point. Initialises logging, loads configuration, opens the local
// object store, and dispatches to a subcommand.

mod commands;
mod services;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use transient_core::AppConfig;
use transient_core::config::ENV_DATA_DIR;

use commands::documents::{InfoArgs, MergeArgs, ReorderArgs, SplitArgs};
use services::app_services::TransientService;
use services::data_dir;

#[derive(Parser)]
#[command(name = "transient")]
#[command(version)]
#[command(about = "Merge, split, and reorder PDFs into short-lived stored objects", long_about = None)]
struct Cli {
    /// Data directory holding config.json and the object store
    #[arg(long, global = true, value_name = "DIR", env = ENV_DATA_DIR)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scheduled retention sweeps until Ctrl-C
    Serve,
    /// Run one retention sweep now and print the report
    Sweep,
    /// Merge PDFs in the order given
    Merge(MergeArgs),
    /// Split a PDF into one document per page-range group
    Split(SplitArgs),
    /// Rearrange the pages of a PDF
    Reorder(ReorderArgs),
    /// Show page count and metadata of a PDF
    Info(InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("Transient starting");

    let base = cli.data_dir.clone().unwrap_or_else(data_dir::data_dir);
    let mut config = AppConfig::load(&base)
        .with_context(|| format!("loading configuration from {}", base.display()))?;
    config.apply_env();
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir;
    }

    let store_root = data_dir::store_dir(config.data_dir.as_deref().unwrap_or(&base));
    let service = TransientService::init(&config, &store_root)
        .await
        .context("initialising services")?;

    match cli.command {
        Commands::Serve => commands::serve::execute(&service).await,
        Commands::Sweep => commands::sweep::execute(&service).await,
        Commands::Merge(args) => commands::documents::merge(&service, args).await,
        Commands::Split(args) => commands::documents::split(&service, args).await,
        Commands::Reorder(args) => commands::documents::reorder(&service, args).await,
        Commands::Info(args) => commands::documents::info(&service, args).await,
    }
}

//! vidsplit
//!
//! Splits every video in a directory into fixed-length segments named by the
//! timestamp at which each segment starts.
//!
//! # Usage
//!
//! ```bash
//! vidsplit ./camera 00:00:00 00:10:00 ./segments
//! vidsplit --mode copy --json ./camera 00:00:30 00:05:00 ./segments
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use vidsplit::adapters::TracingLogAdapter;
use vidsplit::cli::{commands, Cli};

/// Main entry point for the vidsplit CLI application
fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::resolve_config(&cli)?;
    TracingLogAdapter::init(&config.logging)?;

    info!("Starting vidsplit");

    let outputs = commands::split(&cli, &config)?;
    commands::print_results(&outputs, cli.options.json)?;

    info!(segments = outputs.len(), "vidsplit completed successfully");
    Ok(())
}

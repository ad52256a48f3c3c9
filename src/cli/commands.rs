//! Command implementations

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::toml_config::{AppConfig, TomlConfigAdapter};
use crate::app::{AppContainer, DefaultAppContainer};
use crate::cli::Cli;
use crate::domain::model::{BatchRequest, SplitOutput};

/// Resolve configuration with precedence CLI > environment > file > defaults.
/// Environment values reach this point through the clap `env` attributes.
pub fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = TomlConfigAdapter::load(cli.options.config.as_deref())?;
    apply_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    let options = &cli.options;
    if let Some(mode) = options.mode {
        config.split.mode = mode;
    }
    if let Some(overwrite) = options.overwrite {
        config.split.overwrite = overwrite;
    }
    if let Some(source) = options.metadata_source {
        config.metadata.source = source;
    }
    if let Some(level) = &options.log_level {
        config.logging.level = level.clone();
    }
}

/// Execute the split over the input directory
pub fn split(cli: &Cli, config: &AppConfig) -> Result<Vec<SplitOutput>> {
    let request = BatchRequest::new(
        &cli.input_dir,
        cli.start_time,
        cli.segment_length,
        &cli.output_dir,
    )?;

    info!(
        mode = %config.split.mode,
        metadata_source = ?config.metadata.source,
        dry_run = cli.options.dry_run,
        "Starting split"
    );

    let container = DefaultAppContainer::new(config, cli.options.dry_run)?;
    let outputs = container.batch_interactor().run(&request)?;
    Ok(outputs)
}

/// Print results to stdout, as tab-separated lines or a JSON array
pub fn print_results(outputs: &[SplitOutput], json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, outputs).context("Failed to write JSON results")?;
        writeln!(out)?;
    } else {
        for output in outputs {
            writeln!(out, "{}", output)?;
        }
    }
    out.flush()?;
    Ok(())
}

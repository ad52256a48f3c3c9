//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::domain::model::{CreationTimeSource, OverwritePolicy, SplitMode, TimeSpec};

/// Options layered over the configuration file
#[derive(Args, Debug, Default, Clone)]
pub struct SplitArgs {
    /// TOML configuration file (default: ./vidsplit.toml when present)
    #[arg(long, env = "VIDSPLIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cutting strategy: reencode (exact cuts) or copy (keyframe cuts)
    #[arg(long, env = "VIDSPLIT_MODE", value_parser = parse_mode)]
    pub mode: Option<SplitMode>,

    /// Where creation dates come from: hachoir, container or none
    #[arg(long, env = "VIDSPLIT_METADATA_SOURCE", value_parser = parse_source)]
    pub metadata_source: Option<CreationTimeSource>,

    /// Logging level
    #[arg(long, env = "VIDSPLIT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Overwrite behavior for existing segment files: always or never
    #[arg(long, value_parser = parse_overwrite)]
    pub overwrite: Option<OverwritePolicy>,

    /// Print results as a JSON array
    #[arg(long)]
    pub json: bool,

    /// Plan and print segments without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

pub fn parse_time(value: &str) -> Result<TimeSpec, String> {
    TimeSpec::parse(value).map_err(|e| e.to_string())
}

fn parse_mode(value: &str) -> Result<SplitMode, String> {
    SplitMode::parse(value).map_err(|e| e.to_string())
}

fn parse_source(value: &str) -> Result<CreationTimeSource, String> {
    CreationTimeSource::parse(value).map_err(|e| e.to_string())
}

fn parse_overwrite(value: &str) -> Result<OverwritePolicy, String> {
    OverwritePolicy::parse(value).map_err(|e| e.to_string())
}

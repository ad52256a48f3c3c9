//! CLI module for vidsplit
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::model::TimeSpec;

pub mod args;
pub mod commands;

/// vidsplit
///
/// Splits every video in a directory into fixed-length segments named after
/// the moment each segment was recorded.
#[derive(Parser, Debug)]
#[command(name = "vidsplit")]
#[command(about = "Split videos into fixed-length, timestamp-named segments")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Directory containing the source videos
    pub input_dir: PathBuf,

    /// Offset into each video where the first segment starts (HH:MM:SS)
    #[arg(value_parser = args::parse_time)]
    pub start_time: TimeSpec,

    /// Length of every segment but the last (HH:MM:SS)
    #[arg(value_parser = args::parse_time)]
    pub segment_length: TimeSpec,

    /// Directory receiving the segments
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub options: args::SplitArgs,
}

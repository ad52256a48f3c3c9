// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Time argument in whole seconds, written on the command line as `HH:MM:SS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeSpec {
    pub seconds: u64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: u64) -> Self {
        Self { seconds }
    }

    /// Create a new TimeSpec from hours, minutes, seconds
    pub fn from_components(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            seconds: hours as u64 * 3600 + minutes as u64 * 60 + seconds as u64,
        }
    }

    /// Parse a `HH:MM:SS` clock string (hours 00-23)
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();
        let time = NaiveTime::parse_from_str(trimmed, "%H:%M:%S").map_err(|e| {
            DomainError::BadArgs(format!(
                "Invalid time '{}': {}. Expected HH:MM:SS",
                trimmed, e
            ))
        })?;

        // chrono accepts a leap second as :60
        if time.nanosecond() >= 1_000_000_000 {
            return Err(DomainError::BadArgs(format!(
                "Invalid time '{}': seconds must be less than 60",
                trimmed
            )));
        }

        Ok(Self::from_seconds(time.num_seconds_from_midnight() as u64))
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.seconds as f64
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.seconds / 3600,
            (self.seconds % 3600) / 60,
            self.seconds % 60
        )
    }
}

/// How segments are cut out of the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Decode and re-encode: exact cut points, H.264/AAC output
    Reencode,
    /// Stream copy: no quality loss, cuts snap to the preceding keyframe
    Copy,
}

impl SplitMode {
    /// Parse split mode from string
    pub fn parse(mode_str: &str) -> Result<Self, DomainError> {
        match mode_str.trim().to_lowercase().as_str() {
            "reencode" => Ok(SplitMode::Reencode),
            "copy" => Ok(SplitMode::Copy),
            other => Err(DomainError::BadArgs(format!(
                "Invalid split mode: {}. Valid modes: reencode, copy",
                other
            ))),
        }
    }
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitMode::Reencode => write!(f, "reencode"),
            SplitMode::Copy => write!(f, "copy"),
        }
    }
}

/// What happens when a segment's output path already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    Always,
    Never,
}

impl OverwritePolicy {
    pub fn parse(policy_str: &str) -> Result<Self, DomainError> {
        match policy_str.trim().to_lowercase().as_str() {
            "always" => Ok(OverwritePolicy::Always),
            "never" => Ok(OverwritePolicy::Never),
            other => Err(DomainError::BadArgs(format!(
                "Invalid overwrite policy: {}. Valid policies: always, never",
                other
            ))),
        }
    }
}

/// Where the creation timestamp of a source comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreationTimeSource {
    /// `hachoir-metadata` subprocess output
    Hachoir,
    /// The container's `creation_time` tag
    Container,
    /// Always fall back to the clock
    None,
}

impl CreationTimeSource {
    pub fn parse(source_str: &str) -> Result<Self, DomainError> {
        match source_str.trim().to_lowercase().as_str() {
            "hachoir" => Ok(CreationTimeSource::Hachoir),
            "container" => Ok(CreationTimeSource::Container),
            "none" => Ok(CreationTimeSource::None),
            other => Err(DomainError::BadArgs(format!(
                "Invalid metadata source: {}. Valid sources: hachoir, container, none",
                other
            ))),
        }
    }
}

/// Probed properties of a source video
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub path: PathBuf,
    /// Duration in seconds
    pub duration: f64,
    /// Frames per second of the primary video stream
    pub frame_rate: f64,
    pub has_audio: bool,
}

impl MediaInfo {
    /// Create new media info with validation
    pub fn new(
        path: impl Into<PathBuf>,
        duration: f64,
        frame_rate: f64,
        has_audio: bool,
    ) -> Result<Self, DomainError> {
        let path = path.into();
        if !duration.is_finite() || duration < 0.0 {
            return Err(DomainError::ValidationFailed(format!(
                "Invalid duration {} for {}",
                duration,
                path.display()
            )));
        }
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(DomainError::ValidationFailed(format!(
                "Frame rate must be positive, got {} for {}",
                frame_rate,
                path.display()
            )));
        }

        Ok(Self {
            path,
            duration,
            frame_rate,
            has_audio,
        })
    }
}

/// Offsets of one segment inside the source, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentBounds {
    pub start: f64,
    pub end: f64,
}

impl SegmentBounds {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// The same window moved by `offset` seconds
    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

/// A planned segment with its derived wall-clock timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub bounds: SegmentBounds,
    pub timestamp: NaiveDateTime,
}

/// One split invocation for a single source file
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub source: PathBuf,
    pub start: TimeSpec,
    pub segment_length: TimeSpec,
    pub output_dir: PathBuf,
}

impl SplitRequest {
    /// Create new split request with validation
    pub fn new(
        source: impl Into<PathBuf>,
        start: TimeSpec,
        segment_length: TimeSpec,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, DomainError> {
        if segment_length.is_zero() {
            return Err(DomainError::InvalidTimeRange(
                "Segment length must be greater than 00:00:00".to_string(),
            ));
        }

        Ok(Self {
            source: source.into(),
            start,
            segment_length,
            output_dir: output_dir.into(),
        })
    }
}

/// One batch run over an input directory
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub input_dir: PathBuf,
    pub start: TimeSpec,
    pub segment_length: TimeSpec,
    pub output_dir: PathBuf,
}

impl BatchRequest {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        start: TimeSpec,
        segment_length: TimeSpec,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, DomainError> {
        let input_dir = input_dir.into();
        let output_dir = output_dir.into();
        // shares validation with the per-file request
        SplitRequest::new(&input_dir, start, segment_length, &output_dir)?;

        Ok(Self {
            input_dir,
            start,
            segment_length,
            output_dir,
        })
    }

    /// Split request for one file of the batch
    pub fn for_source(&self, source: &Path) -> SplitRequest {
        SplitRequest {
            source: source.to_path_buf(),
            start: self.start,
            segment_length: self.segment_length,
            output_dir: self.output_dir.clone(),
        }
    }
}

/// A written (or, in a dry run, planned) segment file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitOutput {
    pub timestamp: NaiveDateTime,
    pub path: PathBuf,
}

impl fmt::Display for SplitOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.path.display()
        )
    }
}

/// What the media writer reports for a finished segment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteReport {
    pub packets_written: usize,
    pub bytes_written: u64,
}

#[cfg(test)]
mod tests;

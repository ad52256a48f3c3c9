// Domain rules - Segment planning, output naming and input selection

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};

use crate::domain::model::*;

/// Suffix and container of every written segment
pub const OUTPUT_SUFFIX: &str = "_.mp4";

/// Timestamp layout of output file names
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Input extensions recognised by default
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[
    "3g2", "3gp", "asf", "asx", "avi", "flv", "m2ts", "mkv", "mov", "mp4", "mpg", "mpeg", "rm",
    "swf", "vob", "wmv",
];

/// Computes contiguous segment bounds over a source
pub struct SegmentPlanner;

impl SegmentPlanner {
    /// Partition `[start, duration)` into segments of `length` seconds.
    ///
    /// Every segment but the last is exactly `length` long. The last one runs
    /// to `duration` and is only emitted when it is longer than `min_tail`,
    /// so an exact multiple never produces a zero-length file.
    pub fn plan(duration: f64, start: f64, length: f64, min_tail: f64) -> Vec<SegmentBounds> {
        let mut segments = Vec::new();
        if length <= 0.0 || start >= duration {
            return segments;
        }

        let mut offset = start;
        while offset + length < duration {
            segments.push(SegmentBounds {
                start: offset,
                end: offset + length,
            });
            offset += length;
        }

        if duration - offset > min_tail.max(0.0) {
            segments.push(SegmentBounds {
                start: offset,
                end: duration,
            });
        }

        segments
    }

    /// Attach wall-clock timestamps derived from the creation time
    pub fn timestamp(bounds: Vec<SegmentBounds>, creation: NaiveDateTime) -> Vec<Segment> {
        bounds
            .into_iter()
            .map(|bounds| Segment {
                timestamp: creation + Duration::milliseconds((bounds.start * 1000.0).round() as i64),
                bounds,
            })
            .collect()
    }
}

/// Builds output paths from segment timestamps
pub struct OutputNaming;

impl OutputNaming {
    /// `YYYYMMDDhhmmss_.mp4`
    pub fn file_name(timestamp: &NaiveDateTime) -> String {
        format!(
            "{}{}",
            timestamp.format(OUTPUT_TIMESTAMP_FORMAT),
            OUTPUT_SUFFIX
        )
    }

    pub fn output_path(output_dir: &Path, timestamp: &NaiveDateTime) -> PathBuf {
        output_dir.join(Self::file_name(timestamp))
    }
}

/// Extension allow-list for batch input selection
#[derive(Debug, Clone)]
pub struct VideoExtensions {
    extensions: Vec<String>,
}

impl Default for VideoExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_VIDEO_EXTENSIONS.iter().copied())
    }
}

impl VideoExtensions {
    /// Build an allow-list; leading dots and case are ignored
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    /// Matches on the file-name suffix, so a bare `.mp4` counts too
    pub fn is_video(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        let name = name.to_lowercase();
        self.extensions.iter().any(|known| {
            name.strip_suffix(known.as_str())
                .map_or(false, |stem| stem.ends_with('.'))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

#[cfg(test)]
mod tests;

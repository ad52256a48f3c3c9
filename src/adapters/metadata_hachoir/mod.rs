//! hachoir-metadata adapter
//!
//! Runs `hachoir-metadata <file>` and picks the creation date out of its
//! human-readable report.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{SplitError, SplitResult};
use crate::ports::CreationTimePort;

pub const DEFAULT_COMMAND: &str = "hachoir-metadata";
pub const DEFAULT_LABEL: &str = "- Creation date: ";
pub const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Subprocess-backed creation date reader
#[derive(Debug, Clone)]
pub struct HachoirMetadataAdapter {
    command: PathBuf,
    label: String,
    format: String,
}

impl Default for HachoirMetadataAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND, DEFAULT_LABEL, DEFAULT_FORMAT)
    }
}

impl HachoirMetadataAdapter {
    pub fn new(
        command: impl Into<PathBuf>,
        label: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            label: label.into(),
            format: format.into(),
        }
    }

    /// Scan a metadata report for the last line starting with the label.
    pub fn parse_report(&self, report: &str) -> Result<Option<NaiveDateTime>, String> {
        let mut found = None;
        for line in report.lines() {
            if let Some(value) = line.strip_prefix(self.label.as_str()) {
                let value = value.trim();
                let parsed = NaiveDateTime::parse_from_str(value, &self.format).map_err(|e| {
                    format!(
                        "creation date '{}' does not match '{}': {}",
                        value, self.format, e
                    )
                })?;
                found = Some(parsed);
            }
        }
        Ok(found)
    }
}

impl CreationTimePort for HachoirMetadataAdapter {
    fn creation_time(&self, path: &Path) -> SplitResult<Option<NaiveDateTime>> {
        let metadata_error = |message: String| SplitError::Metadata {
            path: path.to_path_buf(),
            message,
        };

        debug!(command = %self.command.display(), path = %path.display(), "Running metadata extractor");
        let output = Command::new(&self.command)
            .arg(path)
            .output()
            .map_err(|e| {
                metadata_error(format!("failed to run {}: {}", self.command.display(), e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(metadata_error(format!(
                "{} exited with {}: {}",
                self.command.display(),
                output.status,
                stderr.trim()
            )));
        }

        // the report may be split across both streams
        let report = format!("{}\n{}", stdout, stderr);
        let creation = self.parse_report(&report).map_err(metadata_error)?;
        debug!(path = %path.display(), ?creation, "Metadata extractor finished");
        Ok(creation)
    }
}

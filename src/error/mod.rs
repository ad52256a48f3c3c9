//! Error handling module for vidsplit

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for vidsplit operations
#[derive(Error, Debug)]
pub enum SplitError {
    /// Input directory missing or not a directory
    #[error("Not a valid directory path: {path}")]
    InputDirNotFound { path: PathBuf },

    /// Domain validation failure (time arguments, modes, ranges)
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Media probe error
    #[error("Failed to probe media file {path}: {message}")]
    Probe { path: PathBuf, message: String },

    /// Creation date extraction error
    #[error("Failed to read creation date of {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// Segment encode or mux error
    #[error("Failed to write segment {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Output file exists and the overwrite policy forbids replacing it
    #[error("Output file already exists: {path}")]
    OutputExists { path: PathBuf },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error
    #[error("Directory listing error: {0}")]
    Walk(#[from] walkdir::Error),

    /// FFmpeg error
    #[error("FFmpeg error: {0}")]
    FFmpeg(#[from] ffmpeg_next::Error),
}

/// Result type alias for vidsplit operations
pub type SplitResult<T> = std::result::Result<T, SplitError>;

impl SplitError {
    pub(crate) fn encode(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        SplitError::Encode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        SplitError::Config {
            message: message.into(),
        }
    }
}

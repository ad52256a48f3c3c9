// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::domain::model::*;
use crate::error::SplitResult;

/// Port for opening source media
pub trait MediaPort: Send + Sync {
    /// Open a source file and probe its duration and frame rate
    fn open(&self, path: &Path) -> SplitResult<Box<dyn MediaSource>>;
}

/// An opened source. Dropping it releases the underlying resources; `close`
/// does so explicitly.
pub trait MediaSource {
    /// Probed properties of the source
    fn info(&self) -> &MediaInfo;

    /// Write `[bounds.start, bounds.end)` of the source to `output`, keeping
    /// the source frame rate and audio
    fn write_segment(&mut self, bounds: &SegmentBounds, output: &Path) -> SplitResult<WriteReport>;

    /// Release the source
    fn close(self: Box<Self>);
}

/// Port for reading the recording date of a source
pub trait CreationTimePort: Send + Sync {
    /// `Ok(None)` when the source carries no creation date
    fn creation_time(&self, path: &Path) -> SplitResult<Option<NaiveDateTime>>;
}

/// Port for the wall clock used when no creation date is available
pub trait ClockPort: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Port for file system operations
pub trait FsPort: Send + Sync {
    /// Check if a regular file exists
    fn file_exists(&self, path: &Path) -> bool;

    /// Check if directory exists
    fn directory_exists(&self, path: &Path) -> bool;

    /// Regular files directly inside `dir`, sorted by file name
    fn list_files(&self, dir: &Path) -> SplitResult<Vec<PathBuf>>;

    /// Create directory (including parent directories)
    fn create_directory(&self, path: &Path) -> SplitResult<()>;
}

// Local filesystem adapter - Directory listing and output directory handling

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::SplitResult;
use crate::ports::*;

/// Local filesystem adapter
#[derive(Debug, Default, Clone)]
pub struct FsLocalAdapter;

impl FsLocalAdapter {
    /// Create new filesystem adapter
    pub fn new() -> Self {
        Self
    }
}

impl FsPort for FsLocalAdapter {
    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn directory_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_files(&self, dir: &Path) -> SplitResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            } else {
                debug!(path = %entry.path().display(), "Skipping non-file entry");
            }
        }
        Ok(files)
    }

    fn create_directory(&self, path: &Path) -> SplitResult<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }
}

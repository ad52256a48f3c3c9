// Batch interactor - Runs the split use case over a directory

use std::sync::Arc;

use tracing::{debug, info};

use crate::app::split_interactor::SplitInteractor;
use crate::domain::model::*;
use crate::domain::rules::VideoExtensions;
use crate::error::{SplitError, SplitResult};
use crate::ports::FsPort;

/// Interactor for the batch use case
pub struct BatchInteractor {
    split_interactor: Arc<SplitInteractor>,
    fs_port: Arc<dyn FsPort>,
    extensions: VideoExtensions,
}

impl BatchInteractor {
    pub fn new(
        split_interactor: Arc<SplitInteractor>,
        fs_port: Arc<dyn FsPort>,
        extensions: VideoExtensions,
    ) -> Self {
        Self {
            split_interactor,
            fs_port,
            extensions,
        }
    }

    /// Split every video directly inside the input directory, in file name
    /// order, and concatenate the results
    pub fn run(&self, request: &BatchRequest) -> SplitResult<Vec<SplitOutput>> {
        if !self.fs_port.directory_exists(&request.input_dir) {
            return Err(SplitError::InputDirNotFound {
                path: request.input_dir.clone(),
            });
        }

        let sources: Vec<_> = self
            .fs_port
            .list_files(&request.input_dir)?
            .into_iter()
            .filter(|path| {
                let keep = self.extensions.is_video(path);
                if !keep {
                    debug!(path = %path.display(), "Skipping non-video file");
                }
                keep
            })
            .collect();

        info!(
            input_dir = %request.input_dir.display(),
            sources = sources.len(),
            start = %request.start,
            segment_length = %request.segment_length,
            "Starting batch"
        );

        let mut outputs = Vec::new();
        for source in &sources {
            info!(path = %source.display(), "Processing source");
            let segments = self.split_interactor.split(&request.for_source(source))?;
            outputs.extend(segments);
        }

        info!(outputs = outputs.len(), "Batch finished");
        Ok(outputs)
    }
}

// Split interactor - Orchestrates splitting one source into segments

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::model::*;
use crate::domain::rules::*;
use crate::error::{SplitError, SplitResult};
use crate::ports::*;

/// Knobs that shape how every source is split
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOptions {
    pub overwrite: OverwritePolicy,
    pub create_output_dir: bool,
    pub min_tail_seconds: f64,
    /// Plan and name segments without writing anything
    pub dry_run: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            overwrite: OverwritePolicy::Always,
            create_output_dir: true,
            min_tail_seconds: 0.0,
            dry_run: false,
        }
    }
}

/// Interactor for the split use case
pub struct SplitInteractor {
    media_port: Arc<dyn MediaPort>,
    creation_port: Arc<dyn CreationTimePort>,
    clock_port: Arc<dyn ClockPort>,
    fs_port: Arc<dyn FsPort>,
    options: SplitOptions,
}

impl SplitInteractor {
    /// Create new split interactor with injected ports
    pub fn new(
        media_port: Arc<dyn MediaPort>,
        creation_port: Arc<dyn CreationTimePort>,
        clock_port: Arc<dyn ClockPort>,
        fs_port: Arc<dyn FsPort>,
        options: SplitOptions,
    ) -> Self {
        Self {
            media_port,
            creation_port,
            clock_port,
            fs_port,
            options,
        }
    }

    /// Split one source and return the written segments in chronological
    /// order. A missing source yields no segments.
    pub fn split(&self, request: &SplitRequest) -> SplitResult<Vec<SplitOutput>> {
        if !self.fs_port.file_exists(&request.source) {
            debug!(path = %request.source.display(), "Source does not exist, nothing to split");
            return Ok(Vec::new());
        }

        let mut source = self.media_port.open(&request.source)?;
        let result = self.split_source(source.as_mut(), request);
        source.close();
        result
    }

    fn split_source(
        &self,
        source: &mut dyn MediaSource,
        request: &SplitRequest,
    ) -> SplitResult<Vec<SplitOutput>> {
        // plan on whole seconds; sub-second container padding is never a segment
        let duration = source.info().duration.trunc();
        let start = request.start.as_secs_f64();
        if start >= duration {
            info!(
                path = %request.source.display(),
                start = %request.start,
                duration,
                "Start offset is past the end of the source, skipping"
            );
            return Ok(Vec::new());
        }

        let creation = self.creation_time(request)?;
        let bounds = SegmentPlanner::plan(
            duration,
            start,
            request.segment_length.as_secs_f64(),
            self.options.min_tail_seconds,
        );
        let segments = SegmentPlanner::timestamp(bounds, creation);
        info!(
            path = %request.source.display(),
            %creation,
            segments = segments.len(),
            "Planned segments"
        );

        if !self.options.dry_run && !segments.is_empty() {
            self.prepare_output_dir(request)?;
        }

        let mut outputs = Vec::with_capacity(segments.len());
        for segment in segments {
            let path = OutputNaming::output_path(&request.output_dir, &segment.timestamp);

            if self.fs_port.file_exists(&path) {
                match (self.options.overwrite, self.options.dry_run) {
                    (OverwritePolicy::Never, false) => {
                        return Err(SplitError::OutputExists { path });
                    }
                    (OverwritePolicy::Never, true) => {
                        warn!(path = %path.display(), "Output already exists and would not be replaced");
                    }
                    (OverwritePolicy::Always, _) => {
                        debug!(path = %path.display(), "Replacing existing output");
                    }
                }
            }

            if self.options.dry_run {
                info!(
                    path = %path.display(),
                    start = segment.bounds.start,
                    end = segment.bounds.end,
                    "Dry run, segment not written"
                );
            } else {
                let report = source.write_segment(&segment.bounds, &path)?;
                info!(
                    path = %path.display(),
                    start = segment.bounds.start,
                    end = segment.bounds.end,
                    packets = report.packets_written,
                    bytes = report.bytes_written,
                    "Wrote segment"
                );
            }

            outputs.push(SplitOutput {
                timestamp: segment.timestamp,
                path,
            });
        }

        Ok(outputs)
    }

    /// Creation date of the source, or the current time when it has none
    fn creation_time(&self, request: &SplitRequest) -> SplitResult<chrono::NaiveDateTime> {
        match self.creation_port.creation_time(&request.source)? {
            Some(creation) => Ok(creation),
            None => {
                let now = self.clock_port.now();
                debug!(path = %request.source.display(), %now, "No creation date, using current time");
                Ok(now)
            }
        }
    }

    fn prepare_output_dir(&self, request: &SplitRequest) -> SplitResult<()> {
        if self.options.create_output_dir && !self.fs_port.directory_exists(&request.output_dir) {
            info!(path = %request.output_dir.display(), "Creating output directory");
            self.fs_port.create_directory(&request.output_dir)?;
        }
        Ok(())
    }
}

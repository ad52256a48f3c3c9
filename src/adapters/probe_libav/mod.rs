// Probe LibAV adapter - Opens sources and reads their properties using libav

use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use ffmpeg_next as ffmpeg;
use ffmpeg::format::context::Input;
use ffmpeg::media;
use ffmpeg::util::log::{self as av_log, Level};
use ffmpeg::Rational;
use tracing::{debug, info};

use crate::adapters::exec_libav::{self, EncodingSettings};
use crate::domain::model::*;
use crate::error::{SplitError, SplitResult};
use crate::ports::*;

/// Tag holding the recording date in MP4/MOV/Matroska containers
const CREATION_TIME_TAG: &str = "creation_time";

/// Initialise libav once per adapter and keep its own logging to errors
fn init_libav() -> SplitResult<()> {
    ffmpeg::init()?;
    av_log::set_level(Level::Error);
    Ok(())
}

fn probe_error(path: &Path, message: impl std::fmt::Display) -> SplitError {
    SplitError::Probe {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Media port backed by libav
pub struct LibavMediaPort {
    mode: SplitMode,
    settings: EncodingSettings,
}

impl LibavMediaPort {
    pub fn new(mode: SplitMode, settings: EncodingSettings) -> SplitResult<Self> {
        init_libav()?;
        Ok(Self { mode, settings })
    }

    /// Container duration, falling back to the video stream's own duration
    fn duration(ictx: &Input, path: &Path) -> SplitResult<f64> {
        let container = ictx.duration();
        if container > 0 {
            return Ok(container as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE));
        }

        ictx.streams()
            .best(media::Type::Video)
            .filter(|stream| stream.duration() > 0)
            .map(|stream| stream.duration() as f64 * f64::from(stream.time_base()))
            .ok_or_else(|| probe_error(path, "duration is unknown"))
    }

    /// Average frame rate, falling back to the stream's base rate when the
    /// container leaves it unset (ASF, RealMedia, FLV)
    pub fn frame_rate(average: Rational, base: Rational) -> Option<Rational> {
        [average, base]
            .into_iter()
            .find(|rate| rate.numerator() > 0 && rate.denominator() > 0)
    }

    fn probe(ictx: &Input, path: &Path) -> SplitResult<(MediaInfo, Rational)> {
        let video = ictx
            .streams()
            .best(media::Type::Video)
            .ok_or_else(|| probe_error(path, "no video stream"))?;
        let frame_rate = Self::frame_rate(video.avg_frame_rate(), video.rate())
            .ok_or_else(|| probe_error(path, "frame rate is unknown"))?;
        let has_audio = ictx.streams().best(media::Type::Audio).is_some();
        let duration = Self::duration(ictx, path)?;

        let info = MediaInfo::new(path, duration, f64::from(frame_rate), has_audio)
            .map_err(|e| probe_error(path, e))?;
        Ok((info, frame_rate))
    }
}

impl MediaPort for LibavMediaPort {
    fn open(&self, path: &Path) -> SplitResult<Box<dyn MediaSource>> {
        let ictx = ffmpeg::format::input(path).map_err(|e| probe_error(path, e))?;
        let (info, frame_rate) = Self::probe(&ictx, path)?;
        info!(
            path = %path.display(),
            duration = info.duration,
            frame_rate = info.frame_rate,
            has_audio = info.has_audio,
            "Opened source"
        );

        Ok(Box::new(LibavMediaSource {
            ictx,
            info,
            frame_rate,
            mode: self.mode,
            settings: self.settings.clone(),
        }))
    }
}

/// An opened libav input, reused for every segment of one source
pub struct LibavMediaSource {
    ictx: Input,
    info: MediaInfo,
    /// Exact probed rate; `info.frame_rate` is its decimal form
    frame_rate: Rational,
    mode: SplitMode,
    settings: EncodingSettings,
}

impl MediaSource for LibavMediaSource {
    fn info(&self) -> &MediaInfo {
        &self.info
    }

    fn write_segment(&mut self, bounds: &SegmentBounds, output: &Path) -> SplitResult<WriteReport> {
        debug!(
            mode = %self.mode,
            start = bounds.start,
            end = bounds.end,
            output = %output.display(),
            "Writing segment"
        );

        let result = match self.mode {
            SplitMode::Copy => exec_libav::copy_segment(&mut self.ictx, bounds, output),
            SplitMode::Reencode => exec_libav::reencode_segment(
                &mut self.ictx,
                bounds,
                self.frame_rate,
                output,
                &self.settings,
            ),
        };

        result.map_err(|e| match e {
            SplitError::FFmpeg(err) => SplitError::encode(output, err),
            other => other,
        })
    }

    fn close(self: Box<Self>) {
        debug!(path = %self.info.path.display(), "Closing source");
    }
}

/// Creation date from the container's `creation_time` tag
pub struct ContainerMetadataAdapter;

impl ContainerMetadataAdapter {
    pub fn new() -> SplitResult<Self> {
        init_libav()?;
        Ok(Self)
    }

    /// Parse an RFC 3339 tag value into naive UTC time
    pub fn parse_tag(value: &str) -> Result<NaiveDateTime, String> {
        DateTime::parse_from_rfc3339(value.trim())
            .map(|parsed| parsed.naive_utc())
            .map_err(|e| format!("creation_time '{}' is not RFC 3339: {}", value, e))
    }
}

impl CreationTimePort for ContainerMetadataAdapter {
    fn creation_time(&self, path: &Path) -> SplitResult<Option<NaiveDateTime>> {
        let metadata_error = |message: String| SplitError::Metadata {
            path: path.to_path_buf(),
            message,
        };

        let ictx = ffmpeg::format::input(path).map_err(|e| metadata_error(e.to_string()))?;

        // container tag first, then the video stream's
        let tag = ictx
            .metadata()
            .get(CREATION_TIME_TAG)
            .map(str::to_string)
            .or_else(|| {
                ictx.streams()
                    .best(media::Type::Video)
                    .and_then(|stream| stream.metadata().get(CREATION_TIME_TAG).map(str::to_string))
            });

        match tag {
            Some(value) => {
                let parsed = Self::parse_tag(&value).map_err(metadata_error)?;
                debug!(path = %path.display(), creation = %parsed, "Container creation time");
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }
}

/// Creation time port for the `none` source; the clock always decides
pub struct NoCreationTime;

impl CreationTimePort for NoCreationTime {
    fn creation_time(&self, _path: &Path) -> SplitResult<Option<NaiveDateTime>> {
        Ok(None)
    }
}

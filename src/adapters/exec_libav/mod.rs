//! Segment writers using libav bindings
//!
//! Both writers take an already opened input context, seek it to the segment
//! start and mux `[start, end)` into an MP4 file with timestamps rebased to
//! zero. Segment bounds are offsets from the start of the file; they are
//! moved onto the stream timeline first, since MPEG-TS and similar
//! containers do not start at zero.
//!
//! `copy_segment` remuxes packets untouched, starting at the keyframe at or
//! before the segment start. `reencode_segment` decodes from that keyframe,
//! drops frames outside the segment and encodes H.264 video at the source
//! frame rate. Audio is stream-copied when MP4 can carry it and transcoded
//! to AAC otherwise.

use std::path::Path;

use ffmpeg_next as ffmpeg;
use ffmpeg::codec::{self, Id};
use ffmpeg::format::{self, context::Input, context::Output};
use ffmpeg::software::scaling;
use ffmpeg::util::channel_layout::ChannelLayout;
use ffmpeg::util::format::sample::{Sample, Type as SampleType};
use ffmpeg::util::frame;
use ffmpeg::{encoder, filter, media, picture, Dictionary, Packet, Rational};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::model::*;
use crate::error::{SplitError, SplitResult};

pub const DEFAULT_VIDEO_ENCODER: &str = "libx264";
pub const DEFAULT_CRF: u8 = 23;
pub const DEFAULT_PRESET: &str = "medium";
pub const DEFAULT_AUDIO_BITRATE: usize = 128_000;

/// Audio codecs an MP4 file can carry without transcoding
const MP4_AUDIO_CODECS: &[Id] = &[Id::AAC, Id::MP3, Id::AC3, Id::EAC3, Id::ALAC];

/// Encoder settings for re-encoded segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingSettings {
    /// libav encoder name; falls back to any H.264 encoder when missing
    pub video_encoder: String,
    pub crf: u8,
    pub preset: String,
    /// AAC bit rate in bits per second, used only when audio is transcoded
    pub audio_bitrate: usize,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            video_encoder: DEFAULT_VIDEO_ENCODER.to_string(),
            crf: DEFAULT_CRF,
            preset: DEFAULT_PRESET.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE,
        }
    }
}

/// Streams carried into every segment
#[derive(Debug, Clone, Copy)]
struct StreamSelection {
    video: usize,
    audio: Option<usize>,
}

impl StreamSelection {
    fn of(ictx: &Input, output: &Path) -> SplitResult<Self> {
        let video = ictx
            .streams()
            .best(media::Type::Video)
            .map(|s| s.index())
            .ok_or_else(|| SplitError::encode(output, "source has no video stream"))?;
        let audio = ictx.streams().best(media::Type::Audio).map(|s| s.index());
        Ok(Self { video, audio })
    }

    fn indices(&self) -> Vec<usize> {
        std::iter::once(self.video).chain(self.audio).collect()
    }
}

fn to_seconds(ts: i64, time_base: Rational) -> f64 {
    ts as f64 * f64::from(time_base)
}

fn to_timestamp(seconds: f64, time_base: Rational) -> i64 {
    (seconds / f64::from(time_base)).round() as i64
}

/// Start of a stream in seconds; an unset start time (`AV_NOPTS_VALUE`)
/// counts as zero
fn stream_origin(start_time: i64, time_base: Rational) -> f64 {
    if start_time == i64::MIN {
        0.0
    } else {
        to_seconds(start_time, time_base)
    }
}

/// Bounds of the segment on the source timeline, anchored at the video
/// stream's start time
fn timeline_bounds(ictx: &Input, video: usize, bounds: &SegmentBounds) -> SplitResult<SegmentBounds> {
    let ist = ictx.stream(video).ok_or(ffmpeg::Error::StreamNotFound)?;
    let origin = stream_origin(ist.start_time(), ist.time_base());
    if origin != 0.0 {
        trace!(origin, "Source timeline does not start at zero");
    }
    Ok(bounds.shifted(origin))
}

/// Seek to the last keyframe at or before `seconds`
fn seek_to(ictx: &mut Input, seconds: f64) -> SplitResult<()> {
    let ts = (seconds * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
    ictx.seek(ts, ..ts)?;
    Ok(())
}

/// A packet at or past `end_ts`; once the decode timestamp passes the end,
/// no later packet of the stream can be presented inside the segment.
fn past_end(packet: &Packet, end_ts: i64) -> bool {
    packet
        .dts()
        .or(packet.pts())
        .map_or(false, |ts| ts >= end_ts)
}

fn write_packet(packet: &Packet, octx: &mut Output, report: &mut WriteReport) -> SplitResult<()> {
    report.packets_written += 1;
    report.bytes_written += packet.size() as u64;
    packet.write_interleaved(octx)?;
    Ok(())
}

/// Drain every pending packet out of an encoder into the muxer
fn drain_encoder(
    encoder: &mut encoder::Encoder,
    out_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    octx: &mut Output,
    report: &mut WriteReport,
) -> SplitResult<()> {
    let mut encoded = Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(out_index);
        encoded.rescale_ts(encoder_time_base, stream_time_base);
        encoded.set_position(-1);
        write_packet(&encoded, octx, report)?;
    }
    Ok(())
}

/// Add a stream copying the codec parameters of `ist`
fn add_copy_stream(ist: &format::stream::Stream, octx: &mut Output) -> SplitResult<usize> {
    let mut ost = octx.add_stream(encoder::find(Id::None))?;
    ost.set_parameters(ist.parameters());
    // the source container's codec tag may be invalid in MP4
    unsafe {
        (*(*ost.as_mut_ptr()).codecpar).codec_tag = 0;
    }
    Ok(ost.index())
}

fn wants_global_header(octx: &Output) -> bool {
    octx.format()
        .flags()
        .contains(format::flag::Flags::GLOBAL_HEADER)
}

/// Remux `[bounds.start, bounds.end)` without decoding
pub fn copy_segment(
    ictx: &mut Input,
    bounds: &SegmentBounds,
    output: &Path,
) -> SplitResult<WriteReport> {
    let selection = StreamSelection::of(ictx, output)?;
    let window = timeline_bounds(ictx, selection.video, bounds)?;
    let bounds = &window;
    let stream_count = ictx.nb_streams() as usize;

    let mut octx = format::output(output)?;
    let mut mapping: Vec<Option<usize>> = vec![None; stream_count];
    let mut in_time_bases = vec![Rational(1, 1); stream_count];
    for index in selection.indices() {
        let ist = ictx.stream(index).ok_or(ffmpeg::Error::StreamNotFound)?;
        mapping[index] = Some(add_copy_stream(&ist, &mut octx)?);
        in_time_bases[index] = ist.time_base();
    }

    octx.write_header()?;
    let out_time_bases: Vec<Rational> = octx.streams().map(|s| s.time_base()).collect();

    seek_to(ictx, bounds.start)?;

    let mut origin: Option<f64> = None;
    let mut finished = vec![false; stream_count];
    let mut report = WriteReport::default();

    for (stream, mut packet) in ictx.packets() {
        let index = stream.index();
        let Some(out_index) = mapping[index] else {
            continue;
        };
        if finished[index] {
            continue;
        }

        let time_base = in_time_bases[index];
        let Some(pts) = packet.pts().or(packet.dts()) else {
            continue;
        };
        let pts_seconds = to_seconds(pts, time_base);

        if past_end(&packet, to_timestamp(bounds.end, time_base)) {
            finished[index] = true;
            if selection.indices().iter().all(|&i| finished[i]) {
                break;
            }
            continue;
        }
        if pts_seconds >= bounds.end {
            continue;
        }

        // the segment opens on the first video keyframe after the seek
        let origin_seconds = match origin {
            Some(seconds) => seconds,
            None if index == selection.video && packet.is_key() => {
                trace!(keyframe = pts_seconds, start = bounds.start, "Copy segment origin");
                origin = Some(pts_seconds);
                pts_seconds
            }
            None => continue,
        };
        if pts_seconds < origin_seconds {
            continue;
        }

        let shift = to_timestamp(origin_seconds, time_base);
        packet.set_pts(packet.pts().map(|ts| ts - shift));
        packet.set_dts(packet.dts().map(|ts| ts - shift));
        packet.rescale_ts(time_base, out_time_bases[out_index]);
        packet.set_position(-1);
        packet.set_stream(out_index);
        write_packet(&packet, &mut octx, &mut report)?;
    }

    octx.write_trailer()?;
    Ok(report)
}

struct VideoTranscoder {
    in_index: usize,
    out_index: usize,
    in_time_base: Rational,
    out_time_base: Rational,
    start_ts: i64,
    end_ts: i64,
    width: u32,
    height: u32,
    decoder: ffmpeg::decoder::Video,
    encoder: ffmpeg::encoder::Video,
    scaler: Option<scaling::Context>,
}

impl VideoTranscoder {
    fn new(
        ist: &format::stream::Stream,
        octx: &mut Output,
        bounds: &SegmentBounds,
        frame_rate: Rational,
        settings: &EncodingSettings,
        output: &Path,
    ) -> SplitResult<Self> {
        let global_header = wants_global_header(octx);
        let in_time_base = ist.time_base();
        let decoder = codec::context::Context::from_parameters(ist.parameters())?
            .decoder()
            .video()?;

        let codec = encoder::find_by_name(&settings.video_encoder)
            .or_else(|| encoder::find(Id::H264))
            .ok_or_else(|| {
                SplitError::encode(
                    output,
                    format!("video encoder '{}' is not available", settings.video_encoder),
                )
            })?;

        let mut ost = octx.add_stream(codec)?;
        let out_index = ost.index();

        let mut video = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        video.set_width(decoder.width());
        video.set_height(decoder.height());
        video.set_aspect_ratio(decoder.aspect_ratio());
        video.set_format(format::Pixel::YUV420P);
        video.set_frame_rate(Some(frame_rate));
        video.set_time_base(in_time_base);
        if global_header {
            video.set_flags(codec::flag::Flags::GLOBAL_HEADER);
        }

        let mut options = Dictionary::new();
        options.set("crf", &settings.crf.to_string());
        options.set("preset", &settings.preset);
        let encoder = video.open_with(options)?;
        ost.set_parameters(&encoder);
        ost.set_time_base(in_time_base);

        debug!(
            encoder = codec.name(),
            width = decoder.width(),
            height = decoder.height(),
            frame_rate = f64::from(frame_rate),
            "Video encoder opened"
        );

        Ok(Self {
            in_index: ist.index(),
            out_index,
            in_time_base,
            out_time_base: in_time_base,
            start_ts: to_timestamp(bounds.start, in_time_base),
            end_ts: to_timestamp(bounds.end, in_time_base),
            width: decoder.width(),
            height: decoder.height(),
            decoder,
            encoder,
            scaler: None,
        })
    }

    fn send_packet(&mut self, packet: &Packet, octx: &mut Output, report: &mut WriteReport) -> SplitResult<()> {
        self.decoder.send_packet(packet)?;
        self.receive_frames(octx, report)
    }

    fn receive_frames(&mut self, octx: &mut Output, report: &mut WriteReport) -> SplitResult<()> {
        let mut decoded = frame::Video::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let Some(ts) = decoded.timestamp() else {
                continue;
            };
            if ts < self.start_ts || ts >= self.end_ts {
                continue;
            }

            decoded.set_pts(Some(ts - self.start_ts));
            decoded.set_kind(picture::Type::None);

            if decoded.format() == format::Pixel::YUV420P
                && decoded.width() == self.width
                && decoded.height() == self.height
            {
                self.encoder.send_frame(&decoded)?;
            } else {
                if self.scaler.is_none() {
                    self.scaler = Some(scaling::Context::get(
                        decoded.format(),
                        decoded.width(),
                        decoded.height(),
                        format::Pixel::YUV420P,
                        self.width,
                        self.height,
                        scaling::Flags::BILINEAR,
                    )?);
                }
                if let Some(scaler) = self.scaler.as_mut() {
                    let mut converted = frame::Video::empty();
                    scaler.run(&decoded, &mut converted)?;
                    converted.set_pts(decoded.pts());
                    self.encoder.send_frame(&converted)?;
                }
            }

            drain_encoder(
                &mut self.encoder,
                self.out_index,
                self.in_time_base,
                self.out_time_base,
                octx,
                report,
            )?;
        }
        Ok(())
    }

    fn finish(&mut self, octx: &mut Output, report: &mut WriteReport) -> SplitResult<()> {
        self.decoder.send_eof()?;
        self.receive_frames(octx, report)?;
        self.encoder.send_eof()?;
        drain_encoder(
            &mut self.encoder,
            self.out_index,
            self.in_time_base,
            self.out_time_base,
            octx,
            report,
        )
    }
}

/// Audio packets muxed as they are
struct AudioCopier {
    out_index: usize,
    in_time_base: Rational,
    out_time_base: Rational,
    start_ts: i64,
    end_ts: i64,
}

impl AudioCopier {
    fn handle(&self, mut packet: Packet, octx: &mut Output, report: &mut WriteReport) -> SplitResult<()> {
        let Some(pts) = packet.pts() else {
            return Ok(());
        };
        if pts < self.start_ts || pts >= self.end_ts {
            return Ok(());
        }
        packet.set_pts(Some(pts - self.start_ts));
        packet.set_dts(packet.dts().map(|ts| ts - self.start_ts));
        packet.rescale_ts(self.in_time_base, self.out_time_base);
        packet.set_position(-1);
        packet.set_stream(self.out_index);
        write_packet(&packet, octx, report)
    }
}

/// Audio decoded and encoded to AAC. A filter graph converts the samples
/// and rechunks them to the encoder frame size.
struct AudioTranscoder {
    out_index: usize,
    in_time_base: Rational,
    out_time_base: Rational,
    start_ts: i64,
    end_ts: i64,
    rate: i32,
    mono: bool,
    next_pts: i64,
    decoder: ffmpeg::decoder::Audio,
    encoder: ffmpeg::encoder::Audio,
    graph: Option<filter::Graph>,
}

impl AudioTranscoder {
    fn new(
        ist: &format::stream::Stream,
        octx: &mut Output,
        bounds: &SegmentBounds,
        settings: &EncodingSettings,
        output: &Path,
    ) -> SplitResult<Self> {
        let global_header = wants_global_header(octx);
        let in_time_base = ist.time_base();
        let decoder = codec::context::Context::from_parameters(ist.parameters())?
            .decoder()
            .audio()?;

        let codec = encoder::find(Id::AAC)
            .ok_or_else(|| SplitError::encode(output, "AAC encoder is not available"))?;
        let mut ost = octx.add_stream(codec)?;
        let out_index = ost.index();

        let rate = decoder.rate() as i32;
        let mono = decoder.channels() == 1;
        let layout = if mono {
            ChannelLayout::MONO
        } else {
            ChannelLayout::STEREO
        };

        let mut audio = codec::context::Context::new_with_codec(codec)
            .encoder()
            .audio()?;
        audio.set_rate(rate);
        audio.set_channel_layout(layout);
        audio.set_format(Sample::F32(SampleType::Planar));
        audio.set_bit_rate(settings.audio_bitrate);
        audio.set_time_base(Rational(1, rate));
        if global_header {
            audio.set_flags(codec::flag::Flags::GLOBAL_HEADER);
        }
        let encoder = audio.open_as(codec)?;
        ost.set_parameters(&encoder);
        ost.set_time_base(Rational(1, rate));

        debug!(
            source_codec = ?ist.parameters().id(),
            rate,
            channels = decoder.channels(),
            "Audio transcoded to AAC"
        );

        Ok(Self {
            out_index,
            in_time_base,
            out_time_base: Rational(1, rate),
            start_ts: to_timestamp(bounds.start, in_time_base),
            end_ts: to_timestamp(bounds.end, in_time_base),
            rate,
            mono,
            next_pts: 0,
            decoder,
            encoder,
            graph: None,
        })
    }

    fn build_graph(&self, first: &frame::Audio) -> SplitResult<filter::Graph> {
        let mut graph = filter::Graph::new();
        let layout = if first.channel_layout().bits() != 0 {
            first.channel_layout()
        } else if first.channels() == 1 {
            ChannelLayout::MONO
        } else {
            ChannelLayout::STEREO
        };
        let args = format!(
            "time_base={}/{}:sample_rate={}:sample_fmt={}:channel_layout=0x{:x}",
            self.in_time_base.numerator(),
            self.in_time_base.denominator(),
            first.rate(),
            first.format().name(),
            layout.bits()
        );
        let abuffer = filter::find("abuffer").ok_or(ffmpeg::Error::FilterNotFound)?;
        let abuffersink = filter::find("abuffersink").ok_or(ffmpeg::Error::FilterNotFound)?;
        graph.add(&abuffer, "in", &args)?;
        graph.add(&abuffersink, "out", "")?;

        let target = format!(
            "aformat=sample_fmts=fltp:sample_rates={}:channel_layouts={}",
            self.rate,
            if self.mono { "mono" } else { "stereo" }
        );
        graph.output("in", 0)?.input("out", 0)?.parse(&target)?;
        graph.validate()?;

        if let Some(mut sink) = graph.get("out") {
            sink.sink().set_frame_size(self.encoder.frame_size());
        }
        Ok(graph)
    }

    fn send_packet(&mut self, packet: &Packet, octx: &mut Output, report: &mut WriteReport) -> SplitResult<()> {
        self.decoder.send_packet(packet)?;
        self.receive_frames(octx, report)
    }

    fn receive_frames(&mut self, octx: &mut Output, report: &mut WriteReport) -> SplitResult<()> {
        let mut decoded = frame::Audio::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let Some(ts) = decoded.timestamp() else {
                continue;
            };
            if ts < self.start_ts || ts >= self.end_ts {
                continue;
            }
            if self.graph.is_none() {
                self.graph = Some(self.build_graph(&decoded)?);
            }
            if let Some(graph) = self.graph.as_mut() {
                let mut source = graph.get("in").ok_or(ffmpeg::Error::FilterNotFound)?;
                source.source().add(&decoded)?;
            }
            self.drain_graph(octx, report)?;
        }
        Ok(())
    }

    fn drain_graph(&mut self, octx: &mut Output, report: &mut WriteReport) -> SplitResult<()> {
        let Some(graph) = self.graph.as_mut() else {
            return Ok(());
        };
        let mut filtered = frame::Audio::empty();
        loop {
            let mut sink = graph.get("out").ok_or(ffmpeg::Error::FilterNotFound)?;
            if sink.sink().frame(&mut filtered).is_err() {
                break;
            }
            filtered.set_pts(Some(self.next_pts));
            self.next_pts += filtered.samples() as i64;
            self.encoder.send_frame(&filtered)?;
            drain_encoder(
                &mut self.encoder,
                self.out_index,
                Rational(1, self.rate),
                self.out_time_base,
                octx,
                report,
            )?;
        }
        Ok(())
    }

    fn finish(&mut self, octx: &mut Output, report: &mut WriteReport) -> SplitResult<()> {
        self.decoder.send_eof()?;
        self.receive_frames(octx, report)?;
        if let Some(graph) = self.graph.as_mut() {
            let mut source = graph.get("in").ok_or(ffmpeg::Error::FilterNotFound)?;
            source.source().flush()?;
        }
        self.drain_graph(octx, report)?;
        self.encoder.send_eof()?;
        drain_encoder(
            &mut self.encoder,
            self.out_index,
            Rational(1, self.rate),
            self.out_time_base,
            octx,
            report,
        )
    }
}

enum AudioPath {
    Copy(AudioCopier),
    Transcode(AudioTranscoder),
}

impl AudioPath {
    fn new(
        ist: &format::stream::Stream,
        octx: &mut Output,
        bounds: &SegmentBounds,
        settings: &EncodingSettings,
        output: &Path,
    ) -> SplitResult<Self> {
        let codec_id = ist.parameters().id();
        if MP4_AUDIO_CODECS.contains(&codec_id) {
            let in_time_base = ist.time_base();
            let out_index = add_copy_stream(ist, octx)?;
            debug!(codec = ?codec_id, "Audio stream copied");
            Ok(AudioPath::Copy(AudioCopier {
                out_index,
                in_time_base,
                out_time_base: in_time_base,
                start_ts: to_timestamp(bounds.start, in_time_base),
                end_ts: to_timestamp(bounds.end, in_time_base),
            }))
        } else {
            Ok(AudioPath::Transcode(AudioTranscoder::new(
                ist, octx, bounds, settings, output,
            )?))
        }
    }

    fn out_index(&self) -> usize {
        match self {
            AudioPath::Copy(copier) => copier.out_index,
            AudioPath::Transcode(transcoder) => transcoder.out_index,
        }
    }

    fn set_out_time_base(&mut self, time_base: Rational) {
        match self {
            AudioPath::Copy(copier) => copier.out_time_base = time_base,
            AudioPath::Transcode(transcoder) => transcoder.out_time_base = time_base,
        }
    }

    fn end_ts(&self) -> i64 {
        match self {
            AudioPath::Copy(copier) => copier.end_ts,
            AudioPath::Transcode(transcoder) => transcoder.end_ts,
        }
    }

    fn handle(&mut self, packet: Packet, octx: &mut Output, report: &mut WriteReport) -> SplitResult<()> {
        match self {
            AudioPath::Copy(copier) => copier.handle(packet, octx, report),
            AudioPath::Transcode(transcoder) => transcoder.send_packet(&packet, octx, report),
        }
    }

    fn finish(&mut self, octx: &mut Output, report: &mut WriteReport) -> SplitResult<()> {
        match self {
            AudioPath::Copy(_) => Ok(()),
            AudioPath::Transcode(transcoder) => transcoder.finish(octx, report),
        }
    }
}

/// Decode and re-encode `[bounds.start, bounds.end)` with exact cut points.
/// The video is encoded at `frame_rate`, the rate probed from the source.
pub fn reencode_segment(
    ictx: &mut Input,
    bounds: &SegmentBounds,
    frame_rate: Rational,
    output: &Path,
    settings: &EncodingSettings,
) -> SplitResult<WriteReport> {
    let selection = StreamSelection::of(ictx, output)?;
    let window = timeline_bounds(ictx, selection.video, bounds)?;
    let bounds = &window;

    let mut octx = format::output(output)?;
    let mut video = {
        let ist = ictx
            .stream(selection.video)
            .ok_or(ffmpeg::Error::StreamNotFound)?;
        VideoTranscoder::new(&ist, &mut octx, bounds, frame_rate, settings, output)?
    };
    let mut audio = match selection.audio {
        Some(index) => {
            let ist = ictx.stream(index).ok_or(ffmpeg::Error::StreamNotFound)?;
            Some((index, AudioPath::new(&ist, &mut octx, bounds, settings, output)?))
        }
        None => None,
    };

    octx.write_header()?;

    // the muxer may pick its own stream time bases while writing the header
    let out_time_bases: Vec<Rational> = octx.streams().map(|s| s.time_base()).collect();
    video.out_time_base = out_time_bases[video.out_index];
    if let Some((_, path)) = audio.as_mut() {
        let time_base = out_time_bases[path.out_index()];
        path.set_out_time_base(time_base);
    }

    seek_to(ictx, bounds.start)?;

    let mut report = WriteReport::default();
    let mut video_done = false;
    let mut audio_done = audio.is_none();

    for (stream, packet) in ictx.packets() {
        let index = stream.index();
        if index == video.in_index {
            if !video_done {
                if past_end(&packet, video.end_ts) {
                    video_done = true;
                } else {
                    video.send_packet(&packet, &mut octx, &mut report)?;
                }
            }
        } else if let Some((audio_index, path)) = audio.as_mut() {
            if index == *audio_index && !audio_done {
                if past_end(&packet, path.end_ts()) {
                    audio_done = true;
                } else {
                    path.handle(packet, &mut octx, &mut report)?;
                }
            }
        }

        if video_done && audio_done {
            break;
        }
    }

    video.finish(&mut octx, &mut report)?;
    if let Some((_, path)) = audio.as_mut() {
        path.finish(&mut octx, &mut report)?;
    }

    octx.write_trailer()?;
    Ok(report)
}

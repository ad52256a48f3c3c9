//! Tests against real media files generated with the ffmpeg binary.
//! Each test returns early when ffmpeg is not installed.

use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::Command as BinCommand;
use ffmpeg_next as ffmpeg;
use tempfile::TempDir;
use vidsplit::adapters::{ContainerMetadataAdapter, EncodingSettings, LibavMediaPort};
use vidsplit::domain::model::*;
use vidsplit::ports::*;

// Test utilities

fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn h264_encoder_available() -> bool {
    ffmpeg::init().is_ok()
        && (ffmpeg::encoder::find_by_name("libx264").is_some()
            || ffmpeg::encoder::find(ffmpeg::codec::Id::H264).is_some())
}

/// Create a 5 second 25 fps test video with audio and a keyframe every
/// 10 frames
fn create_test_video(dir: &Path, name: &str) -> Option<PathBuf> {
    create_video(dir, name, "5", &[])
}

/// Create a 25 fps mpeg4 + AAC clip of `duration` seconds, tagged with a
/// creation time; `extra` goes to the muxer
fn create_video(dir: &Path, name: &str, duration: &str, extra: &[&str]) -> Option<PathBuf> {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not installed, skipping");
        return None;
    }

    let path = dir.join(name);
    let output = Command::new("ffmpeg")
        .args(["-v", "error", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=duration={}:size=160x120:rate=25", duration))
        .args(["-f", "lavfi", "-i"])
        .arg(format!("sine=frequency=1000:duration={}", duration))
        .args([
            "-c:v",
            "mpeg4",
            "-g",
            "10",
            "-c:a",
            "aac",
            "-shortest",
            "-metadata",
            "creation_time=2020-01-02T10:00:00.000000Z",
        ])
        .args(extra)
        .arg("-y")
        .arg(&path)
        .output()
        .ok()?;

    if !output.status.success() {
        eprintln!(
            "ffmpeg failed, skipping: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        return None;
    }
    Some(path)
}

/// Create a 6 second MPEG-TS clip whose timestamps start 10 seconds in
fn create_offset_transport_stream(dir: &Path, name: &str) -> Option<PathBuf> {
    create_video(dir, name, "6", &["-f", "mpegts", "-output_ts_offset", "10"])
}

fn first_video_start(path: &Path) -> f64 {
    ffmpeg::init().unwrap();
    let ictx = ffmpeg::format::input(path).unwrap();
    let video = ictx.streams().best(ffmpeg::media::Type::Video).unwrap();
    video.start_time() as f64 * f64::from(video.time_base())
}

fn probe_duration(path: &Path) -> f64 {
    ffmpeg::init().unwrap();
    let ictx = ffmpeg::format::input(path).unwrap();
    ictx.duration() as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE)
}

#[test]
fn test_probe_generated_video() {
    let dir = TempDir::new().unwrap();
    let Some(path) = create_test_video(dir.path(), "probe.mp4") else {
        return;
    };

    let port = LibavMediaPort::new(SplitMode::Copy, EncodingSettings::default()).unwrap();
    let source = port.open(&path).unwrap();
    let info = source.info().clone();
    source.close();

    assert!((info.duration - 5.0).abs() < 0.1, "duration {}", info.duration);
    assert!((info.frame_rate - 25.0).abs() < 0.01);
    assert!(info.has_audio);
}

#[test]
fn test_container_creation_time() {
    let dir = TempDir::new().unwrap();
    let Some(path) = create_test_video(dir.path(), "tagged.mp4") else {
        return;
    };

    let adapter = ContainerMetadataAdapter::new().unwrap();
    let creation = adapter.creation_time(&path).unwrap().unwrap();
    assert_eq!(creation.to_string(), "2020-01-02 10:00:00");
}

#[test]
fn test_copy_mode_writes_playable_segments() {
    let dir = TempDir::new().unwrap();
    let Some(path) = create_test_video(dir.path(), "copy.mp4") else {
        return;
    };

    let port = LibavMediaPort::new(SplitMode::Copy, EncodingSettings::default()).unwrap();
    let mut source = port.open(&path).unwrap();
    let first = dir.path().join("first.mp4");
    let second = dir.path().join("second.mp4");
    let report = source
        .write_segment(&SegmentBounds { start: 0.0, end: 2.0 }, &first)
        .unwrap();
    source
        .write_segment(&SegmentBounds { start: 2.0, end: 5.0 }, &second)
        .unwrap();
    source.close();

    assert!(report.packets_written > 0);
    // cuts land on keyframes every 0.4 s
    assert!((probe_duration(&first) - 2.0).abs() < 0.5);
    assert!((probe_duration(&second) - 3.0).abs() < 0.5);
}

#[test]
fn test_reencode_mode_cuts_exactly() {
    if !h264_encoder_available() {
        eprintln!("no H.264 encoder, skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let Some(path) = create_test_video(dir.path(), "reencode.mp4") else {
        return;
    };

    let port = LibavMediaPort::new(SplitMode::Reencode, EncodingSettings::default()).unwrap();
    let mut source = port.open(&path).unwrap();
    let output = dir.path().join("middle.mp4");
    source
        .write_segment(&SegmentBounds { start: 1.0, end: 3.0 }, &output)
        .unwrap();
    source.close();

    let ictx = ffmpeg::format::input(&output).unwrap();
    let video = ictx.streams().best(ffmpeg::media::Type::Video).unwrap();
    assert_eq!(video.parameters().id(), ffmpeg::codec::Id::H264);
    assert!((f64::from(video.avg_frame_rate()) - 25.0).abs() < 0.01);
    assert!(ictx.streams().best(ffmpeg::media::Type::Audio).is_some());
    assert!((probe_duration(&output) - 2.0).abs() < 0.15);
}

#[test]
fn test_copy_mode_follows_offset_timeline() {
    let dir = TempDir::new().unwrap();
    let Some(path) = create_offset_transport_stream(dir.path(), "offset.m2ts") else {
        return;
    };
    assert!(first_video_start(&path) >= 10.0);

    let port = LibavMediaPort::new(SplitMode::Copy, EncodingSettings::default()).unwrap();
    let mut source = port.open(&path).unwrap();
    assert!((source.info().duration - 6.0).abs() < 0.3, "duration {}", source.info().duration);

    let mut written = Vec::new();
    for (index, start) in [0.0, 2.0, 4.0].into_iter().enumerate() {
        let output = dir.path().join(format!("part{}.mp4", index));
        let report = source
            .write_segment(&SegmentBounds { start, end: start + 2.0 }, &output)
            .unwrap();
        assert!(report.packets_written > 0, "segment {} is empty", index);
        written.push(output);
    }
    source.close();

    for output in &written {
        let duration = probe_duration(output);
        assert!((duration - 2.0).abs() < 0.5, "{} lasts {}", output.display(), duration);
    }
}

#[test]
fn test_reencode_mode_follows_offset_timeline() {
    if !h264_encoder_available() {
        eprintln!("no H.264 encoder, skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let Some(path) = create_offset_transport_stream(dir.path(), "offset.m2ts") else {
        return;
    };

    let port = LibavMediaPort::new(SplitMode::Reencode, EncodingSettings::default()).unwrap();
    let mut source = port.open(&path).unwrap();
    let output = dir.path().join("middle.mp4");
    let report = source
        .write_segment(&SegmentBounds { start: 2.0, end: 4.0 }, &output)
        .unwrap();
    source.close();

    assert!(report.packets_written > 0);
    assert!((probe_duration(&output) - 2.0).abs() < 0.15);
}

#[test]
fn test_cli_fractional_duration_has_no_sliver_segment() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    std::fs::create_dir(&input).unwrap();
    let Some(path) = create_video(&input, "camera.mp4", "4.5", &[]) else {
        return;
    };
    assert!(probe_duration(&path) > 4.4);

    let assert = BinCommand::cargo_bin("vidsplit")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("VIDSPLIT_CONFIG")
        .args([
            "--mode",
            "copy",
            "--metadata-source",
            "container",
            "in",
            "00:00:00",
            "00:00:02",
            "out",
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.lines().count(), 2, "unexpected output: {}", stdout);
    assert!(!dir.path().join("out").join("20200102100004_.mp4").exists());
}

#[test]
fn test_cli_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    std::fs::create_dir(&input).unwrap();
    if create_test_video(&input, "camera.mp4").is_none() {
        return;
    }
    let output = dir.path().join("out");

    let assert = BinCommand::cargo_bin("vidsplit")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("VIDSPLIT_CONFIG")
        .args([
            "--mode",
            "copy",
            "--metadata-source",
            "container",
            "in",
            "00:00:00",
            "00:00:02",
            "out",
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("2020-01-02 10:00:00\t"));
    assert!(lines[2].starts_with("2020-01-02 10:00:04\t"));

    for name in ["20200102100000_.mp4", "20200102100002_.mp4", "20200102100004_.mp4"] {
        assert!(output.join(name).is_file(), "{} missing", name);
    }
}

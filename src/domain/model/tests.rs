// Unit tests for domain models

use super::*;
use crate::domain::errors::*;

#[test]
fn test_time_spec_parse_hh_mm_ss() {
    let time = TimeSpec::parse("01:02:03").unwrap();
    assert_eq!(time.seconds, 3723);
}

#[test]
fn test_time_spec_parse_zero() {
    let time = TimeSpec::parse("00:00:00").unwrap();
    assert!(time.is_zero());
}

#[test]
fn test_time_spec_parse_trims_whitespace() {
    assert_eq!(TimeSpec::parse(" 00:01:00 ").unwrap().seconds, 60);
}

#[test]
fn test_time_spec_parse_invalid() {
    assert!(TimeSpec::parse("invalid").is_err());
    assert!(TimeSpec::parse("90").is_err());
    assert!(TimeSpec::parse("01:30").is_err());
    assert!(TimeSpec::parse("24:00:00").is_err());
    assert!(TimeSpec::parse("00:60:00").is_err());
    assert!(TimeSpec::parse("00:00:60").is_err());
    assert!(TimeSpec::parse("-00:00:10").is_err());
}

#[test]
fn test_time_spec_parse_error_kind() {
    match TimeSpec::parse("abc") {
        Err(DomainError::BadArgs(msg)) => assert!(msg.contains("HH:MM:SS")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_time_spec_display() {
    let time = TimeSpec::from_components(1, 2, 3);
    assert_eq!(time.to_string(), "01:02:03");
    assert_eq!(TimeSpec::from_seconds(59).to_string(), "00:00:59");
}

#[test]
fn test_split_mode_parsing() {
    assert_eq!(SplitMode::parse("reencode").unwrap(), SplitMode::Reencode);
    assert_eq!(SplitMode::parse("COPY").unwrap(), SplitMode::Copy);
    assert!(SplitMode::parse("hybrid").is_err());
    assert_eq!(SplitMode::Copy.to_string(), "copy");
}

#[test]
fn test_overwrite_policy_parsing() {
    assert_eq!(OverwritePolicy::parse("always").unwrap(), OverwritePolicy::Always);
    assert_eq!(OverwritePolicy::parse("Never").unwrap(), OverwritePolicy::Never);
    assert!(OverwritePolicy::parse("prompt").is_err());
}

#[test]
fn test_creation_time_source_parsing() {
    assert_eq!(
        CreationTimeSource::parse("hachoir").unwrap(),
        CreationTimeSource::Hachoir
    );
    assert_eq!(
        CreationTimeSource::parse("container").unwrap(),
        CreationTimeSource::Container
    );
    assert_eq!(CreationTimeSource::parse("none").unwrap(), CreationTimeSource::None);
    assert!(CreationTimeSource::parse("exif").is_err());
}

#[test]
fn test_media_info_validation() {
    assert!(MediaInfo::new("a.mp4", 130.0, 30.0, true).is_ok());
    assert!(MediaInfo::new("a.mp4", -1.0, 30.0, true).is_err());
    assert!(MediaInfo::new("a.mp4", f64::NAN, 30.0, true).is_err());
    assert!(MediaInfo::new("a.mp4", 130.0, 0.0, true).is_err());
}

#[test]
fn test_segment_bounds_shifted() {
    let bounds = SegmentBounds { start: 0.0, end: 2.0 };
    let shifted = bounds.shifted(10.0);
    assert_eq!(shifted, SegmentBounds { start: 10.0, end: 12.0 });
    assert_eq!(shifted.duration(), bounds.duration());
}

#[test]
fn test_split_request_rejects_zero_length() {
    let result = SplitRequest::new(
        "a.mp4",
        TimeSpec::from_seconds(0),
        TimeSpec::from_seconds(0),
        "out",
    );
    assert!(matches!(result, Err(DomainError::InvalidTimeRange(_))));
}

#[test]
fn test_batch_request_for_source() {
    let batch = BatchRequest::new(
        "in",
        TimeSpec::from_seconds(5),
        TimeSpec::from_seconds(60),
        "out",
    )
    .unwrap();
    let request = batch.for_source(Path::new("in/b.mkv"));
    assert_eq!(request.source, PathBuf::from("in/b.mkv"));
    assert_eq!(request.start, batch.start);
    assert_eq!(request.segment_length, batch.segment_length);
    assert_eq!(request.output_dir, batch.output_dir);
}

#[test]
fn test_batch_request_rejects_zero_length() {
    let result = BatchRequest::new("in", TimeSpec::from_seconds(0), TimeSpec::from_seconds(0), "out");
    assert!(matches!(result, Err(DomainError::InvalidTimeRange(_))));
}

#[test]
fn test_split_output_display() {
    let output = SplitOutput {
        timestamp: chrono::NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap(),
        path: PathBuf::from("out/20210304050607_.mp4"),
    };
    assert_eq!(
        output.to_string(),
        "2021-03-04 05:06:07\tout/20210304050607_.mp4"
    );
}

// Unit tests for domain rules

use super::*;
use chrono::NaiveDate;

fn creation() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 2)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn bounds(plan: &[SegmentBounds]) -> Vec<(f64, f64)> {
    plan.iter().map(|b| (b.start, b.end)).collect()
}

#[test]
fn test_plan_130_seconds_by_one_minute() {
    let plan = SegmentPlanner::plan(130.0, 0.0, 60.0, 0.0);
    assert_eq!(bounds(&plan), vec![(0.0, 60.0), (60.0, 120.0), (120.0, 130.0)]);
}

#[test]
fn test_plan_shorter_than_one_segment() {
    let plan = SegmentPlanner::plan(50.0, 0.0, 60.0, 0.0);
    assert_eq!(bounds(&plan), vec![(0.0, 50.0)]);
}

#[test]
fn test_plan_exact_multiple_skips_empty_tail() {
    let plan = SegmentPlanner::plan(120.0, 0.0, 60.0, 0.0);
    assert_eq!(bounds(&plan), vec![(0.0, 60.0), (60.0, 120.0)]);
}

#[test]
fn test_plan_start_at_or_after_duration_is_empty() {
    assert!(SegmentPlanner::plan(50.0, 50.0, 10.0, 0.0).is_empty());
    assert!(SegmentPlanner::plan(50.0, 75.0, 10.0, 0.0).is_empty());
}

#[test]
fn test_plan_with_start_offset() {
    let plan = SegmentPlanner::plan(100.0, 30.0, 30.0, 0.0);
    assert_eq!(bounds(&plan), vec![(30.0, 60.0), (60.0, 90.0), (90.0, 100.0)]);
}

#[test]
fn test_plan_fractional_duration_keeps_remainder() {
    let plan = SegmentPlanner::plan(130.5, 0.0, 60.0, 0.0);
    assert_eq!(plan.last().unwrap().end, 130.5);
    assert_eq!(plan.len(), 3);
}

#[test]
fn test_plan_min_tail_drops_short_remainder() {
    let plan = SegmentPlanner::plan(120.4, 0.0, 60.0, 0.5);
    assert_eq!(bounds(&plan), vec![(0.0, 60.0), (60.0, 120.0)]);

    let plan = SegmentPlanner::plan(120.6, 0.0, 60.0, 0.5);
    assert_eq!(plan.len(), 3);
}

#[test]
fn test_plan_rejects_non_positive_length() {
    assert!(SegmentPlanner::plan(100.0, 0.0, 0.0, 0.0).is_empty());
}

#[test]
fn test_plan_partitions_range() {
    for duration in [1.0, 59.0, 60.0, 61.0, 599.5, 3600.0] {
        for length in [1.0, 7.0, 60.0, 600.0] {
            for start in [0.0, 3.0, 59.0] {
                let plan = SegmentPlanner::plan(duration, start, length, 0.0);
                if start >= duration {
                    assert!(plan.is_empty());
                    continue;
                }
                assert_eq!(plan.first().unwrap().start, start);
                assert_eq!(plan.last().unwrap().end, duration);
                for pair in plan.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                    assert_eq!(pair[0].duration(), length);
                }
                let last = plan.last().unwrap();
                assert!(last.duration() > 0.0 && last.duration() <= length);
            }
        }
    }
}

#[test]
fn test_timestamps_follow_start_offsets() {
    let plan = SegmentPlanner::plan(130.0, 0.0, 60.0, 0.0);
    let segments = SegmentPlanner::timestamp(plan, creation());
    let stamps: Vec<String> = segments
        .iter()
        .map(|s| s.timestamp.format("%H:%M:%S").to_string())
        .collect();
    assert_eq!(stamps, vec!["10:00:00", "10:01:00", "10:02:00"]);
}

#[test]
fn test_output_file_name() {
    assert_eq!(OutputNaming::file_name(&creation()), "20200102100000_.mp4");
    let path = OutputNaming::output_path(Path::new("/out"), &creation());
    assert_eq!(path, PathBuf::from("/out/20200102100000_.mp4"));
}

#[test]
fn test_output_file_name_crosses_midnight() {
    let late = NaiveDate::from_ymd_opt(2020, 12, 31)
        .unwrap()
        .and_hms_opt(23, 59, 30)
        .unwrap();
    let segments = SegmentPlanner::timestamp(SegmentPlanner::plan(90.0, 0.0, 60.0, 0.0), late);
    assert_eq!(OutputNaming::file_name(&segments[1].timestamp), "20210101000030_.mp4");
}

#[test]
fn test_video_extensions_default() {
    let extensions = VideoExtensions::default();
    assert!(extensions.is_video(Path::new("clip.mp4")));
    assert!(extensions.is_video(Path::new("dir/clip.m2ts")));
    assert!(extensions.is_video(Path::new("CLIP.MOV")));
    assert!(!extensions.is_video(Path::new("notes.txt")));
    assert!(!extensions.is_video(Path::new("mp4")));
    assert!(!extensions.is_video(Path::new("archive.mp4.bak")));
    assert!(!extensions.is_video(Path::new("clipmp4")));
}

#[test]
fn test_video_extensions_match_dot_files() {
    let extensions = VideoExtensions::default();
    assert!(extensions.is_video(Path::new(".mp4")));
    assert!(extensions.is_video(Path::new("dir/.AVI")));
}

#[test]
fn test_video_extensions_custom() {
    let extensions = VideoExtensions::new([".webm", " TS "]);
    assert!(extensions.is_video(Path::new("a.webm")));
    assert!(extensions.is_video(Path::new("a.ts")));
    assert!(!extensions.is_video(Path::new("a.mp4")));
    assert!(VideoExtensions::new(Vec::<String>::new()).is_empty());
}

//! DetectionOptions and SegmenterOptions tests.

use rallycut::{CancellationToken, DetectionOptions, SegmenterOptions};

// ── SegmenterOptions ─────────────────────────────────────────────

#[test]
fn segmenter_defaults() {
    let options = SegmenterOptions::default();
    assert_eq!(options.motion_threshold, 25.0);
    assert_eq!(options.min_motion_frames, 15);
    assert_eq!(options.min_rally_length, 2.0);
    assert_eq!(options.fallback_frames_per_second, 30.0);
    assert_eq!(options, SegmenterOptions::new());
}

#[test]
fn segmenter_builder() {
    let options = SegmenterOptions::new()
        .motion_threshold(12.5)
        .min_motion_frames(8)
        .min_rally_length(4.0)
        .fallback_frames_per_second(25.0);
    assert_eq!(options.motion_threshold, 12.5);
    assert_eq!(options.min_motion_frames, 8);
    assert_eq!(options.min_rally_length, 4.0);
    assert_eq!(options.fallback_frames_per_second, 25.0);
}

// ── DetectionOptions builder ─────────────────────────────────────

#[test]
fn config_defaults() {
    let config = DetectionOptions::new();
    let debug = format!("{config:?}");
    assert!(debug.contains("DetectionOptions"));
    assert!(debug.contains("has_progress: false"));
    assert!(debug.contains("has_cancellation: false"));
    assert!(debug.contains("batch_size: 1"));
    assert!(debug.contains("analysis_width: None"));
    assert_eq!(config.segmenter(), &SegmenterOptions::default());
}

#[test]
fn config_with_batch_size_clamps_zero() {
    let config = DetectionOptions::new().with_batch_size(0);
    let debug = format!("{config:?}");
    // Clamped to 1.
    assert!(debug.contains("batch_size: 1"));
}

#[test]
fn config_with_cancellation() {
    let config = DetectionOptions::new().with_cancellation(CancellationToken::new());
    assert!(format!("{config:?}").contains("has_cancellation: true"));
}

#[test]
fn config_with_analysis_width() {
    let config = DetectionOptions::new().with_analysis_width(480);
    assert_eq!(config.analysis_width(), Some(480));

    let ignored = DetectionOptions::new().with_analysis_width(0);
    assert_eq!(ignored.analysis_width(), None);
}

#[test]
fn config_with_segmenter() {
    let config = DetectionOptions::new()
        .with_segmenter(SegmenterOptions::new().min_motion_frames(3));
    assert_eq!(config.segmenter().min_motion_frames, 3);
}

//! Progress callback and cancellation tests.
//!
//! Tests that decode need `tests/fixtures/sample_video.mp4`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rallycut::{
    CancellationToken, DetectionOptions, FfmpegCommandExporter, OperationType, ProgressCallback,
    ProgressInfo, RallyError, RallySegment, SegmentExporter, VideoSource,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[derive(Default)]
struct Recorder {
    updates: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for Recorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.updates.lock().expect("lock").push(info.clone());
    }
}

// ── CancellationToken ────────────────────────────────────────────

#[test]
fn token_starts_uncancelled() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
}

#[test]
fn token_clones_share_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    clone.cancel();
    assert!(token.is_cancelled());
}

// ── detection progress ───────────────────────────────────────────

#[test]
fn analysis_reports_progress() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let recorder = Arc::new(Recorder::default());
    let options = DetectionOptions::new()
        .with_progress(recorder.clone())
        .with_batch_size(30);
    let detection = VideoSource::open(path)
        .expect("open")
        .detect_rallies(&options)
        .expect("detect");

    let updates = recorder.updates.lock().expect("lock");
    assert!(updates.len() >= 2, "expected several updates");
    assert!(updates.iter().all(|info| info.operation == OperationType::MotionAnalysis));
    assert!(updates.windows(2).all(|pair| pair[0].current <= pair[1].current));

    let last = updates.last().expect("final update");
    assert_eq!(last.current, detection.transitions);
    if let Some(percentage) = last.percentage {
        assert!(percentage <= 100.0);
    }
}

#[test]
fn cancelled_detection_stops() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let token = CancellationToken::new();
    token.cancel();
    let options = DetectionOptions::new().with_cancellation(token);

    let mut samples = VideoSource::open(path)
        .expect("open")
        .motion_samples(&options)
        .expect("motion_samples");
    assert!(matches!(samples.next(), Some(Err(RallyError::Cancelled))));
    assert!(!samples.is_open());
    assert!(samples.next().is_none());

    let result = VideoSource::open(path).expect("open").detect_rallies(&options);
    assert!(matches!(result, Err(RallyError::Cancelled)));
}

// ── export progress ──────────────────────────────────────────────

#[cfg(unix)]
#[test]
fn export_reports_one_step_per_clip() {
    let directory = tempfile::tempdir().expect("tempdir");
    let recorder = Arc::new(Recorder::default());
    let exporter = FfmpegCommandExporter::new()
        .program("true")
        .output_directory(directory.path())
        .with_progress(recorder.clone());
    let segments = [
        RallySegment::new(0.0, 1.0).expect("segment"),
        RallySegment::new(2.0, 3.0).expect("segment"),
        RallySegment::new(4.0, 5.0).expect("segment"),
    ];

    let written = exporter
        .export(Path::new("match.mp4"), &segments, "rally")
        .expect("export");
    assert_eq!(written.len(), 3);

    let updates = recorder.updates.lock().expect("lock");
    let steps: Vec<u64> = updates.iter().map(|info| info.current).collect();
    assert_eq!(steps, [1, 2, 3]);
    assert!(updates.iter().all(|info| info.operation == OperationType::Export));
    assert_eq!(updates[2].percentage, Some(100.0));
}

//! Error type tests.

use std::path::Path;

use rallycut::{DetectionOptions, RallyError, RallySegment, VideoSource};

#[test]
fn open_nonexistent_file() {
    let result = VideoSource::open("/nonexistent/match.mp4");
    match result {
        Err(RallyError::SourceUnavailable { path, .. }) => {
            assert_eq!(path, Path::new("/nonexistent/match.mp4"));
        }
        other => panic!("expected SourceUnavailable, got {other:?}"),
    }
}

#[test]
fn open_file_that_is_not_a_video() {
    let directory = tempfile::tempdir().expect("tempdir");
    let path = directory.path().join("notes.mp4");
    std::fs::write(&path, b"this is not a video").expect("write");

    let result = rallycut::detect_rallies_in_file(&path, &DetectionOptions::default());
    assert!(matches!(result, Err(RallyError::SourceUnavailable { .. })));
}

#[test]
fn source_unavailable_message_names_the_path() {
    let error = RallyError::SourceUnavailable {
        path: "match.mp4".into(),
        reason: "No such file or directory".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Video source unavailable at match.mp4: No such file or directory"
    );
}

#[test]
fn export_failed_message_names_index_and_output() {
    let error = RallyError::ExportFailed {
        index: 3,
        output: "clips/rally_003.mp4".into(),
        reason: "ffmpeg exited with exit status: 1".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("segment 3"));
    assert!(message.contains("clips/rally_003.mp4"));
    assert!(message.contains("exit status: 1"));
}

#[test]
fn invalid_segment_is_rejected() {
    for (start, end) in [(5.0, 5.0), (5.0, 2.0), (-1.0, 2.0), (0.0, f64::NAN), (0.0, f64::INFINITY)] {
        assert!(
            matches!(RallySegment::new(start, end), Err(RallyError::InvalidSegment { .. })),
            "({start}, {end}) should be invalid"
        );
    }
}

#[test]
fn io_error_converts() {
    let error: RallyError = std::io::Error::other("disk full").into();
    assert!(matches!(error, RallyError::Io(_)));
    assert!(error.to_string().contains("disk full"));
}

//! Benchmarks for motion scoring and rally segmentation.
//!
//! Run with: cargo bench
//! Run with all features: cargo bench --all-features
//!
//! The decoding benchmarks require fixture files from
//! `tests/fixtures/generate_fixtures.sh`; the rest use synthetic data.

use std::{hint::black_box, path::Path, time::Duration};

use criterion::Criterion;
use image::{GrayImage, Luma};
use rallycut::{
    DetectionOptions, FfmpegLogLevel, RallySegment, SegmenterOptions, VideoSource,
    detect_rallies, motion_score, non_rally_segments,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

/// One hour of scores at 30 fps, alternating 4 s breaks and 8 s rallies.
fn synthetic_match_scores() -> Vec<f64> {
    (0..30 * 3600)
        .map(|frame| if (frame / 30) % 12 < 4 { 2.0 } else { 48.0 })
        .collect()
}

fn benchmark_motion_score(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("motion score");

    for (label, width, height) in [("480p", 854, 480), ("1080p", 1920, 1080)] {
        let previous = GrayImage::from_fn(width, height, |x, y| Luma([((x ^ y) & 0xff) as u8]));
        let current = GrayImage::from_fn(width, height, |x, y| Luma([((x + y) & 0xff) as u8]));

        group.bench_function(label, |bencher| {
            bencher.iter(|| motion_score(black_box(&previous), black_box(&current)).unwrap());
        });
    }

    group.finish();
}

fn benchmark_segmentation(criterion: &mut Criterion) {
    let scores = synthetic_match_scores();
    let options = SegmenterOptions::default();

    criterion.bench_function("segment one hour of scores", |bencher| {
        bencher.iter(|| detect_rallies(black_box(scores.iter().copied()), 30.0, &options));
    });

    let rallies: Vec<RallySegment> = detect_rallies(scores.iter().copied(), 30.0, &options);
    let duration = Duration::from_secs(3600);

    criterion.bench_function("non-rally segments for one hour", |bencher| {
        bencher.iter(|| non_rally_segments(black_box(&rallies), duration));
    });
}

fn benchmark_detection(criterion: &mut Criterion) {
    rallycut::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let mut group = criterion.benchmark_group("detection");
    group.sample_size(10);

    group.bench_function("full resolution", |bencher| {
        let options = DetectionOptions::default();
        bencher.iter(|| {
            VideoSource::open(SAMPLE_VIDEO)
                .unwrap()
                .detect_rallies(&options)
                .unwrap()
        });
    });

    group.bench_function("analysis width 160", |bencher| {
        let options = DetectionOptions::new().with_analysis_width(160);
        bencher.iter(|| {
            VideoSource::open(SAMPLE_VIDEO)
                .unwrap()
                .detect_rallies(&options)
                .unwrap()
        });
    });

    group.finish();
}

#[cfg(feature = "rayon")]
fn benchmark_parallel(criterion: &mut Criterion) {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let mut group = criterion.benchmark_group("parallel");
    group.sample_size(10);

    group.bench_function("four files", |bencher| {
        let options = DetectionOptions::default();
        bencher.iter(|| rallycut::detect_rallies_parallel([SAMPLE_VIDEO; 4], &options));
    });

    group.finish();
}

#[cfg(not(feature = "rayon"))]
fn benchmark_parallel(_criterion: &mut Criterion) {}

criterion::criterion_group!(
    benches,
    benchmark_motion_score,
    benchmark_segmentation,
    benchmark_detection,
    benchmark_parallel,
);
criterion::criterion_main!(benches);

//! Motion scoring tests.

use image::{GrayImage, Luma, Rgb, RgbImage};
use rallycut::{MotionSample, MotionScorer, RallyError, motion_score, rgb_to_luma};

fn flat(width: u32, height: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([value]))
}

// ── motion_score ─────────────────────────────────────────────────

#[test]
fn identical_frames_score_zero() {
    let frame = flat(32, 18, 120);
    assert_eq!(motion_score(&frame, &frame.clone()).expect("score"), 0.0);
}

#[test]
fn score_is_mean_absolute_difference() {
    let previous = GrayImage::from_raw(2, 2, vec![0, 10, 200, 255]).expect("2x2 frame");
    let current = GrayImage::from_raw(2, 2, vec![10, 0, 100, 255]).expect("2x2 frame");
    // (10 + 10 + 100 + 0) / 4
    assert_eq!(motion_score(&previous, &current).expect("score"), 30.0);
}

#[test]
fn score_is_symmetric() {
    let a = GrayImage::from_fn(16, 9, |x, y| Luma([(x * 13 + y * 7) as u8]));
    let b = GrayImage::from_fn(16, 9, |x, y| Luma([(x * 3 + y * 29) as u8]));
    assert_eq!(
        motion_score(&a, &b).expect("score"),
        motion_score(&b, &a).expect("score")
    );
}

#[test]
fn score_is_bounded() {
    let black = flat(8, 8, 0);
    let white = flat(8, 8, 255);
    assert_eq!(motion_score(&black, &white).expect("score"), 255.0);
}

#[test]
fn empty_frames_score_zero() {
    let empty = GrayImage::new(0, 0);
    assert_eq!(motion_score(&empty, &empty).expect("score"), 0.0);
}

#[test]
fn mismatched_dimensions_are_rejected() {
    let result = motion_score(&flat(4, 4, 0), &flat(4, 5, 0));
    assert!(matches!(result, Err(RallyError::InvalidFrame(_))));
}

// ── MotionScorer ─────────────────────────────────────────────────

#[test]
fn first_frame_yields_no_sample() {
    let mut scorer = MotionScorer::new();
    assert!(scorer.observe(flat(4, 4, 0)).expect("observe").is_none());
    assert_eq!(scorer.frames_seen(), 1);
}

#[test]
fn samples_are_indexed_by_later_frame() {
    let mut scorer = MotionScorer::new();
    let frames = [flat(4, 4, 0), flat(4, 4, 20), flat(4, 4, 20), flat(4, 4, 5)];

    let samples: Vec<MotionSample> = frames
        .into_iter()
        .filter_map(|frame| scorer.observe(frame).expect("observe"))
        .collect();

    assert_eq!(
        samples,
        [
            MotionSample { frame_index: 1, score: 20.0 },
            MotionSample { frame_index: 2, score: 0.0 },
            MotionSample { frame_index: 3, score: 15.0 },
        ]
    );
    assert_eq!(scorer.frames_seen(), 4);
}

#[test]
fn scorer_rejects_a_resized_frame() {
    let mut scorer = MotionScorer::default();
    scorer.observe(flat(8, 8, 0)).expect("observe");
    assert!(scorer.observe(flat(4, 4, 0)).is_err());
}

// ── rgb_to_luma ──────────────────────────────────────────────────

fn luma_of(pixel: [u8; 3]) -> u8 {
    rgb_to_luma(&RgbImage::from_pixel(1, 1, Rgb(pixel))).get_pixel(0, 0).0[0]
}

#[test]
fn luma_uses_bt601_weights() {
    assert_eq!(luma_of([0, 0, 0]), 0);
    assert_eq!(luma_of([255, 255, 255]), 255);
    assert_eq!(luma_of([128, 128, 128]), 128);
    assert_eq!(luma_of([255, 0, 0]), 76);
    assert_eq!(luma_of([0, 255, 0]), 150);
    assert_eq!(luma_of([0, 0, 255]), 29);
}

#[test]
fn luma_keeps_dimensions() {
    let frame = RgbImage::from_fn(7, 3, |x, y| Rgb([(x * 30) as u8, (y * 80) as u8, 10]));
    let luma = rgb_to_luma(&frame);
    assert_eq!(luma.dimensions(), (7, 3));
    assert_eq!(luma.get_pixel(6, 2).0[0], luma_of([180, 160, 10]));
}

//! Non-rally interval tests.

use std::time::Duration;

use rallycut::{RallySegment, non_rally_segments};

fn segments(bounds: &[(f64, f64)]) -> Vec<RallySegment> {
    bounds
        .iter()
        .map(|&(start, end)| RallySegment::new(start, end).expect("valid segment"))
        .collect()
}

fn bounds(segments: &[RallySegment]) -> Vec<(f64, f64)> {
    segments.iter().copied().map(Into::into).collect()
}

#[test]
fn gaps_before_between_and_after() {
    let rallies = segments(&[(2.0, 5.0), (8.0, 12.0)]);
    let gaps = non_rally_segments(&rallies, Duration::from_secs(15));
    assert_eq!(bounds(&gaps), [(0.0, 2.0), (5.0, 8.0), (12.0, 15.0)]);
}

#[test]
fn no_rallies_is_the_whole_video() {
    let gaps = non_rally_segments(&[], Duration::from_secs(90));
    assert_eq!(bounds(&gaps), [(0.0, 90.0)]);
}

#[test]
fn no_rallies_and_unknown_duration() {
    assert!(non_rally_segments(&[], Duration::ZERO).is_empty());
}

#[test]
fn rally_at_time_zero_has_no_leading_gap() {
    let rallies = segments(&[(0.0, 4.0)]);
    let gaps = non_rally_segments(&rallies, Duration::from_secs(10));
    assert_eq!(bounds(&gaps), [(4.0, 10.0)]);
}

#[test]
fn rally_reaching_the_end_has_no_trailing_gap() {
    let rallies = segments(&[(3.0, 10.0)]);
    let gaps = non_rally_segments(&rallies, Duration::from_secs(10));
    assert_eq!(bounds(&gaps), [(0.0, 3.0)]);
}

#[test]
fn unknown_duration_drops_trailing_gap() {
    let rallies = segments(&[(2.0, 5.0), (8.0, 12.0)]);
    let gaps = non_rally_segments(&rallies, Duration::ZERO);
    assert_eq!(bounds(&gaps), [(0.0, 2.0), (5.0, 8.0)]);
}

#[test]
fn adjacent_rallies_leave_no_empty_gap() {
    let rallies = segments(&[(1.0, 4.0), (4.0, 7.0)]);
    let gaps = non_rally_segments(&rallies, Duration::from_secs(8));
    assert_eq!(bounds(&gaps), [(0.0, 1.0), (7.0, 8.0)]);
}

#[test]
fn gaps_and_rallies_cover_the_video() {
    let rallies = segments(&[(1.5, 6.0), (9.25, 14.0), (20.0, 26.5)]);
    let duration = Duration::from_secs(30);
    let gaps = non_rally_segments(&rallies, duration);

    let covered: f64 = rallies
        .iter()
        .chain(&gaps)
        .map(RallySegment::duration)
        .sum();
    assert!((covered - duration.as_secs_f64()).abs() < 1e-9);
    for gap in &gaps {
        assert!(rallies.iter().all(|rally| gap.end() <= rally.start() || gap.start() >= rally.end()));
    }
}

//! Non-rally intervals.
//!
//! The breaks between rallies (serves being set up, players walking back,
//! shuttle changes) are the parts of a recording usually cut away. Given the
//! rallies and the video duration, [`non_rally_segments`] returns those
//! breaks so they can be exported separately.

use std::time::Duration;

use crate::segment::RallySegment;

/// The gaps before, between, and after `rallies`.
///
/// `rallies` must be ordered by start time, as produced by the segmenter.
/// Only gaps of positive length are returned. The trailing gap up to
/// `duration` is included when `duration` is non-zero and extends past the
/// last rally; pass [`Duration::ZERO`] when the duration is unknown.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use rallycut::{RallySegment, non_rally_segments};
///
/// let rallies = [RallySegment::new(2.0, 5.0)?, RallySegment::new(8.0, 12.0)?];
/// let gaps = non_rally_segments(&rallies, Duration::from_secs(15));
///
/// let bounds: Vec<(f64, f64)> = gaps.into_iter().map(Into::into).collect();
/// assert_eq!(bounds, [(0.0, 2.0), (5.0, 8.0), (12.0, 15.0)]);
/// # Ok::<(), rallycut::RallyError>(())
/// ```
pub fn non_rally_segments(rallies: &[RallySegment], duration: Duration) -> Vec<RallySegment> {
    let mut gaps = Vec::with_capacity(rallies.len() + 1);
    let mut last_end = 0.0_f64;

    for rally in rallies {
        if rally.start() > last_end {
            gaps.extend(RallySegment::new(last_end, rally.start()).ok());
        }
        last_end = last_end.max(rally.end());
    }

    let total = duration.as_secs_f64();
    if total > 0.0 && last_end < total {
        gaps.extend(RallySegment::new(last_end, total).ok());
    }

    gaps
}

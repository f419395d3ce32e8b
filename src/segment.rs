//! Time intervals produced by rally detection.

use std::{fmt, time::Duration};

use crate::error::RallyError;

/// A `[start, end)` interval of the source video, in seconds.
///
/// `end` is always strictly greater than `start` and both bounds are finite
/// and non-negative. Segments are produced by the
/// [`RallySegmenter`](crate::RallySegmenter), by
/// [`non_rally_segments`](crate::non_rally_segments), or from user input via
/// [`RallySegment::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct RallySegment {
    start: f64,
    end: f64,
}

impl RallySegment {
    /// Create a segment from start and end times in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`RallyError::InvalidSegment`] if `end <= start`, or if either
    /// bound is negative or not finite.
    ///
    /// # Example
    ///
    /// ```
    /// use rallycut::RallySegment;
    ///
    /// let segment = RallySegment::new(1.0, 4.0)?;
    /// assert_eq!(segment.duration(), 3.0);
    /// assert!(RallySegment::new(4.0, 4.0).is_err());
    /// # Ok::<(), rallycut::RallyError>(())
    /// ```
    pub fn new(start: f64, end: f64) -> Result<Self, RallyError> {
        let valid = start.is_finite() && end.is_finite() && start >= 0.0 && end > start;
        if !valid {
            return Err(RallyError::InvalidSegment { start, end });
        }
        Ok(Self { start, end })
    }

    /// Start of the segment, in seconds.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End of the segment, in seconds.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length of the segment, in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Start of the segment as a [`Duration`].
    pub fn start_timestamp(&self) -> Duration {
        Duration::from_secs_f64(self.start)
    }

    /// End of the segment as a [`Duration`].
    pub fn end_timestamp(&self) -> Duration {
        Duration::from_secs_f64(self.end)
    }

    /// Returns `true` if `seconds` falls inside `[start, end)`.
    pub fn contains(&self, seconds: f64) -> bool {
        seconds >= self.start && seconds < self.end
    }
}

impl fmt::Display for RallySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} - {:.2} seconds", self.start, self.end)
    }
}

impl TryFrom<(f64, f64)> for RallySegment {
    type Error = RallyError;

    fn try_from((start, end): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(start, end)
    }
}

impl From<RallySegment> for (f64, f64) {
    fn from(segment: RallySegment) -> Self {
        (segment.start, segment.end)
    }
}

//! Video metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoSource`](crate::VideoSource)
//! is opened. Its [`duration`](VideoMetadata::duration) is the single value
//! used for everything downstream, including the trailing gap computed by
//! [`non_rally_segments`](crate::non_rally_segments).

use std::time::Duration;

/// Metadata for the video stream of an opened file.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame rate as reported by the container, if it reported a usable one.
    pub reported_frames_per_second: Option<f64>,
    /// Frame rate used for all time calculations. Equal to the reported rate
    /// when present, otherwise the configured fallback.
    pub frames_per_second: f64,
    /// Estimated total number of frames, from duration and frame rate.
    pub frame_count: u64,
    /// Total duration of the video. [`Duration::ZERO`] when neither the
    /// container nor the stream reports one.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"hevc"`).
    pub codec: String,
}

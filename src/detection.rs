//! Rally detection on video files.
//!
//! Glues a [`VideoSource`] to a [`RallySegmenter`]. Use
//! [`VideoSource::detect_rallies`] to collect every rally at once, or
//! [`VideoSource::rallies`] to receive them as they close, which also keeps
//! the rallies confirmed before a mid-stream decode failure.
//!
//! # Example
//!
//! ```no_run
//! use rallycut::{DetectionOptions, RallyError, VideoSource};
//!
//! let detection = VideoSource::open("match.mp4")?.detect_rallies(&DetectionOptions::default())?;
//! for rally in &detection.rallies {
//!     println!("Rally: {rally}");
//! }
//! let breaks = detection.non_rally_segments();
//! # Ok::<(), RallyError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::{
    complement::non_rally_segments,
    configuration::DetectionOptions,
    error::RallyError,
    metadata::VideoMetadata,
    segment::RallySegment,
    segmenter::{Rallies, RallySegmenter},
    source::{MotionSamples, VideoSource},
};

/// The outcome of running detection on one video.
#[derive(Debug, Clone)]
#[must_use]
pub struct Detection {
    /// Path of the analysed video.
    pub path: PathBuf,
    /// Detected rallies, ordered and non-overlapping.
    pub rallies: Vec<RallySegment>,
    /// Metadata of the analysed video. `frames_per_second` is the rate the
    /// segmenter actually used.
    pub metadata: VideoMetadata,
    /// Number of frame transitions that were scored.
    pub transitions: u64,
}

impl Detection {
    /// The gaps before, between, and after the detected rallies.
    ///
    /// Uses the duration read when the video was opened.
    pub fn non_rally_segments(&self) -> Vec<RallySegment> {
        non_rally_segments(&self.rallies, self.metadata.duration)
    }

    /// Total rally time, in seconds.
    pub fn rally_seconds(&self) -> f64 {
        self.rallies.iter().map(RallySegment::duration).sum()
    }
}

impl VideoSource {
    /// Stream rallies from this video as they close.
    ///
    /// Consumes the source; the file is closed when the iterator finishes.
    ///
    /// # Errors
    ///
    /// Returns [`RallyError::SourceUnavailable`] if decoding cannot start.
    /// Errors during traversal are yielded by the iterator.
    pub fn rallies(self, options: &DetectionOptions) -> Result<Rallies<MotionSamples>, RallyError> {
        let frames_per_second = self.resolved_frames_per_second(options);
        self.rallies_at(frames_per_second, options)
    }

    /// Detect every rally in this video.
    ///
    /// An empty video, or one without sustained motion, gives an empty
    /// [`Detection::rallies`].
    ///
    /// # Errors
    ///
    /// Returns [`RallyError::SourceUnavailable`] if the video cannot be
    /// decoded, or [`RallyError::Cancelled`] if the options' token fires.
    pub fn detect_rallies(self, options: &DetectionOptions) -> Result<Detection, RallyError> {
        let path = self.file_path.clone();
        let mut metadata = self.metadata.clone();
        metadata.frames_per_second = self.resolved_frames_per_second(options);

        let mut rallies = self.rallies_at(metadata.frames_per_second, options)?;
        let segments = rallies.by_ref().collect::<Result<Vec<_>, _>>()?;
        let transitions = rallies.segmenter().frame_index();

        log::debug!(
            "Detected {} rallies in {} ({} transitions)",
            segments.len(),
            path.display(),
            transitions
        );

        Ok(Detection {
            path,
            rallies: segments,
            metadata,
            transitions,
        })
    }

    fn rallies_at(
        self,
        frames_per_second: f64,
        options: &DetectionOptions,
    ) -> Result<Rallies<MotionSamples>, RallyError> {
        let samples = self.motion_samples(options)?;
        let segmenter = RallySegmenter::new(frames_per_second, options.segmenter.clone());
        Ok(Rallies::new(samples, segmenter))
    }

    fn resolved_frames_per_second(&self, options: &DetectionOptions) -> f64 {
        let reported = self.metadata.reported_frames_per_second;
        let frames_per_second = options.segmenter.resolve_frames_per_second(reported);
        if reported.is_none() {
            log::warn!(
                "{} does not report a frame rate; assuming {frames_per_second} fps",
                self.file_path.display()
            );
        }
        frames_per_second
    }
}

/// Open `path` and detect its rallies.
///
/// # Errors
///
/// See [`VideoSource::open`] and [`VideoSource::detect_rallies`].
pub fn detect_rallies_in_file<P: AsRef<Path>>(
    path: P,
    options: &DetectionOptions,
) -> Result<Detection, RallyError> {
    VideoSource::open(path)?.detect_rallies(options)
}

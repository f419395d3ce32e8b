//! Detection configuration.
//!
//! [`DetectionOptions`] is a builder that carries the segmenter parameters
//! together with operational settings (progress callbacks, cancellation,
//! analysis resolution) so that detection entry points take a single
//! argument.
//!
//! # Example
//!
//! ```
//! use rallycut::{CancellationToken, DetectionOptions, SegmenterOptions};
//!
//! let token = CancellationToken::new();
//! let options = DetectionOptions::new()
//!     .with_segmenter(SegmenterOptions::new().motion_threshold(18.0))
//!     .with_analysis_width(480)
//!     .with_cancellation(token.clone());
//! assert_eq!(options.segmenter().motion_threshold, 18.0);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::segmenter::SegmenterOptions;

/// Settings for running rally detection on a video file.
///
/// A default-constructed value scores frames at the source resolution with
/// the default segmenter parameters, reports no progress, and is never
/// cancelled.
#[derive(Clone)]
pub struct DetectionOptions {
    pub(crate) segmenter: SegmenterOptions,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) has_progress: bool,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
    pub(crate) analysis_width: Option<u32>,
}

impl Debug for DetectionOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DetectionOptions")
            .field("segmenter", &self.segmenter)
            .field("has_progress", &self.has_progress)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("analysis_width", &self.analysis_width)
            .finish()
    }
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            segmenter: SegmenterOptions::default(),
            progress: Arc::new(NoOpProgress),
            has_progress: false,
            cancellation: None,
            batch_size: 1,
            analysis_width: None,
        }
    }

    /// Replace the segmenter parameters.
    #[must_use]
    pub fn with_segmenter(mut self, segmenter: SegmenterOptions) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Attach a progress callback, fired every
    /// [`batch_size`](Self::with_batch_size) scored frames.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self.has_progress = true;
        self
    }

    /// Attach a cancellation token, checked before each decoded frame.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Downscale frames to this width before scoring.
    ///
    /// The height follows the source aspect ratio. Scores at a reduced size
    /// differ slightly from full-resolution scores, so thresholds tuned on
    /// one may need adjusting for the other. A width of zero is ignored.
    #[must_use]
    pub fn with_analysis_width(mut self, width: u32) -> Self {
        self.analysis_width = (width > 0).then_some(width);
        self
    }

    /// The segmenter parameters.
    pub fn segmenter(&self) -> &SegmenterOptions {
        &self.segmenter
    }

    /// The analysis width, if one was set.
    pub fn analysis_width(&self) -> Option<u32> {
        self.analysis_width
    }

    /// Resolve the size frames are scored at, given the source size.
    pub(crate) fn resolve_dimensions(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        match self.analysis_width {
            Some(width) if source_width > 0 && width < source_width => {
                let ratio = f64::from(width) / f64::from(source_width);
                let height = (f64::from(source_height) * ratio).round() as u32;
                (width, height.max(1))
            }
            _ => (source_width, source_height),
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

//! Rally segmentation.
//!
//! [`RallySegmenter`] is a two-state hysteresis filter over motion scores.
//! It enters the *Active* state only after
//! [`min_motion_frames`](SegmenterOptions::min_motion_frames) consecutive
//! scores above the threshold, and it leaves *Active* on the first score at
//! or below the threshold. A rally's start is back-dated to the first of the
//! consecutive high-motion samples, so detection lag does not shift the
//! reported interval.
//!
//! The segmenter never touches a video file, so it can be driven by
//! synthetic score sequences as easily as by a
//! [`VideoSource`](crate::VideoSource).
//!
//! # Example
//!
//! ```
//! use rallycut::{SegmenterOptions, detect_rallies};
//!
//! // One second of calm, three seconds of play, then calm again, at 30 fps.
//! let scores = std::iter::repeat_n(0.0, 30)
//!     .chain(std::iter::repeat_n(40.0, 90))
//!     .chain(std::iter::repeat_n(0.0, 30));
//!
//! let rallies = detect_rallies(scores, 30.0, &SegmenterOptions::default());
//! assert_eq!(rallies.len(), 1);
//! assert_eq!(rallies[0].start(), 1.0);
//! ```

use crate::{error::RallyError, motion::MotionSample, segment::RallySegment};

/// Frame rate assumed when a source does not report a usable one.
pub const DEFAULT_FRAMES_PER_SECOND: f64 = 30.0;

/// Tunable parameters of the rally segmenter.
///
/// The defaults work for a fixed camera filming a full court at broadcast
/// frame rates.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmenterOptions {
    /// A score strictly above this counts as motion. Default: 25.0.
    pub motion_threshold: f64,
    /// Consecutive motion samples needed to start a rally. Default: 15.
    pub min_motion_frames: u64,
    /// Rallies shorter than this many seconds are dropped. Default: 2.0.
    pub min_rally_length: f64,
    /// Frame rate used when the supplied one is zero, negative, or not
    /// finite. Default: 30.0.
    pub fallback_frames_per_second: f64,
}

impl Default for SegmenterOptions {
    fn default() -> Self {
        Self {
            motion_threshold: 25.0,
            min_motion_frames: 15,
            min_rally_length: 2.0,
            fallback_frames_per_second: DEFAULT_FRAMES_PER_SECOND,
        }
    }
}

impl SegmenterOptions {
    /// Create options with the default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the motion threshold.
    #[must_use]
    pub fn motion_threshold(mut self, threshold: f64) -> Self {
        self.motion_threshold = threshold;
        self
    }

    /// Set how many consecutive motion samples confirm a rally start.
    #[must_use]
    pub fn min_motion_frames(mut self, frames: u64) -> Self {
        self.min_motion_frames = frames;
        self
    }

    /// Set the minimum rally length in seconds.
    #[must_use]
    pub fn min_rally_length(mut self, seconds: f64) -> Self {
        self.min_rally_length = seconds;
        self
    }

    /// Set the fallback frame rate.
    ///
    /// Unusable values are replaced by [`DEFAULT_FRAMES_PER_SECOND`].
    #[must_use]
    pub fn fallback_frames_per_second(mut self, frames_per_second: f64) -> Self {
        self.fallback_frames_per_second = if is_usable_rate(frames_per_second) {
            frames_per_second
        } else {
            DEFAULT_FRAMES_PER_SECOND
        };
        self
    }

    /// Pick the frame rate to segment with.
    ///
    /// Returns `reported` when it is a positive finite number, otherwise the
    /// fallback rate.
    pub fn resolve_frames_per_second(&self, reported: Option<f64>) -> f64 {
        match reported {
            Some(rate) if is_usable_rate(rate) => rate,
            _ if is_usable_rate(self.fallback_frames_per_second) => {
                self.fallback_frames_per_second
            }
            _ => DEFAULT_FRAMES_PER_SECOND,
        }
    }
}

fn is_usable_rate(frames_per_second: f64) -> bool {
    frames_per_second.is_finite() && frames_per_second > 0.0
}

/// Which side of the hysteresis the segmenter is on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmenterState {
    /// No rally in progress.
    Idle,
    /// A confirmed rally that began at `start_time` seconds.
    Active {
        /// Back-dated start of the rally, in seconds.
        start_time: f64,
    },
}

/// Streaming rally detector.
///
/// Feed scores with [`push`](Self::push) (or samples with
/// [`push_sample`](Self::push_sample)), collect the segments it returns, and
/// call [`finish`](Self::finish) once the input is exhausted to close a rally
/// that runs to the end of the video.
///
/// Segments come out ordered by start time and never overlap.
#[derive(Debug, Clone)]
pub struct RallySegmenter {
    options: SegmenterOptions,
    frames_per_second: f64,
    state: SegmenterState,
    motion_counter: u64,
    frame_index: u64,
}

impl RallySegmenter {
    /// Create a segmenter for a stream sampled at `frames_per_second`.
    ///
    /// An unusable rate is replaced by the options' fallback rate.
    pub fn new(frames_per_second: f64, options: SegmenterOptions) -> Self {
        let frames_per_second = options.resolve_frames_per_second(Some(frames_per_second));
        Self {
            options,
            frames_per_second,
            state: SegmenterState::Idle,
            motion_counter: 0,
            frame_index: 0,
        }
    }

    /// The frame rate used to convert frame indices to seconds.
    pub fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }

    /// The options this segmenter was built with.
    pub fn options(&self) -> &SegmenterOptions {
        &self.options
    }

    /// Current state.
    pub fn state(&self) -> SegmenterState {
        self.state
    }

    /// Index of the last processed transition (0 before any input).
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Process the score of the next frame transition.
    ///
    /// Transitions are numbered from 1, matching the index of the later
    /// frame in each compared pair.
    pub fn push(&mut self, score: f64) -> Option<RallySegment> {
        let frame_index = self.frame_index + 1;
        self.observe(frame_index, score)
    }

    /// Process a sample carrying its own frame index.
    ///
    /// Frame indices must strictly increase across calls, including calls
    /// to [`push`](Self::push). Debug builds panic otherwise.
    pub fn push_sample(&mut self, sample: MotionSample) -> Option<RallySegment> {
        debug_assert!(
            sample.frame_index > self.frame_index,
            "frame index {} does not follow {}",
            sample.frame_index,
            self.frame_index
        );
        self.observe(sample.frame_index, sample.score)
    }

    /// Close the rally in progress, if any, at end of input.
    ///
    /// The closing time is the end of the last frame, one frame after the
    /// last processed transition. The same minimum-length filter applies.
    /// The segmenter is left idle and may be reused.
    pub fn finish(&mut self) -> Option<RallySegment> {
        let closed = match self.state {
            SegmenterState::Active { start_time } => self.close(start_time, self.frame_index + 1),
            SegmenterState::Idle => None,
        };
        self.reset();
        closed
    }

    /// Drop any in-flight rally and return to idle without emitting it.
    pub fn reset(&mut self) {
        self.state = SegmenterState::Idle;
        self.motion_counter = 0;
    }

    fn observe(&mut self, frame_index: u64, score: f64) -> Option<RallySegment> {
        self.frame_index = frame_index;

        if score > self.options.motion_threshold {
            self.motion_counter += 1;
            if self.state == SegmenterState::Idle
                && self.motion_counter >= self.options.min_motion_frames
            {
                let onset = frame_index.saturating_sub(self.motion_counter);
                let start_time = onset as f64 / self.frames_per_second;
                log::debug!("Rally started at {start_time:.3}s (confirmed at frame {frame_index})");
                self.state = SegmenterState::Active { start_time };
            }
            return None;
        }

        let closed = match self.state {
            SegmenterState::Active { start_time } => self.close(start_time, frame_index),
            SegmenterState::Idle => None,
        };
        self.reset();
        closed
    }

    fn close(&self, start_time: f64, end_frame: u64) -> Option<RallySegment> {
        let end_time = end_frame as f64 / self.frames_per_second;
        if end_time - start_time < self.options.min_rally_length {
            log::debug!(
                "Discarding rally {start_time:.3}s - {end_time:.3}s (shorter than {}s)",
                self.options.min_rally_length
            );
            return None;
        }
        let segment = RallySegment::new(start_time, end_time).ok()?;
        log::debug!("Rally closed: {segment}");
        Some(segment)
    }
}

/// Pull-based rally detection over a fallible sample stream.
///
/// Yields each rally as soon as it closes. If the underlying stream fails,
/// the rallies already confirmed have been yielded, the error is yielded
/// next, any in-flight rally is discarded, and iteration ends.
///
/// # Example
///
/// ```
/// use rallycut::{MotionSample, Rallies, RallySegmenter, SegmenterOptions};
///
/// let samples = (1..=200).map(|frame_index| {
///     let score = if (50..150).contains(&frame_index) { 60.0 } else { 0.0 };
///     Ok(MotionSample { frame_index, score })
/// });
///
/// let segmenter = RallySegmenter::new(25.0, SegmenterOptions::default());
/// let rallies: Vec<_> = Rallies::new(samples, segmenter).collect::<Result<_, _>>()?;
/// assert_eq!(rallies.len(), 1);
/// # Ok::<(), rallycut::RallyError>(())
/// ```
pub struct Rallies<I> {
    samples: I,
    segmenter: RallySegmenter,
    done: bool,
}

impl<I> Rallies<I>
where
    I: Iterator<Item = Result<MotionSample, RallyError>>,
{
    /// Wrap a sample stream with a segmenter.
    pub fn new<T>(samples: T, segmenter: RallySegmenter) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            samples: samples.into_iter(),
            segmenter,
            done: false,
        }
    }

    /// The segmenter driving this iterator.
    pub fn segmenter(&self) -> &RallySegmenter {
        &self.segmenter
    }
}

impl<I> Iterator for Rallies<I>
where
    I: Iterator<Item = Result<MotionSample, RallyError>>,
{
    type Item = Result<RallySegment, RallyError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.samples.next() {
                Some(Ok(sample)) => {
                    if let Some(segment) = self.segmenter.push_sample(sample) {
                        return Some(Ok(segment));
                    }
                }
                Some(Err(error)) => {
                    self.done = true;
                    self.segmenter.reset();
                    return Some(Err(error));
                }
                None => {
                    self.done = true;
                    return self.segmenter.finish().map(Ok);
                }
            }
        }
    }
}

/// Detect rallies in a complete score sequence.
///
/// `scores` holds one score per frame transition, starting with the
/// transition from frame 0 to frame 1.
pub fn detect_rallies<S>(
    scores: S,
    frames_per_second: f64,
    options: &SegmenterOptions,
) -> Vec<RallySegment>
where
    S: IntoIterator<Item = f64>,
{
    let mut segmenter = RallySegmenter::new(frames_per_second, options.clone());
    let mut rallies: Vec<RallySegment> = scores
        .into_iter()
        .filter_map(|score| segmenter.push(score))
        .collect();
    rallies.extend(segmenter.finish());
    rallies
}

//! Progress reporting and cancellation support.
//!
//! Motion analysis decodes every frame of a match recording, which can take a
//! while for a full-length video. [`ProgressCallback`] lets callers observe
//! how far it has got, and [`CancellationToken`] lets them stop it early.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rallycut::{DetectionOptions, ProgressCallback, ProgressInfo, RallyError, VideoSource};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let options = DetectionOptions::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_batch_size(100);
//! let detection = VideoSource::open("match.mp4")?.detect_rallies(&options)?;
//! # Ok::<(), RallyError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Decoding frames and scoring motion.
    MotionAnalysis,
    /// Writing clips.
    Export,
}

/// A snapshot of progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// Frames scored or clips written so far.
    pub current: u64,
    /// Total items expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
}

/// Trait for receiving progress updates.
///
/// Callbacks observe but cannot halt the operation. Use
/// [`CancellationToken`] for that.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during an operation.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// # Example
///
/// ```
/// use rallycut::CancellationToken;
///
/// let token = CancellationToken::new();
/// let shared = token.clone();
/// shared.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Counts completed items and fires the callback every `batch_size` items.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
        }
    }

    pub(crate) fn advance(&mut self) {
        self.current += 1;
        if self.current % self.batch_size == 0 {
            self.report();
        }
    }

    pub(crate) fn finish(&self) {
        self.report();
    }

    fn report(&self) {
        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current.min(total) as f32 / total as f32) * 100.0);

        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
        });
    }
}

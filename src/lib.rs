//! # rallycut
//!
//! Split badminton match recordings into rally clips.
//!
//! `rallycut` decodes a video with FFmpeg (via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate), scores how
//! much each frame's luminance differs from the previous one, and runs those scores
//! through a hysteresis filter that marks spans of sustained motion as
//! rallies. The rallies, or the breaks between them, can then be exported as
//! clips without re-encoding.
//!
//! ## Quick Start
//!
//! ### Detect rallies
//!
//! ```no_run
//! use rallycut::{DetectionOptions, VideoSource};
//!
//! let detection = VideoSource::open("match.mp4")?.detect_rallies(&DetectionOptions::default())?;
//! for rally in &detection.rallies {
//!     println!("Rally: {:.2} - {:.2} seconds", rally.start(), rally.end());
//! }
//! # Ok::<(), rallycut::RallyError>(())
//! ```
//!
//! ### Export the breaks between rallies
//!
//! ```no_run
//! use rallycut::{DetectionOptions, FfmpegCommandExporter, NON_RALLY_PREFIX, SegmentExporter, VideoSource};
//!
//! let detection = VideoSource::open("match.mp4")?.detect_rallies(&DetectionOptions::default())?;
//! let breaks = detection.non_rally_segments();
//! FfmpegCommandExporter::new().export(&detection.path, &breaks, NON_RALLY_PREFIX)?;
//! # Ok::<(), rallycut::RallyError>(())
//! ```
//!
//! ### Segment synthetic scores
//!
//! The segmenter is independent of video decoding:
//!
//! ```
//! use rallycut::{SegmenterOptions, detect_rallies};
//!
//! let scores = vec![0.0; 10].into_iter().chain(vec![80.0; 100]);
//! let rallies = detect_rallies(scores, 30.0, &SegmenterOptions::default());
//! assert_eq!(rallies.len(), 1);
//! ```
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | `detect_rallies_parallel()` runs detection on several files at once |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed to build the crate. The
//! [`FfmpegCommandExporter`] additionally needs the `ffmpeg` program on
//! `PATH`.

mod complement;
pub mod configuration;
mod conversion;
pub mod detection;
pub mod error;
pub mod export;
pub mod ffmpeg;
pub mod metadata;
pub mod motion;
#[cfg(feature = "rayon")]
mod parallel;
pub mod progress;
pub mod segment;
pub mod segmenter;
pub mod source;
pub mod stream_copy;

pub use complement::non_rally_segments;
pub use configuration::DetectionOptions;
pub use detection::{Detection, detect_rallies_in_file};
pub use error::RallyError;
pub use export::{
    FfmpegCommandExporter, MANUAL_TRIM_PREFIX, NON_RALLY_PREFIX, RALLY_PREFIX, SegmentExporter,
    clip_file_name, export_manual_trim,
};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use metadata::VideoMetadata;
pub use motion::{MotionSample, MotionScorer, motion_score, rgb_to_luma};
#[cfg(feature = "rayon")]
pub use parallel::detect_rallies_parallel;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use segment::RallySegment;
pub use segmenter::{
    DEFAULT_FRAMES_PER_SECOND, Rallies, RallySegmenter, SegmenterOptions, SegmenterState,
    detect_rallies,
};
pub use source::{MotionSamples, VideoSource};
pub use stream_copy::StreamCopyExporter;

//! Error types for the `rallycut` crate.
//!
//! This module defines [`RallyError`], the unified error type returned by all
//! fallible operations in the crate. Variants carry the path, segment index,
//! or upstream message needed to diagnose a failure without extra logging at
//! the call site.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

/// The unified error type for all `rallycut` operations.
///
/// Zero frames or zero detected rallies are not errors; they resolve to an
/// empty result.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RallyError {
    /// The video could not be opened or read.
    ///
    /// Also used when decoding fails part-way through a traversal; rallies
    /// confirmed before the failure have already been yielded.
    #[error("Video source unavailable at {path}: {reason}")]
    SourceUnavailable {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the source could not be used.
        reason: String,
    },

    /// The transcoder failed for one segment.
    ///
    /// Clips exported before this one remain on disk.
    #[error("Failed to export segment {index} to {output}: {reason}")]
    ExportFailed {
        /// Zero-based index of the segment that failed.
        index: usize,
        /// Output file that was being written.
        output: PathBuf,
        /// Exit status or spawn error reported by the transcoder.
        reason: String,
    },

    /// A segment's end is not after its start, or a bound is not a finite,
    /// non-negative number of seconds.
    #[error("Invalid segment: start ({start}) must be less than end ({end})")]
    InvalidSegment {
        /// Requested start, in seconds.
        start: f64,
        /// Requested end, in seconds.
        end: f64,
    },

    /// Two frames could not be compared.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

impl From<FfmpegError> for RallyError {
    fn from(error: FfmpegError) -> Self {
        RallyError::Ffmpeg(error.to_string())
    }
}

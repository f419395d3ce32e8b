//! Clip export.
//!
//! [`SegmentExporter`] is the seam between rally detection and whatever
//! writes the clips. Every implementation writes one file per segment,
//! named `{prefix}_{index:03}.mp4`, without re-encoding.
//!
//! - [`FfmpegCommandExporter`] runs the `ffmpeg` program once per segment.
//! - [`StreamCopyExporter`](crate::StreamCopyExporter) copies packets
//!   in-process through the FFmpeg libraries.
//!
//! A failure on one segment stops the export with
//! [`RallyError::ExportFailed`]; clips written before it stay on disk, and
//! the partial output of the failed segment is removed.
//!
//! # Example
//!
//! ```no_run
//! use rallycut::{FfmpegCommandExporter, RallySegment, SegmentExporter};
//!
//! let exporter = FfmpegCommandExporter::new().output_directory("clips");
//! let written = exporter.export(
//!     "match.mp4".as_ref(),
//!     &[RallySegment::new(1.0, 4.0)?],
//!     "manual_trim",
//! )?;
//! assert_eq!(written[0].file_name().unwrap(), "manual_trim_000.mp4");
//! # Ok::<(), rallycut::RallyError>(())
//! ```

use std::{
    ffi::OsString,
    fmt::{Debug, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::Arc,
};

use crate::{
    error::RallyError,
    progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
    segment::RallySegment,
};

/// Prefix for detected rally clips.
pub const RALLY_PREFIX: &str = "rally";
/// Prefix for the breaks between rallies.
pub const NON_RALLY_PREFIX: &str = "trimmed";
/// Prefix for a single user-chosen interval.
pub const MANUAL_TRIM_PREFIX: &str = "manual_trim";

/// Writes one clip per segment.
pub trait SegmentExporter {
    /// Export `segments` of `video_path`, naming clips after `prefix`.
    ///
    /// Returns the written paths in segment order. An empty `segments`
    /// writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RallyError::ExportFailed`] for the first segment that could
    /// not be written.
    fn export(
        &self,
        video_path: &Path,
        segments: &[RallySegment],
        prefix: &str,
    ) -> Result<Vec<PathBuf>, RallyError>;
}

/// File name of the clip at `index`: `{prefix}_{index:03}.mp4`.
///
/// ```
/// assert_eq!(rallycut::clip_file_name("rally", 7), "rally_007.mp4");
/// ```
pub fn clip_file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}_{index:03}.mp4")
}

/// Export a single user-chosen interval under [`MANUAL_TRIM_PREFIX`].
///
/// # Errors
///
/// Returns [`RallyError::InvalidSegment`] if `end <= start`, or the
/// exporter's error.
pub fn export_manual_trim<E: SegmentExporter + ?Sized>(
    exporter: &E,
    video_path: &Path,
    start: f64,
    end: f64,
) -> Result<PathBuf, RallyError> {
    let segment = RallySegment::new(start, end)?;
    let mut written = exporter.export(video_path, &[segment], MANUAL_TRIM_PREFIX)?;
    written.pop().ok_or_else(|| RallyError::ExportFailed {
        index: 0,
        output: PathBuf::from(clip_file_name(MANUAL_TRIM_PREFIX, 0)),
        reason: "exporter wrote no file".to_string(),
    })
}

/// Exports clips by running an external `ffmpeg` process per segment.
///
/// Each clip is produced with
/// `ffmpeg -hide_banner -loglevel error -ss START -to END -i VIDEO -c copy OUT`
/// (plus `-y` or `-n` depending on [`overwrite`](Self::overwrite)).
#[derive(Clone)]
pub struct FfmpegCommandExporter {
    program: OsString,
    output_directory: PathBuf,
    overwrite: bool,
    progress: Arc<dyn ProgressCallback>,
}

impl Debug for FfmpegCommandExporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FfmpegCommandExporter")
            .field("program", &self.program)
            .field("output_directory", &self.output_directory)
            .field("overwrite", &self.overwrite)
            .finish_non_exhaustive()
    }
}

impl Default for FfmpegCommandExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegCommandExporter {
    /// Run `ffmpeg` from `PATH`, writing into the current directory and
    /// refusing to overwrite existing files.
    pub fn new() -> Self {
        Self {
            program: OsString::from("ffmpeg"),
            output_directory: PathBuf::from("."),
            overwrite: false,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Use a different transcoder executable.
    #[must_use]
    pub fn program<S: Into<OsString>>(mut self, program: S) -> Self {
        self.program = program.into();
        self
    }

    /// Write clips into `directory`, creating it if needed.
    #[must_use]
    pub fn output_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.output_directory = directory.into();
        self
    }

    /// Replace existing clips instead of failing on them.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Report one progress step per written clip.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Arguments passed to the transcoder for one clip.
    pub fn arguments(&self, video_path: &Path, segment: &RallySegment, output: &Path) -> Vec<OsString> {
        let mut arguments: Vec<OsString> = ["-hide_banner", "-loglevel", "error"]
            .into_iter()
            .map(OsString::from)
            .collect();
        arguments.push(OsString::from(if self.overwrite { "-y" } else { "-n" }));
        arguments.extend([
            OsString::from("-ss"),
            OsString::from(segment.start().to_string()),
            OsString::from("-to"),
            OsString::from(segment.end().to_string()),
            OsString::from("-i"),
            video_path.as_os_str().to_owned(),
            OsString::from("-c"),
            OsString::from("copy"),
            output.as_os_str().to_owned(),
        ]);
        arguments
    }

    fn run_one(&self, video_path: &Path, segment: &RallySegment, output: &Path) -> Result<(), String> {
        let result = Command::new(&self.program)
            .args(self.arguments(video_path, segment, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|error| {
                format!("cannot run {}: {error}", self.program.to_string_lossy())
            })?;

        if result.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&result.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            Err(format!("{} exited with {}", self.program.to_string_lossy(), result.status))
        } else {
            Err(format!(
                "{} exited with {}: {stderr}",
                self.program.to_string_lossy(),
                result.status
            ))
        }
    }
}

impl SegmentExporter for FfmpegCommandExporter {
    fn export(
        &self,
        video_path: &Path,
        segments: &[RallySegment],
        prefix: &str,
    ) -> Result<Vec<PathBuf>, RallyError> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }
        fs::create_dir_all(&self.output_directory)?;

        let mut tracker = ProgressTracker::new(
            self.progress.clone(),
            OperationType::Export,
            Some(segments.len() as u64),
            1,
        );
        let mut written = Vec::with_capacity(segments.len());

        for (index, segment) in segments.iter().enumerate() {
            let output = self.output_directory.join(clip_file_name(prefix, index));
            log::debug!("Exporting {segment} to {}", output.display());

            let existed = output.exists();
            if let Err(reason) = self.run_one(video_path, segment, &output) {
                if !existed && output.exists() {
                    if let Err(error) = fs::remove_file(&output) {
                        log::warn!("Cannot remove partial clip {}: {error}", output.display());
                    }
                }
                return Err(RallyError::ExportFailed {
                    index,
                    output,
                    reason,
                });
            }

            written.push(output);
            tracker.advance();
        }

        Ok(written)
    }
}

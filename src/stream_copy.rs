//! In-process clip export.
//!
//! [`StreamCopyExporter`] trims clips out of a video by copying compressed
//! packets through the FFmpeg libraries, the in-process equivalent of
//! `ffmpeg -ss START -to END -i input.mp4 -c copy clip.mp4`. No external
//! program is needed and nothing is re-encoded.
//!
//! Like the `ffmpeg` program with `-c copy`, each clip starts at the
//! keyframe at or before the requested start, so it may begin slightly
//! early.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use ffmpeg_next::{Rational, codec::Id, media::Type};

use crate::{
    conversion,
    error::RallyError,
    export::{SegmentExporter, clip_file_name},
    progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
    segment::RallySegment,
};

/// Exports clips by copying packets in-process.
///
/// Video and audio streams are copied; subtitle and data streams are
/// dropped because MP4 cannot carry most of them.
///
/// # Example
///
/// ```no_run
/// use rallycut::{RallySegment, SegmentExporter, StreamCopyExporter};
///
/// let exporter = StreamCopyExporter::new().output_directory("clips").exclude_audio();
/// exporter.export("match.mp4".as_ref(), &[RallySegment::new(12.0, 19.5)?], "rally")?;
/// # Ok::<(), rallycut::RallyError>(())
/// ```
#[derive(Clone)]
pub struct StreamCopyExporter {
    output_directory: PathBuf,
    overwrite: bool,
    copy_audio: bool,
    progress: Arc<dyn ProgressCallback>,
}

impl Debug for StreamCopyExporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StreamCopyExporter")
            .field("output_directory", &self.output_directory)
            .field("overwrite", &self.overwrite)
            .field("copy_audio", &self.copy_audio)
            .finish_non_exhaustive()
    }
}

impl Default for StreamCopyExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamCopyExporter {
    /// Write clips into the current directory, keeping audio and refusing to
    /// overwrite existing files.
    pub fn new() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            overwrite: false,
            copy_audio: true,
            progress: Arc::new(NoOpProgress),
        }
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

    /// Leave audio streams out of the clips.
    #[must_use]
    pub fn exclude_audio(mut self) -> Self {
        self.copy_audio = false;
        self
    }

    /// Report one progress step per written clip.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    fn copy_segment(
        &self,
        video_path: &Path,
        segment: &RallySegment,
        output: &Path,
    ) -> Result<(), RallyError> {
        if output.exists() && !self.overwrite {
            return Err(RallyError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", output.display()),
            )));
        }

        let result = self.write_clip(video_path, segment, output);
        if result.is_err() && output.exists() {
            // A failed clip is never left on disk.
            if let Err(error) = fs::remove_file(output) {
                log::warn!("Cannot remove partial clip {}: {error}", output.display());
            }
        }
        result
    }

    fn write_clip(
        &self,
        video_path: &Path,
        segment: &RallySegment,
        output: &Path,
    ) -> Result<(), RallyError> {
        let mut input_context =
            ffmpeg_next::format::input(video_path).map_err(|error| {
                RallyError::SourceUnavailable {
                    path: video_path.to_path_buf(),
                    reason: error.to_string(),
                }
            })?;
        let mut output_context = ffmpeg_next::format::output(output)?;

        // input stream index -> output stream index, None when dropped.
        let mut stream_map: Vec<Option<usize>> = Vec::new();
        let mut input_time_bases: Vec<Rational> = Vec::new();
        let mut output_stream_count = 0;

        for stream in input_context.streams() {
            let include = match stream.parameters().medium() {
                Type::Video => true,
                Type::Audio => self.copy_audio,
                _ => false,
            };
            input_time_bases.push(stream.time_base());

            if !include {
                stream_map.push(None);
                continue;
            }

            let mut out_stream = output_context.add_stream(ffmpeg_next::encoder::find(Id::None))?;
            out_stream.set_parameters(stream.parameters());
            // Let the muxer pick a codec tag valid for the output container.
            unsafe {
                (*out_stream.parameters().as_mut_ptr()).codec_tag = 0;
            }
            stream_map.push(Some(output_stream_count));
            output_stream_count += 1;
        }

        if output_stream_count == 0 {
            return Err(RallyError::SourceUnavailable {
                path: video_path.to_path_buf(),
                reason: "no video or audio stream to copy".to_string(),
            });
        }

        output_context.write_header()?;

        let output_time_bases: Vec<Rational> = (0..output_stream_count)
            .map(|index| {
                output_context
                    .stream(index)
                    .map(|stream| stream.time_base())
                    .ok_or_else(|| RallyError::Ffmpeg(format!("output stream {index} missing")))
            })
            .collect::<Result<_, _>>()?;

        let seek_target = conversion::seconds_to_seek_timestamp(segment.start());
        input_context.seek(seek_target, ..seek_target)?;

        // Clip-relative time zero, taken from the first copied packet.
        let mut origin_seconds: Option<f64> = None;
        let mut finished = vec![false; output_stream_count];

        for (stream, mut packet) in input_context.packets() {
            let input_index = stream.index();
            let Some(output_index) = stream_map.get(input_index).copied().flatten() else {
                continue;
            };
            if finished[output_index] {
                continue;
            }
            let Some(timestamp) = packet.dts().or(packet.pts()) else {
                continue;
            };

            let input_time_base = input_time_bases[input_index];
            let seconds = conversion::timestamp_to_seconds(timestamp, input_time_base);

            if seconds >= segment.end() {
                finished[output_index] = true;
                if finished.iter().all(|&done| done) {
                    break;
                }
                continue;
            }

            let origin = *origin_seconds.get_or_insert(seconds);
            if seconds < origin {
                continue;
            }

            let shift = (origin * f64::from(input_time_base.denominator())
                / f64::from(input_time_base.numerator()))
            .round() as i64;
            packet.set_pts(packet.pts().map(|pts| pts - shift));
            packet.set_dts(packet.dts().map(|dts| dts - shift));
            packet.set_stream(output_index);
            packet.rescale_ts(input_time_base, output_time_bases[output_index]);
            packet.set_position(-1);
            packet.write_interleaved(&mut output_context)?;
        }

        output_context.write_trailer()?;
        Ok(())
    }
}

impl SegmentExporter for StreamCopyExporter {
    fn export(
        &self,
        video_path: &Path,
        segments: &[RallySegment],
        prefix: &str,
    ) -> Result<Vec<PathBuf>, RallyError> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }
        ffmpeg_next::init()?;
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
            log::debug!("Copying {segment} to {}", output.display());

            self.copy_segment(video_path, segment, &output)
                .map_err(|error| RallyError::ExportFailed {
                    index,
                    output: output.clone(),
                    reason: error.to_string(),
                })?;

            written.push(output);
            tracker.advance();
        }

        Ok(written)
    }
}

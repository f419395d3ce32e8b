//! Frame motion source.
//!
//! [`VideoSource`] opens a video with FFmpeg and reads its metadata.
//! [`VideoSource::motion_samples`] turns it into [`MotionSamples`], a lazy,
//! forward-only iterator that decodes one frame at a time, converts it to
//! full-range RGB and then to luminance, and yields the motion score against the previous frame.
//!
//! The iterator owns the demuxer and decoder. They are released as soon as
//! iteration ends, fails, or the iterator is dropped.
//!
//! # Example
//!
//! ```no_run
//! use rallycut::{DetectionOptions, RallyError, VideoSource};
//!
//! let source = VideoSource::open("match.mp4")?;
//! println!("{:.2} fps", source.metadata().frames_per_second);
//!
//! for sample in source.motion_samples(&DetectionOptions::default())? {
//!     let sample = sample?;
//!     println!("frame {}: {:.2}", sample.frame_index, sample.score);
//! }
//! # Ok::<(), RallyError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{GrayImage, RgbImage};

use crate::{
    configuration::DetectionOptions,
    conversion,
    error::RallyError,
    metadata::VideoMetadata,
    motion::{self, MotionSample, MotionScorer},
    progress::{OperationType, ProgressTracker},
    segmenter::DEFAULT_FRAMES_PER_SECOND,
};

/// An opened video file.
///
/// Holds the demuxer context and the metadata read at open time. Each
/// `VideoSource` is an independent handle; open one per concurrent run.
pub struct VideoSource {
    pub(crate) input_context: Input,
    pub(crate) video_stream_index: usize,
    pub(crate) metadata: VideoMetadata,
    pub(crate) file_path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, selects the best
    /// video stream, and reads its metadata. A missing or unusable frame
    /// rate falls back to [`DEFAULT_FRAMES_PER_SECOND`] here; detection
    /// re-resolves it against
    /// [`SegmenterOptions::fallback_frames_per_second`](crate::SegmenterOptions).
    ///
    /// # Errors
    ///
    /// Returns [`RallyError::SourceUnavailable`] if the file cannot be
    /// opened or has no decodable video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RallyError> {
        let file_path = path.as_ref().to_path_buf();
        let unavailable = |reason: String| RallyError::SourceUnavailable {
            path: file_path.clone(),
            reason,
        };

        log::debug!("Opening video: {}", file_path.display());

        ffmpeg_next::init()
            .map_err(|error| unavailable(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context = ffmpeg_next::format::input(&file_path)
            .map_err(|error| unavailable(error.to_string()))?;

        let (video_stream_index, metadata) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or_else(|| unavailable("no video stream found".to_string()))?;

            let decoder = CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
                .map_err(|error| unavailable(format!("cannot create video decoder: {error}")))?;

            let reported_frames_per_second = conversion::rational_to_rate(stream.avg_frame_rate())
                .or_else(|| conversion::rational_to_rate(stream.rate()));
            let frames_per_second = reported_frames_per_second.unwrap_or(DEFAULT_FRAMES_PER_SECOND);

            let container_duration = input_context.duration();
            let stream_duration = stream.duration();
            let duration = if container_duration > 0 {
                Duration::from_micros(container_duration as u64)
            } else if stream_duration > 0 {
                Duration::try_from_secs_f64(conversion::timestamp_to_seconds(
                    stream_duration,
                    stream.time_base(),
                ))
                .unwrap_or(Duration::ZERO)
            } else {
                Duration::ZERO
            };

            let frame_count = match stream.frames() {
                frames if frames > 0 => frames as u64,
                _ => (duration.as_secs_f64() * frames_per_second) as u64,
            };

            let codec = decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            let metadata = VideoMetadata {
                width: decoder.width(),
                height: decoder.height(),
                reported_frames_per_second,
                frames_per_second,
                frame_count,
                duration,
                codec,
            };
            (stream.index(), metadata)
        };

        log::debug!(
            "Video stream {}: {}x{} @ {:.3} fps, {:?}, ~{} frames [{}]",
            video_stream_index,
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.duration,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            video_stream_index,
            metadata,
            file_path,
        })
    }

    /// Metadata read when the file was opened.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Start a sequential traversal that yields one motion sample per frame
    /// transition.
    ///
    /// Consumes the source: the file is closed when the returned iterator
    /// finishes, fails, or is dropped. A video with zero or one frames
    /// yields nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RallyError::SourceUnavailable`] if the decoder cannot be
    /// created.
    pub fn motion_samples(self, options: &DetectionOptions) -> Result<MotionSamples, RallyError> {
        let decoder = {
            let stream = self
                .input_context
                .stream(self.video_stream_index)
                .ok_or_else(|| RallyError::SourceUnavailable {
                    path: self.file_path.clone(),
                    reason: "video stream disappeared".to_string(),
                })?;
            CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
                .map_err(|error| RallyError::SourceUnavailable {
                    path: self.file_path.clone(),
                    reason: format!("cannot create video decoder: {error}"),
                })?
        };

        let target_dimensions =
            options.resolve_dimensions(self.metadata.width, self.metadata.height);
        let total = self.metadata.frame_count.checked_sub(1).filter(|&n| n > 0);
        let tracker = ProgressTracker::new(
            options.progress.clone(),
            OperationType::MotionAnalysis,
            total,
            options.batch_size,
        );

        Ok(MotionSamples {
            file_path: self.file_path,
            decode: Some(DecodeState {
                input_context: self.input_context,
                decoder,
                video_stream_index: self.video_stream_index,
                scaler: None,
                target_dimensions,
                decoded_frame: VideoFrame::empty(),
                rgb_frame: VideoFrame::empty(),
                eof_sent: false,
            }),
            scorer: MotionScorer::new(),
            options: options.clone(),
            tracker,
        })
    }
}

/// Lazy iterator over the motion samples of a video.
///
/// Created by [`VideoSource::motion_samples`]. After the first `None` or
/// `Err`, the underlying file is closed and the iterator stays exhausted.
pub struct MotionSamples {
    file_path: PathBuf,
    decode: Option<DecodeState>,
    scorer: MotionScorer,
    options: DetectionOptions,
    tracker: ProgressTracker,
}

impl MotionSamples {
    /// Number of frames decoded so far, including the reference frame.
    pub fn frames_decoded(&self) -> u64 {
        self.scorer.frames_seen()
    }

    /// Returns `true` while the video file is still held open.
    pub fn is_open(&self) -> bool {
        self.decode.is_some()
    }

    fn release(&mut self) {
        if self.decode.take().is_some() {
            log::debug!(
                "Closed {} after {} frames",
                self.file_path.display(),
                self.scorer.frames_seen()
            );
        }
    }

    fn unavailable(&self, reason: String) -> RallyError {
        RallyError::SourceUnavailable {
            path: self.file_path.clone(),
            reason,
        }
    }
}

impl Debug for MotionSamples {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MotionSamples")
            .field("file_path", &self.file_path)
            .field("open", &self.decode.is_some())
            .field("frames_decoded", &self.scorer.frames_seen())
            .finish_non_exhaustive()
    }
}

impl Iterator for MotionSamples {
    type Item = Result<MotionSample, RallyError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let decode = self.decode.as_mut()?;

            if self.options.is_cancelled() {
                self.release();
                return Some(Err(RallyError::Cancelled));
            }

            let frame = match decode.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.tracker.finish();
                    self.release();
                    return None;
                }
                Err(error) => {
                    let error = self.unavailable(format!("decoding failed: {error}"));
                    self.release();
                    return Some(Err(error));
                }
            };

            match self.scorer.observe(frame) {
                Ok(Some(sample)) => {
                    self.tracker.advance();
                    return Some(Ok(sample));
                }
                Ok(None) => continue,
                Err(error) => {
                    let error = self.unavailable(error.to_string());
                    self.release();
                    return Some(Err(error));
                }
            }
        }
    }
}

/// Demuxer, decoder, and grayscale converter for one traversal.
struct DecodeState {
    input_context: Input,
    decoder: VideoDecoder,
    video_stream_index: usize,
    /// Converter plus the `(format, width, height)` it was built for.
    scaler: Option<(ScalingContext, (Pixel, u32, u32))>,
    target_dimensions: (u32, u32),
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    eof_sent: bool,
}

impl DecodeState {
    /// Decode the next frame as grayscale, or `None` once the stream is
    /// drained.
    fn next_frame(&mut self) -> Result<Option<GrayImage>, RallyError> {
        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                return self.convert_current_frame().map(Some);
            }

            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => return Err(RallyError::from(error)),
            }
        }
    }

    fn convert_current_frame(&mut self) -> Result<GrayImage, RallyError> {
        let input = (
            self.decoded_frame.format(),
            self.decoded_frame.width(),
            self.decoded_frame.height(),
        );
        let (width, height) = self.target_dimensions;

        // Decoders may switch pixel format mid-stream; rebuild the converter
        // whenever the input definition changes.
        let rebuild = self
            .scaler
            .as_ref()
            .is_none_or(|(_, definition)| *definition != input);
        if rebuild {
            let context = ScalingContext::get(
                input.0,
                input.1,
                input.2,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?;
            self.scaler = Some((context, input));
        }

        if let Some((scaler, _)) = self.scaler.as_mut() {
            scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;
        }

        // RGB output expands limited-range YUV to 0-255 before luma is taken.
        let buffer = conversion::packed_plane_to_buffer(&self.rgb_frame, width as usize * 3, height);
        let rgb = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            RallyError::Ffmpeg("decoded frame is smaller than its reported size".to_string())
        })?;
        Ok(motion::rgb_to_luma(&rgb))
    }
}

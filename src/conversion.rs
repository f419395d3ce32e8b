//! Internal conversion helpers.
//!
//! Pixel-buffer copying and timestamp arithmetic shared by the video source
//! and the in-process exporter.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy the first plane of a packed frame into a tightly-packed buffer.
///
/// FFmpeg frames often carry per-row padding (stride > row length), which is
/// stripped here. `row_length` is in bytes.
pub(crate) fn packed_plane_to_buffer(
    video_frame: &VideoFrame,
    row_length: usize,
    height: u32,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let data = video_frame.data(0);

    if stride == row_length {
        data[..row_length * height as usize].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_length * height as usize);
        for row in 0..height as usize {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_length]);
        }
        buffer
    }
}

/// Convert a rational frame rate to frames per second, if it is usable.
pub(crate) fn rational_to_rate(rate: Rational) -> Option<f64> {
    if rate.denominator() == 0 {
        return None;
    }
    let value = f64::from(rate.numerator()) / f64::from(rate.denominator());
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Rescale a timestamp in the given time base to seconds.
///
/// A time base with a zero denominator gives `0.0`.
pub(crate) fn timestamp_to_seconds(timestamp: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    timestamp as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator())
}

/// Convert seconds to a container-level seek target in `AV_TIME_BASE` units.
pub(crate) fn seconds_to_seek_timestamp(seconds: f64) -> i64 {
    (seconds * f64::from(ffmpeg_sys_next::AV_TIME_BASE)) as i64
}

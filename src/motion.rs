//! Frame-to-frame motion scoring.
//!
//! The motion score between two frames is the mean absolute difference of
//! their luminance values, in the range `0.0..=255.0`. Luminance is computed
//! from full-range RGB with [`rgb_to_luma`]. [`MotionScorer`] keeps
//! the previous frame as a reference so that a stream of frames turns into a
//! stream of [`MotionSample`] values, one per transition.
//!
//! # Example
//!
//! ```
//! use image::{GrayImage, Luma};
//! use rallycut::motion_score;
//!
//! let dark = GrayImage::from_pixel(4, 4, Luma([10]));
//! let bright = GrayImage::from_pixel(4, 4, Luma([50]));
//! assert_eq!(motion_score(&dark, &bright)?, 40.0);
//! # Ok::<(), rallycut::RallyError>(())
//! ```

use image::{GrayImage, Luma, RgbImage};

use crate::error::RallyError;

/// The motion score for one frame transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    /// Index of the later of the two compared frames (0-indexed frames, so
    /// the first sample has index 1).
    pub frame_index: u64,
    /// Mean absolute luminance difference to the previous frame.
    pub score: f64,
}

/// Mean absolute per-pixel difference between two grayscale frames.
///
/// # Errors
///
/// Returns [`RallyError::InvalidFrame`] if the frames have different
/// dimensions.
pub fn motion_score(previous: &GrayImage, current: &GrayImage) -> Result<f64, RallyError> {
    if previous.dimensions() != current.dimensions() {
        return Err(RallyError::InvalidFrame(format!(
            "cannot compare a {}x{} frame with a {}x{} frame",
            previous.width(),
            previous.height(),
            current.width(),
            current.height(),
        )));
    }
    Ok(mean_absolute_difference(previous.as_raw(), current.as_raw()))
}

fn mean_absolute_difference(previous: &[u8], current: &[u8]) -> f64 {
    if previous.is_empty() {
        return 0.0;
    }
    let total: u64 = previous
        .iter()
        .zip(current)
        .map(|(&a, &b)| u64::from(a.abs_diff(b)))
        .sum();
    total as f64 / previous.len() as f64
}

// BT.601 luma weights in 14-bit fixed point.
const RED_WEIGHT: u32 = 4899;
const GREEN_WEIGHT: u32 = 9617;
const BLUE_WEIGHT: u32 = 1868;
const WEIGHT_SHIFT: u32 = 14;

/// Convert a full-range RGB frame to luminance with the BT.601 weights
/// (`0.299 R + 0.587 G + 0.114 B`, rounded).
///
/// ```
/// use image::{Rgb, RgbImage};
///
/// let red = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
/// assert_eq!(rallycut::rgb_to_luma(&red).get_pixel(0, 0).0, [76]);
/// ```
pub fn rgb_to_luma(frame: &RgbImage) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let [red, green, blue] = frame.get_pixel(x, y).0;
        let weighted = u32::from(red) * RED_WEIGHT
            + u32::from(green) * GREEN_WEIGHT
            + u32::from(blue) * BLUE_WEIGHT;
        Luma([((weighted + (1 << (WEIGHT_SHIFT - 1))) >> WEIGHT_SHIFT) as u8])
    })
}

/// Turns a sequence of frames into motion samples.
///
/// The first frame only becomes the reference and yields no sample. Each
/// later frame is scored against its predecessor and then replaces it.
#[derive(Debug, Default)]
pub struct MotionScorer {
    reference: Option<GrayImage>,
    frame_index: u64,
}

impl MotionScorer {
    /// Create a scorer with no reference frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next frame.
    ///
    /// Returns `None` for the first frame and a sample for every frame after
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`RallyError::InvalidFrame`] if the frame size changes
    /// mid-stream.
    pub fn observe(&mut self, frame: GrayImage) -> Result<Option<MotionSample>, RallyError> {
        let Some(reference) = self.reference.as_ref() else {
            self.reference = Some(frame);
            return Ok(None);
        };

        let score = motion_score(reference, &frame)?;
        self.frame_index += 1;
        self.reference = Some(frame);

        Ok(Some(MotionSample {
            frame_index: self.frame_index,
            score,
        }))
    }

    /// Number of frames seen so far, including the reference frame.
    pub fn frames_seen(&self) -> u64 {
        match self.reference {
            Some(_) => self.frame_index + 1,
            None => 0,
        }
    }
}

//! Sum-of-absolute-differences scoring kernels.
//!
//! A kernel scores one placement of a template against an equally sized
//! window of a captured frame. The score is the mean absolute per-channel
//! difference over all BGRA bytes, in `[0, 255]`, lower is better. All
//! accumulation is integer, so a kernel is bit-for-bit deterministic for
//! identical inputs and lane width.

use crate::image::BgraView;
use crate::template::Template;

pub mod scalar;
pub mod sparse;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;

/// Sentinel returned when early rejection aborts a score computation.
///
/// Compares greater than every reachable score (the non-rejected maximum is
/// 255.0), so minimum tracking never selects a rejected placement.
pub const SCORE_REJECTED: f32 = f32::MAX;

/// Scoring configuration shared by all kernels.
#[derive(Clone, Copy, Debug)]
pub struct ScoreParams {
    /// Maximum acceptable score; also drives the early-rejection bound.
    pub tolerance: u32,
    /// Number of pixels that must be tested before early rejection may fire.
    ///
    /// A value of at least `side * side` disables early rejection entirely.
    pub early_reject_pixels: u32,
}

impl ScoreParams {
    /// Params that never reject early, used by verification paths and tests.
    pub fn exhaustive(tolerance: u32) -> Self {
        Self {
            tolerance,
            early_reject_pixels: u32::MAX,
        }
    }
}

/// Lane width used by the vectorized kernels.
///
/// `Lanes8` processes 8 pixels (32 channel bytes) per step, `Lanes4`
/// processes 4. With the `simd` feature disabled both select the scalar
/// kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SimdWidth {
    #[default]
    Lanes8,
    Lanes4,
}

/// Kernel scoring one template placement against a frame window.
pub trait SadKernel {
    /// Scores the template with its top-left corner at `(x, y)` in `frame`.
    ///
    /// Returns [`SCORE_REJECTED`] when early rejection fires or the placement
    /// does not fit inside the frame.
    fn score_at(frame: BgraView<'_>, tpl: &Template, x: usize, y: usize, params: ScoreParams)
        -> f32;
}

/// Scores one placement with the kernel selected by `width`.
#[cfg(feature = "simd")]
pub fn score_at_dispatch(
    width: SimdWidth,
    frame: BgraView<'_>,
    tpl: &Template,
    x: usize,
    y: usize,
    params: ScoreParams,
) -> f32 {
    match width {
        SimdWidth::Lanes8 => simd::Wide8Sad::score_at(frame, tpl, x, y, params),
        SimdWidth::Lanes4 => simd::Wide4Sad::score_at(frame, tpl, x, y, params),
    }
}

/// Scores one placement with the scalar kernel; the `simd` feature is off.
#[cfg(not(feature = "simd"))]
pub fn score_at_dispatch(
    _width: SimdWidth,
    frame: BgraView<'_>,
    tpl: &Template,
    x: usize,
    y: usize,
    params: ScoreParams,
) -> f32 {
    scalar::ScalarSad::score_at(frame, tpl, x, y, params)
}

/// Early-rejection test shared by every kernel.
///
/// Fires once `pixels_tested` pixels have been examined and the accumulated
/// difference exceeds `tolerance` per channel on average. This assumes the
/// prefix is representative of the remainder, which is not always true: a
/// template that scores well overall but poorly on its first pixels is
/// rejected anyway. Accepted precision/performance trade-off.
#[inline]
pub(crate) fn should_reject(total_diff: u32, pixels_tested: u32, params: ScoreParams) -> bool {
    pixels_tested >= params.early_reject_pixels
        && total_diff > params.tolerance.saturating_mul(pixels_tested).saturating_mul(4)
}

/// Final score for a completed (non-rejected) pass over `side * side` pixels.
#[inline]
pub(crate) fn finalize(total_diff: u32, side: usize) -> f32 {
    total_diff as f32 / (side * side * 4) as f32
}

//! Scalar reference kernel.
//!
//! Byte-by-byte absolute differences with the early-rejection test applied
//! after every pixel. The vectorized kernels must produce the same final
//! score on every placement they do not reject.

use crate::image::{BgraView, BYTES_PER_PIXEL};
use crate::kernel::{finalize, should_reject, SadKernel, ScoreParams, SCORE_REJECTED};
use crate::template::Template;

/// Scalar sum-of-absolute-differences kernel.
pub struct ScalarSad;

impl SadKernel for ScalarSad {
    fn score_at(
        frame: BgraView<'_>,
        tpl: &Template,
        x: usize,
        y: usize,
        params: ScoreParams,
    ) -> f32 {
        let side = tpl.side();
        if x + side > frame.width() || y + side > frame.height() {
            return SCORE_REJECTED;
        }

        let tpl_pixels = tpl.pixels();
        let mut total_diff: u32 = 0;
        let mut pixels_tested: u32 = 0;

        for ty in 0..side {
            let frame_row = match frame.row(y + ty) {
                Some(row) => &row[x * BYTES_PER_PIXEL..(x + side) * BYTES_PER_PIXEL],
                None => return SCORE_REJECTED,
            };
            let tpl_row = &tpl_pixels[ty * side * BYTES_PER_PIXEL..(ty + 1) * side * BYTES_PER_PIXEL];

            for tx in 0..side {
                let base = tx * BYTES_PER_PIXEL;
                for c in 0..BYTES_PER_PIXEL {
                    let a = frame_row[base + c];
                    let b = tpl_row[base + c];
                    total_diff += u32::from(a.abs_diff(b));
                }
                pixels_tested += 1;

                if should_reject(total_diff, pixels_tested, params) {
                    return SCORE_REJECTED;
                }
            }
        }

        finalize(total_diff, side)
    }
}

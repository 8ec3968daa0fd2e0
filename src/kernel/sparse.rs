//! Sparse sampled probe kernel.
//!
//! Tests a fixed number of pixels spread over the template instead of the
//! full grid, with early rejection applied after every sample. The visiting
//! order is a fixed full-period stride permutation of the pixel indices, so
//! the result is reproducible for identical inputs, unlike a shuffled order.
//! The score is the mean absolute channel difference over the sampled pixels
//! only, comparable against the same tolerance as the full kernels.

use crate::image::{BgraView, BYTES_PER_PIXEL};
use crate::kernel::{ScoreParams, SCORE_REJECTED};
use crate::template::Template;

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Stride co-prime with `n`, giving a full-period visiting order.
fn probe_stride(n: usize) -> usize {
    if n <= 2 {
        return 1;
    }
    // Start near the golden-ratio point to spread early samples widely.
    let mut stride = n * 618 / 1000;
    if stride < 2 {
        stride = 2;
    }
    while gcd(stride, n) != 1 {
        stride += 1;
    }
    stride
}

/// Scores a placement from at most `sample_count` probed pixels.
///
/// Early rejection uses the same `tolerance * tested * 4` bound as the full
/// kernels but without a minimum-pixel gate; a handful of wildly different
/// samples aborts immediately.
pub fn score_sampled(
    frame: BgraView<'_>,
    tpl: &Template,
    x: usize,
    y: usize,
    params: ScoreParams,
    sample_count: usize,
) -> f32 {
    let side = tpl.side();
    if x + side > frame.width() || y + side > frame.height() {
        return SCORE_REJECTED;
    }

    let n = side * side;
    let samples = sample_count.clamp(1, n);
    let stride = probe_stride(n);
    let tpl_pixels = tpl.pixels();

    let mut total_diff: u32 = 0;
    let mut tested: u32 = 0;
    let mut idx = 0usize;

    for _ in 0..samples {
        let py = idx / side;
        let px = idx % side;

        let frame_row = match frame.row(y + py) {
            Some(row) => row,
            None => return SCORE_REJECTED,
        };
        let frame_base = (x + px) * BYTES_PER_PIXEL;
        let tpl_base = (py * side + px) * BYTES_PER_PIXEL;
        for c in 0..BYTES_PER_PIXEL {
            total_diff += u32::from(frame_row[frame_base + c].abs_diff(tpl_pixels[tpl_base + c]));
        }
        tested += 1;

        if total_diff > params.tolerance.saturating_mul(tested).saturating_mul(4) {
            return SCORE_REJECTED;
        }

        idx = (idx + stride) % n;
    }

    total_diff as f32 / (tested * 4) as f32
}

//! Vectorized kernels using the `wide` crate.
//!
//! A lane covers 8 or 4 pixels (32 or 16 channel bytes) per step. Channel
//! bytes are widened to `u16x8` and differenced with `max - min`, which is
//! the absolute difference for unsigned lanes; the horizontal sums stay in
//! integer arithmetic so the final score is identical to the scalar kernel.
//! The early-rejection test runs after each full lane; the partial lane at
//! the end of a row falls back to the scalar per-pixel path.

use wide::u16x8;

use crate::image::{BgraView, BYTES_PER_PIXEL};
use crate::kernel::{finalize, should_reject, SadKernel, ScoreParams, SCORE_REJECTED};
use crate::template::Template;

/// Widens 8 consecutive bytes into a `u16x8`.
#[inline]
fn load_u8x8(slice: &[u8]) -> u16x8 {
    u16x8::from([
        u16::from(slice[0]),
        u16::from(slice[1]),
        u16::from(slice[2]),
        u16::from(slice[3]),
        u16::from(slice[4]),
        u16::from(slice[5]),
        u16::from(slice[6]),
        u16::from(slice[7]),
    ])
}

/// Sum of absolute differences over `bytes` channel bytes (multiple of 8).
#[inline]
fn sad_bytes(frame: &[u8], tpl: &[u8], bytes: usize) -> u32 {
    let mut sum = 0u32;
    let mut offset = 0;
    while offset < bytes {
        let a = load_u8x8(&frame[offset..]);
        let b = load_u8x8(&tpl[offset..]);
        let diff = a.max(b) - a.min(b);
        for lane in diff.to_array() {
            sum += u32::from(lane);
        }
        offset += 8;
    }
    sum
}

#[inline]
fn score_at_lanes(
    frame: BgraView<'_>,
    tpl: &Template,
    x: usize,
    y: usize,
    params: ScoreParams,
    lane_pixels: usize,
) -> f32 {
    let side = tpl.side();
    if x + side > frame.width() || y + side > frame.height() {
        return SCORE_REJECTED;
    }

    let tpl_pixels = tpl.pixels();
    let lane_bytes = lane_pixels * BYTES_PER_PIXEL;
    let full_lanes_end = side / lane_pixels * lane_pixels;

    let mut total_diff: u32 = 0;
    let mut pixels_tested: u32 = 0;

    for ty in 0..side {
        let frame_row = match frame.row(y + ty) {
            Some(row) => &row[x * BYTES_PER_PIXEL..(x + side) * BYTES_PER_PIXEL],
            None => return SCORE_REJECTED,
        };
        let tpl_row = &tpl_pixels[ty * side * BYTES_PER_PIXEL..(ty + 1) * side * BYTES_PER_PIXEL];

        let mut tx = 0;
        while tx < full_lanes_end {
            let base = tx * BYTES_PER_PIXEL;
            total_diff += sad_bytes(&frame_row[base..], &tpl_row[base..], lane_bytes);
            pixels_tested += lane_pixels as u32;

            if should_reject(total_diff, pixels_tested, params) {
                return SCORE_REJECTED;
            }
            tx += lane_pixels;
        }

        // Partial lane: scalar per-pixel completion.
        while tx < side {
            let base = tx * BYTES_PER_PIXEL;
            for c in 0..BYTES_PER_PIXEL {
                total_diff += u32::from(frame_row[base + c].abs_diff(tpl_row[base + c]));
            }
            pixels_tested += 1;

            if should_reject(total_diff, pixels_tested, params) {
                return SCORE_REJECTED;
            }
            tx += 1;
        }
    }

    finalize(total_diff, side)
}

/// Vectorized kernel processing 8 pixels per lane.
pub struct Wide8Sad;

impl SadKernel for Wide8Sad {
    fn score_at(
        frame: BgraView<'_>,
        tpl: &Template,
        x: usize,
        y: usize,
        params: ScoreParams,
    ) -> f32 {
        score_at_lanes(frame, tpl, x, y, params, 8)
    }
}

/// Vectorized kernel processing 4 pixels per lane.
pub struct Wide4Sad;

impl SadKernel for Wide4Sad {
    fn score_at(
        frame: BgraView<'_>,
        tpl: &Template,
        x: usize,
        y: usize,
        params: ScoreParams,
    ) -> f32 {
        score_at_lanes(frame, tpl, x, y, params, 4)
    }
}

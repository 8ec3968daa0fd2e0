//! Coarse-to-fine pyramid search.
//!
//! A half-resolution pass shortlists candidate placements with a cheap
//! quarter-density quick-score under a relaxed tolerance, then each candidate
//! is verified at full resolution with the configured kernel. The relaxed
//! bound (2x the configured tolerance) controls the recall/speed trade:
//! matches whose coarse quick-score exceeds it are never verified and are
//! lost, in exchange for roughly 4-16x fewer full-resolution evaluations.

use crate::image::downsample::half_resolution;
use crate::image::{BgraView, OwnedBgra, BYTES_PER_PIXEL};
use crate::kernel::{score_at_dispatch, ScoreParams, SimdWidth, SCORE_REJECTED};
use crate::search::Placement;
use crate::template::Template;
use crate::trace::{trace_event, trace_span};
use crate::util::ScreenMatchResult;

/// Pixels the quick-score must test before its early rejection may fire.
const QUICK_REJECT_MIN_PIXELS: u32 = 10;

/// Full-resolution verification radius around each coarse candidate.
const REFINE_RADIUS: usize = 3;

/// Candidate placement from the coarse pass, in full-resolution coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub x: usize,
    pub y: usize,
    /// Coarse quick-score, not the verified score.
    pub score: f32,
}

/// Half-resolution copy of a template, reusable across regions in a cycle.
pub fn downsample_template(tpl: &Template) -> ScreenMatchResult<OwnedBgra> {
    half_resolution(tpl.view())
}

/// Quarter-density quick-score at `(x, y)` in the half-resolution frame.
///
/// Samples every other pixel of the half-resolution template and applies the
/// early-rejection rule once more than [`QUICK_REJECT_MIN_PIXELS`] pixels
/// are in.
pub fn quick_score(
    frame_half: BgraView<'_>,
    tpl_half: BgraView<'_>,
    x: usize,
    y: usize,
    relaxed_tolerance: u32,
) -> f32 {
    let side = tpl_half.width();
    let mut diff: u32 = 0;
    let mut pixels: u32 = 0;

    let mut ty = 0;
    while ty < side {
        let frame_row = match frame_half.row(y + ty) {
            Some(row) => row,
            None => return SCORE_REJECTED,
        };
        let tpl_row = match tpl_half.row(ty) {
            Some(row) => row,
            None => return SCORE_REJECTED,
        };

        let mut tx = 0;
        while tx < side {
            let frame_base = (x + tx) * BYTES_PER_PIXEL;
            let tpl_base = tx * BYTES_PER_PIXEL;
            for c in 0..BYTES_PER_PIXEL {
                diff += u32::from(frame_row[frame_base + c].abs_diff(tpl_row[tpl_base + c]));
            }
            pixels += 1;

            if pixels > QUICK_REJECT_MIN_PIXELS
                && diff > relaxed_tolerance.saturating_mul(pixels).saturating_mul(4)
            {
                return SCORE_REJECTED;
            }
            tx += 2;
        }
        ty += 2;
    }

    if pixels == 0 {
        return SCORE_REJECTED;
    }
    diff as f32 / (pixels * 4) as f32
}

/// Coarse scan of the half-resolution frame with a stride of 2.
///
/// Every position whose quick-score falls below the relaxed tolerance is
/// recorded as a candidate in full-resolution coordinates (coarse x2).
pub fn coarse_candidates(
    frame_half: BgraView<'_>,
    tpl_half: BgraView<'_>,
    relaxed_tolerance: u32,
) -> Vec<Candidate> {
    let side = tpl_half.width();
    let mut candidates = Vec::new();
    if frame_half.width() < side || frame_half.height() < side {
        return candidates;
    }
    let max_x = frame_half.width() - side;
    let max_y = frame_half.height() - side;
    let bound = relaxed_tolerance as f32;

    let mut y = 0;
    while y <= max_y {
        let mut x = 0;
        while x <= max_x {
            let score = quick_score(frame_half, tpl_half, x, y, relaxed_tolerance);
            if score < bound {
                candidates.push(Candidate {
                    x: x * 2,
                    y: y * 2,
                    score,
                });
            }
            x += 2;
        }
        y += 2;
    }

    candidates
}

/// Runs the full coarse-to-fine search for one (frame, template) pair.
///
/// `tpl_half` must be the half-resolution copy of `tpl` (see
/// [`downsample_template`]). Returns the lowest verified placement, or `None`
/// when the coarse pass yields no candidates or verification rejects all of
/// them. The caller applies the final tolerance check.
pub fn search(
    frame: BgraView<'_>,
    tpl: &Template,
    tpl_half: BgraView<'_>,
    params: ScoreParams,
    width: SimdWidth,
) -> ScreenMatchResult<Option<Placement>> {
    let side = tpl.side();
    if frame.width() < side || frame.height() < side {
        return Ok(None);
    }
    let _span = trace_span!(
        "pyramid_search",
        frame_w = frame.width(),
        frame_h = frame.height()
    )
    .entered();

    let frame_half = half_resolution(frame)?;
    let relaxed = params.tolerance.saturating_mul(2);
    let candidates = coarse_candidates(frame_half.view(), tpl_half, relaxed);
    trace_event!("coarse_candidates", count = candidates.len());

    let max_x = frame.width() - side;
    let max_y = frame.height() - side;

    // A coarse candidate can be up to REFINE_RADIUS full-resolution pixels
    // away from the true placement: the coarse stride skips odd half-res
    // positions (2 full-res pixels) and downsampling truncates odd offsets
    // (1 more). Verify the whole neighbourhood.
    let mut best: Option<Placement> = None;
    for cand in candidates {
        let cx = cand.x.min(max_x);
        let cy = cand.y.min(max_y);
        let x0 = cx.saturating_sub(REFINE_RADIUS);
        let y0 = cy.saturating_sub(REFINE_RADIUS);
        let x1 = (cx + REFINE_RADIUS).min(max_x);
        let y1 = (cy + REFINE_RADIUS).min(max_y);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let score = score_at_dispatch(width, frame, tpl, x, y, params);
                if score == SCORE_REJECTED {
                    continue;
                }
                if best.map_or(true, |b| score < b.score) {
                    best = Some(Placement { x, y, score });
                }
            }
        }
    }

    trace_event!("pyramid_best", found = best.is_some());
    Ok(best)
}

//! Row-parallel exhaustive scan (rayon).
//!
//! Each placement row is scanned on its own task; the per-row minima are then
//! reduced with the same tie-breaking as the serial scan (lowest score, then
//! lowest y, then lowest x), so the result is identical to
//! `search::exhaustive::scan_full`.

use rayon::prelude::*;

use crate::image::BgraView;
use crate::kernel::{score_at_dispatch, ScoreParams, SimdWidth, SCORE_REJECTED};
use crate::search::Placement;
use crate::template::Template;

/// Parallel equivalent of the serial exhaustive scan.
pub fn scan_full_par(
    frame: BgraView<'_>,
    tpl: &Template,
    params: ScoreParams,
    width: SimdWidth,
) -> Option<Placement> {
    let side = tpl.side();
    if frame.width() < side || frame.height() < side {
        return None;
    }
    let max_x = frame.width() - side;
    let max_y = frame.height() - side;

    (0..=max_y)
        .into_par_iter()
        .filter_map(|y| {
            let mut row_best: Option<Placement> = None;
            for x in 0..=max_x {
                let score = score_at_dispatch(width, frame, tpl, x, y, params);
                if score == SCORE_REJECTED {
                    continue;
                }
                if row_best.map_or(true, |b| score < b.score) {
                    row_best = Some(Placement { x, y, score });
                }
            }
            row_best
        })
        .reduce_with(|a, b| {
            if b.score < a.score || (b.score == a.score && (b.y, b.x) < (a.y, a.x)) {
                b
            } else {
                a
            }
        })
}

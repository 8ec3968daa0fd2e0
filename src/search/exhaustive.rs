//! Exhaustive full-resolution scan.

use crate::image::BgraView;
use crate::kernel::sparse::score_sampled;
use crate::kernel::{score_at_dispatch, ScoreParams, SimdWidth, SCORE_REJECTED};
use crate::search::Placement;
use crate::template::Template;
use crate::trace::{trace_event, trace_span};

/// Scans every valid placement and returns the minimum-score one.
///
/// Ties resolve to the first placement in scan order (row-major, ascending x
/// then y) because only strictly lower scores replace the running best.
/// Returns `None` when the template does not fit or every placement was
/// rejected early.
pub fn scan_full(
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

    let _span = trace_span!("exhaustive_scan", max_x = max_x, max_y = max_y).entered();

    let mut best: Option<Placement> = None;
    for y in 0..=max_y {
        for x in 0..=max_x {
            let score = score_at_dispatch(width, frame, tpl, x, y, params);
            if score == SCORE_REJECTED {
                continue;
            }
            if best.map_or(true, |b| score < b.score) {
                best = Some(Placement { x, y, score });
            }
        }
    }

    trace_event!("exhaustive_best", found = best.is_some());
    best
}

/// Exhaustive scan using the sparse sampled probe instead of the full kernel.
///
/// Used when the sampled-probe setting is on; trades score fidelity for a
/// bounded per-placement cost. `sample_count` pixels are probed per placement.
pub fn scan_full_sampled(
    frame: BgraView<'_>,
    tpl: &Template,
    params: ScoreParams,
    sample_count: usize,
) -> Option<Placement> {
    let side = tpl.side();
    if frame.width() < side || frame.height() < side {
        return None;
    }
    let max_x = frame.width() - side;
    let max_y = frame.height() - side;

    let mut best: Option<Placement> = None;
    for y in 0..=max_y {
        for x in 0..=max_x {
            let score = score_sampled(frame, tpl, x, y, params, sample_count);
            if score == SCORE_REJECTED {
                continue;
            }
            if best.map_or(true, |b| score < b.score) {
                best = Some(Placement { x, y, score });
            }
        }
    }
    best
}

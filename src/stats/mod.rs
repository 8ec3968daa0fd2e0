//! Per-template learning statistics.
//!
//! Every accepted match feeds a pure bookkeeping sink: hit counts, a bounded
//! history of hit positions, and a running average recomputed from the
//! retained history. Statistics are 1:1 with templates by index and the
//! collection only grows during a run, so indices stay aligned as templates
//! are appended.

use std::collections::VecDeque;

use crate::region::SearchRegion;

pub mod snapshot;

/// Retained hit positions per template; older entries are evicted.
pub const HISTORY_CAPACITY: usize = 100;

/// Hits within this window earn the recency bonus in the optimized order.
const RECENCY_BONUS_SECS: u64 = 60;

/// Learning state for one template.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateStats {
    /// Lifetime accepted-match count.
    pub hit_count: u64,
    /// Running average of the retained history, integer-truncated.
    ///
    /// Computed over the capped history only, so long sessions slowly forget
    /// early hits as they scroll out of the window.
    pub avg_position: (i32, i32),
    /// Reserved for a hit-rate estimate; persisted but not yet computed.
    pub probability: f32,
    /// Seconds since the Unix epoch of the most recent hit.
    pub last_hit_secs: Option<u64>,
    history: VecDeque<(i32, i32)>,
}

impl TemplateStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one accepted match centred at `(x, y)` at time `now_secs`.
    pub fn record_hit(&mut self, x: i32, y: i32, now_secs: u64) {
        self.hit_count += 1;
        self.last_hit_secs = Some(now_secs);

        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back((x, y));
        self.recompute_average();
    }

    /// Retained hit positions in chronological order, oldest first.
    pub fn history(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.history.iter().copied()
    }

    /// Number of retained hit positions.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn recompute_average(&mut self) {
        if self.history.is_empty() {
            self.avg_position = (0, 0);
            return;
        }
        let mut sum_x: i64 = 0;
        let mut sum_y: i64 = 0;
        for &(x, y) in &self.history {
            sum_x += i64::from(x);
            sum_y += i64::from(y);
        }
        let n = self.history.len() as i64;
        self.avg_position = ((sum_x / n) as i32, (sum_y / n) as i32);
    }

    fn restore_history(&mut self, positions: impl IntoIterator<Item = (i32, i32)>) {
        self.history = positions.into_iter().collect();
        while self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.recompute_average();
    }
}

/// Grows `stats` so every template index up to `count - 1` has an entry.
pub fn ensure_len(stats: &mut Vec<TemplateStats>, count: usize) {
    if stats.len() < count {
        stats.resize_with(count, TemplateStats::new);
    }
}

/// Template indices ordered by search priority, most productive first.
///
/// Priority is the hit count with a 2x bonus for templates hit within the
/// last minute; ties keep index order. A caller can scan templates in this
/// order so historically productive ones are tested first.
pub fn optimized_order(stats: &[TemplateStats], now_secs: u64) -> Vec<usize> {
    let mut priorities: Vec<(f32, usize)> = stats
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let mut priority = s.hit_count as f32;
            if let Some(last) = s.last_hit_secs {
                if now_secs.saturating_sub(last) <= RECENCY_BONUS_SECS {
                    priority *= 2.0;
                }
            }
            (priority, idx)
        })
        .collect();
    priorities.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
    priorities.into_iter().map(|(_, idx)| idx).collect()
}

/// Width and height of the focused adaptive region.
const ADAPTIVE_REGION_SIZE: usize = 100;
/// Margin added on each side for the expanded variant.
const ADAPTIVE_EXPAND_MARGIN: i32 = 50;
/// Minimum retained hits before adaptive regions are worth proposing.
const ADAPTIVE_MIN_HISTORY: usize = 10;

/// Proposes search regions biased toward a template's historical hits.
///
/// Returns `None` when fewer than 10 positions are retained; the caller
/// falls back to its configured regions. Otherwise returns a region centred
/// on the average hit position plus an expanded variant, both clamped into
/// the `display` bounds.
pub fn adaptive_regions(
    stats: &TemplateStats,
    template_id: usize,
    display: (usize, usize),
) -> Option<Vec<SearchRegion>> {
    if stats.history_len() < ADAPTIVE_MIN_HISTORY {
        return None;
    }
    let (display_w, display_h) = display;
    let (avg_x, avg_y) = stats.avg_position;
    let half = (ADAPTIVE_REGION_SIZE / 2) as i32;

    let clamp_origin = |v: i32, size: usize, bound: usize| -> i32 {
        let max = bound.saturating_sub(size) as i32;
        v.clamp(0, max.max(0))
    };

    let focused = SearchRegion::new(
        clamp_origin(avg_x - half, ADAPTIVE_REGION_SIZE, display_w),
        clamp_origin(avg_y - half, ADAPTIVE_REGION_SIZE, display_h),
        ADAPTIVE_REGION_SIZE.min(display_w),
        ADAPTIVE_REGION_SIZE.min(display_h),
        format!("Adaptive_{template_id}"),
    );

    let expanded_size = ADAPTIVE_REGION_SIZE + 2 * ADAPTIVE_EXPAND_MARGIN as usize;
    let expanded = SearchRegion::new(
        clamp_origin(focused.x - ADAPTIVE_EXPAND_MARGIN, expanded_size, display_w),
        clamp_origin(focused.y - ADAPTIVE_EXPAND_MARGIN, expanded_size, display_h),
        expanded_size.min(display_w),
        expanded_size.min(display_h),
        format!("Adaptive_{template_id}_expanded"),
    );

    Some(vec![focused, expanded])
}

/// Renders the statistics as CSV, one row per template.
pub fn export_csv<'a>(
    names: impl IntoIterator<Item = &'a str>,
    stats: &[TemplateStats],
) -> String {
    let mut out = String::from("Template,HitCount,AvgX,AvgY,Probability\n");
    for (name, s) in names.into_iter().zip(stats) {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            name, s.hit_count, s.avg_position.0, s.avg_position.1, s.probability
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{adaptive_regions, optimized_order, TemplateStats, HISTORY_CAPACITY};

    #[test]
    fn history_is_bounded_and_chronological() {
        let mut stats = TemplateStats::new();
        for i in 0..150 {
            stats.record_hit(i, i * 2, 0);
        }
        assert_eq!(stats.history_len(), HISTORY_CAPACITY);
        let history: Vec<_> = stats.history().collect();
        assert_eq!(history.first(), Some(&(50, 100)));
        assert_eq!(history.last(), Some(&(149, 298)));
        assert_eq!(stats.hit_count, 150);
    }

    #[test]
    fn average_truncates_toward_zero() {
        let mut stats = TemplateStats::new();
        stats.record_hit(0, 0, 0);
        stats.record_hit(1, 1, 0);
        stats.record_hit(1, 1, 0);
        // (0 + 1 + 1) / 3 = 0 with integer division.
        assert_eq!(stats.avg_position, (0, 0));
    }

    #[test]
    fn average_covers_retained_window_only() {
        let mut stats = TemplateStats::new();
        // 100 early hits at x=0, then 100 at x=200: the early ones scroll out.
        for _ in 0..100 {
            stats.record_hit(0, 0, 0);
        }
        for _ in 0..100 {
            stats.record_hit(200, 0, 0);
        }
        assert_eq!(stats.avg_position, (200, 0));
    }

    #[test]
    fn optimized_order_prefers_recent_heavy_hitters() {
        let mut a = TemplateStats::new();
        let mut b = TemplateStats::new();
        let mut c = TemplateStats::new();
        for _ in 0..10 {
            a.record_hit(0, 0, 0); // stale hits
        }
        for _ in 0..6 {
            b.record_hit(0, 0, 1000); // recent, doubled to 12
        }
        c.record_hit(0, 0, 1000);
        let order = optimized_order(&[a, b, c], 1000);
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn adaptive_regions_need_history() {
        let mut stats = TemplateStats::new();
        for i in 0..9 {
            stats.record_hit(i, i, 0);
        }
        assert!(adaptive_regions(&stats, 0, (1920, 1080)).is_none());

        stats.record_hit(500, 400, 0);
        let regions = adaptive_regions(&stats, 0, (1920, 1080)).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].name, "Adaptive_0");
        assert_eq!(regions[1].name, "Adaptive_0_expanded");
        assert!(regions[0].x >= 0 && regions[0].y >= 0);
    }

    #[test]
    fn adaptive_regions_clamp_to_display() {
        let mut stats = TemplateStats::new();
        for _ in 0..10 {
            stats.record_hit(5, 5, 0);
        }
        let regions = adaptive_regions(&stats, 3, (1920, 1080)).unwrap();
        assert_eq!(regions[0].x, 0);
        assert_eq!(regions[0].y, 0);
    }
}

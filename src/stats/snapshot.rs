//! Serialized form of the learning statistics.
//!
//! Snapshots round-trip through JSON so a run can resume with the hit
//! history of previous sessions. Loading is tolerant: corrupt or missing
//! data falls back to defaults rather than failing startup.

use serde::{Deserialize, Serialize};

use super::{ensure_len, TemplateStats};

/// Persisted statistics for one template.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TemplateStatsSnapshot {
    pub hit_count: u64,
    pub avg_x: i32,
    pub avg_y: i32,
    pub probability: f32,
    #[serde(default)]
    pub last_hit_secs: Option<u64>,
    /// Chronological hit positions, oldest first, at most the history cap.
    #[serde(default)]
    pub history: Vec<(i32, i32)>,
}

/// Persisted statistics for the whole template bank.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub templates: Vec<TemplateStatsSnapshot>,
}

impl StatsSnapshot {
    /// Captures the current statistics for serialization.
    pub fn capture(stats: &[TemplateStats]) -> Self {
        let templates = stats
            .iter()
            .map(|s| TemplateStatsSnapshot {
                hit_count: s.hit_count,
                avg_x: s.avg_position.0,
                avg_y: s.avg_position.1,
                probability: s.probability,
                last_hit_secs: s.last_hit_secs,
                history: s.history().collect(),
            })
            .collect();
        Self { templates }
    }

    /// Rebuilds in-memory statistics sized for `template_count` templates.
    ///
    /// Entries beyond the persisted data start fresh; persisted entries
    /// beyond the current bank are kept so indices stay stable if templates
    /// are re-added later. The average is recomputed from the restored
    /// history, which also re-caps oversized persisted histories.
    pub fn restore(&self, template_count: usize) -> Vec<TemplateStats> {
        let mut stats: Vec<TemplateStats> = self
            .templates
            .iter()
            .map(|snap| {
                let mut s = TemplateStats {
                    hit_count: snap.hit_count,
                    probability: snap.probability,
                    last_hit_secs: snap.last_hit_secs,
                    ..TemplateStats::default()
                };
                s.restore_history(snap.history.iter().copied());
                s
            })
            .collect();
        ensure_len(&mut stats, template_count);
        stats
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Parses persisted statistics, falling back to empty on corrupt input.
pub fn load_or_default(json: &str, template_count: usize) -> Vec<TemplateStats> {
    let snapshot: StatsSnapshot = serde_json::from_str(json).unwrap_or_default();
    snapshot.restore(template_count)
}

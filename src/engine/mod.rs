//! Match-cycle orchestration.
//!
//! One cycle captures each active region once, scans every active template
//! against it with the configured search strategy, and atomically publishes
//! the accepted matches through [`SharedState`]. Collaborators read the
//! shared state between cycles; the engine is the only writer during a
//! cycle, so readers always see either the previous cycle's results or the
//! new ones, never a mix.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

use crate::capture::{CaptureBackend, CaptureRect, FrameSource};
use crate::image::{BgraView, OwnedBgra};
use crate::kernel::ScoreParams;
use crate::region::SearchRegion;
use crate::search::exhaustive::scan_full_sampled;
use crate::search::{pyramid, Placement};
use crate::settings::{BackendPreference, Settings};
use crate::stats::snapshot::StatsSnapshot;
use crate::stats::{adaptive_regions, ensure_len, export_csv, optimized_order, TemplateStats};
use crate::template::{Template, TemplateBank};
use crate::trace::{trace_event, trace_span};
use crate::util::ScreenMatchResult;

pub mod runner;

/// One accepted match from the most recent cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub template_id: usize,
    pub template_name: String,
    pub region_name: String,
    /// Template centre in absolute display coordinates.
    pub x: i32,
    pub y: i32,
    pub score: f32,
    /// Seconds since the Unix epoch when the cycle accepted the match.
    pub matched_at_secs: u64,
}

/// Cycle timing published through the shared state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CycleTelemetry {
    pub cycles: u64,
    pub last_cycle: Duration,
    /// Exponential moving average of cycles per second; zero until the
    /// first timed cycle.
    pub fps: f32,
}

struct StateInner {
    templates: TemplateBank,
    regions: Vec<SearchRegion>,
    settings: Settings,
    stats: Vec<TemplateStats>,
    matches: Arc<Vec<MatchResult>>,
    telemetry: CycleTelemetry,
    next_match: usize,
}

/// State shared between the engine, its runner, and collaborators.
///
/// All accessors take the lock briefly and return owned or `Arc`'d data, so
/// no caller holds the lock across a cycle.
pub struct SharedState {
    inner: RwLock<StateInner>,
}

impl SharedState {
    pub fn new(settings: Settings) -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(StateInner {
                templates: TemplateBank::new(),
                regions: Vec::new(),
                settings,
                stats: Vec::new(),
                matches: Arc::new(Vec::new()),
                telemetry: CycleTelemetry::default(),
                next_match: 0,
            }),
        })
    }

    /// Appends a template and returns its stable index.
    pub fn add_template(&self, template: Template) -> ScreenMatchResult<usize> {
        let mut inner = self.inner.write();
        let index = inner.templates.push(template)?;
        let count = inner.templates.len();
        ensure_len(&mut inner.stats, count);
        Ok(index)
    }

    pub fn set_template_active(&self, index: usize, active: bool) -> ScreenMatchResult<()> {
        self.inner.write().templates.set_active(index, active)
    }

    /// Appends a search region and returns its index.
    pub fn add_region(&self, region: SearchRegion) -> usize {
        let mut inner = self.inner.write();
        inner.regions.push(region);
        inner.regions.len() - 1
    }

    pub fn settings(&self) -> Settings {
        self.inner.read().settings
    }

    /// Applies flat key/value pairs to the settings; unknown keys are
    /// ignored. Takes effect at the next cycle boundary.
    pub fn apply_settings<'a>(&self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) {
        let mut inner = self.inner.write();
        for (key, value) in pairs {
            inner.settings.apply_pair(key, value);
        }
    }

    /// Matches from the most recent completed cycle.
    pub fn matches(&self) -> Arc<Vec<MatchResult>> {
        Arc::clone(&self.inner.read().matches)
    }

    /// Round-robin pick over the current match list.
    ///
    /// Successive calls walk the list and wrap, so a collaborator acting on
    /// one match per cycle rotates through simultaneous matches instead of
    /// always acting on the first.
    pub fn next_match(&self) -> Option<MatchResult> {
        let mut inner = self.inner.write();
        if inner.matches.is_empty() {
            return None;
        }
        let pick = inner.next_match % inner.matches.len();
        inner.next_match = pick + 1;
        Some(inner.matches[pick].clone())
    }

    pub fn telemetry(&self) -> CycleTelemetry {
        self.inner.read().telemetry
    }

    /// Captures the learning statistics for persistence.
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        StatsSnapshot::capture(&self.inner.read().stats)
    }

    /// Replaces the learning statistics from a persisted snapshot, resized
    /// for the current template count.
    pub fn restore_stats(&self, snapshot: &StatsSnapshot) {
        let mut inner = self.inner.write();
        let count = inner.templates.len();
        inner.stats = snapshot.restore(count);
    }

    /// Current statistics as CSV, one row per template.
    pub fn export_stats_csv(&self) -> String {
        let inner = self.inner.read();
        let templates = inner.templates.snapshot();
        export_csv(templates.iter().map(|t| t.name()), &inner.stats)
    }

    /// Everything a cycle reads, taken under one short read lock.
    fn cycle_inputs(
        &self,
    ) -> (
        Vec<Arc<Template>>,
        Vec<SearchRegion>,
        Settings,
        Vec<TemplateStats>,
    ) {
        let inner = self.inner.read();
        (
            inner.templates.snapshot(),
            inner.regions.clone(),
            inner.settings,
            inner.stats.clone(),
        )
    }

    /// Publishes a finished cycle: match list, learning updates, timing.
    fn publish_cycle(&self, found: Vec<MatchResult>, elapsed: Duration, now_secs: u64) {
        let mut inner = self.inner.write();
        if inner.settings.enable_learning {
            let count = inner.templates.len();
            ensure_len(&mut inner.stats, count);
            for m in &found {
                if let Some(stats) = inner.stats.get_mut(m.template_id) {
                    stats.record_hit(m.x, m.y, now_secs);
                }
            }
        }
        inner.matches = Arc::new(found);
        inner.telemetry.cycles += 1;
        inner.telemetry.last_cycle = elapsed;
        if inner.settings.show_fps {
            let secs = elapsed.as_secs_f32();
            if secs > 0.0 {
                let instant_fps = 1.0 / secs;
                inner.telemetry.fps = if inner.telemetry.fps == 0.0 {
                    instant_fps
                } else {
                    0.9 * inner.telemetry.fps + 0.1 * instant_fps
                };
            }
        }
    }
}

/// The match engine: owns the frame source and drives cycles.
pub struct MatchEngine<P, F> {
    state: Arc<SharedState>,
    source: FrameSource<P, F>,
    /// Display bounds used to clamp adaptive regions.
    display: (usize, usize),
    frame_buf: Vec<u8>,
}

impl<P: CaptureBackend, F: CaptureBackend> MatchEngine<P, F> {
    pub fn new(state: Arc<SharedState>, source: FrameSource<P, F>, display: (usize, usize)) -> Self {
        Self {
            state,
            source,
            display,
            frame_buf: Vec::new(),
        }
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// Runs one full match cycle and returns the number of accepted matches.
    ///
    /// A region whose capture fails is skipped for this cycle; the cycle
    /// itself fails only on internal errors such as a malformed template.
    pub fn run_cycle(&mut self) -> ScreenMatchResult<usize> {
        let started = Instant::now();
        let now_secs = epoch_secs();
        let (templates, regions, settings, stats) = self.state.cycle_inputs();

        let _span = trace_span!(
            "match_cycle",
            templates = templates.len(),
            regions = regions.len()
        )
        .entered();

        self.source
            .set_prefer_primary(settings.capture_backend == BackendPreference::Duplication);

        let params = ScoreParams {
            tolerance: settings.tolerance,
            early_reject_pixels: settings.early_pixel_count,
        };
        let order = if settings.enable_learning {
            optimized_order(&stats, now_secs)
        } else {
            (0..templates.len()).collect()
        };

        // Half-resolution templates are shared across every region scanned
        // this cycle. A template too small to halve gets no entry and is
        // scanned exhaustively instead.
        let halves: Vec<Option<OwnedBgra>> = if settings.use_pyramid_search {
            templates
                .iter()
                .map(|tpl| {
                    if tpl.is_active() {
                        pyramid::downsample_template(tpl).ok()
                    } else {
                        None
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut found: Vec<MatchResult> = Vec::new();

        for region in regions.iter().filter(|r| r.active) {
            self.scan_region(
                region, &templates, &order, &halves, params, &settings, now_secs, &mut found,
            )?;
        }

        // Learned pass: templates with enough history get focused regions
        // around their historical hit positions, but only when the
        // configured regions produced nothing for them this cycle.
        if settings.enable_learning {
            for &tid in &order {
                if found.iter().any(|m| m.template_id == tid) {
                    continue;
                }
                let Some(stat) = stats.get(tid) else { continue };
                let Some(extra) = adaptive_regions(stat, tid, self.display) else {
                    continue;
                };
                let solo = [tid];
                for region in &extra {
                    self.scan_region(
                        region, &templates, &solo, &halves, params, &settings, now_secs,
                        &mut found,
                    )?;
                }
            }
        }

        let count = found.len();
        trace_event!("cycle_done", matches = count);
        self.state.publish_cycle(found, started.elapsed(), now_secs);
        Ok(count)
    }

    /// Captures one region and scans the listed templates against it.
    #[allow(clippy::too_many_arguments)]
    fn scan_region(
        &mut self,
        region: &SearchRegion,
        templates: &[Arc<Template>],
        order: &[usize],
        halves: &[Option<OwnedBgra>],
        params: ScoreParams,
        settings: &Settings,
        now_secs: u64,
        found: &mut Vec<MatchResult>,
    ) -> ScreenMatchResult<()> {
        let rect = CaptureRect::new(region.x, region.y, region.width, region.height);
        self.frame_buf.resize(rect.byte_len(), 0);
        match self.source.capture(rect, &mut self.frame_buf) {
            Ok(_) => {}
            Err(_) => {
                // Both backends failed for this rect; skip the region and
                // let the next cycle retry.
                trace_event!("region_capture_failed");
                return Ok(());
            }
        }
        let frame = BgraView::from_slice(&self.frame_buf, region.width, region.height)?;

        for &tid in order {
            let Some(tpl) = templates.get(tid) else { continue };
            if !tpl.is_active() {
                continue;
            }
            let side = tpl.side();
            if region.check_fits(side).is_err() {
                continue;
            }

            let best = if settings.use_pyramid_search {
                match halves.get(tid).and_then(Option::as_ref) {
                    Some(half) => {
                        pyramid::search(frame, tpl, half.view(), params, settings.simd_width)?
                    }
                    None => exhaustive_best(frame, tpl, params, settings.simd_width),
                }
            } else if settings.random_pixel_test {
                scan_full_sampled(frame, tpl, params, settings.early_pixel_count.max(1) as usize)
            } else {
                exhaustive_best(frame, tpl, params, settings.simd_width)
            };

            if let Some(Placement { x, y, score }) = best {
                if score < settings.tolerance as f32 {
                    found.push(MatchResult {
                        template_id: tid,
                        template_name: tpl.name().to_owned(),
                        region_name: region.name.clone(),
                        x: region.x + x as i32 + (side / 2) as i32,
                        y: region.y + y as i32 + (side / 2) as i32,
                        score,
                        matched_at_secs: now_secs,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "rayon")]
fn exhaustive_best(
    frame: BgraView<'_>,
    tpl: &Template,
    params: ScoreParams,
    width: crate::kernel::SimdWidth,
) -> Option<Placement> {
    crate::kernel::rayon::scan_full_par(frame, tpl, params, width)
}

#[cfg(not(feature = "rayon"))]
fn exhaustive_best(
    frame: BgraView<'_>,
    tpl: &Template,
    params: ScoreParams,
    width: crate::kernel::SimdWidth,
) -> Option<Placement> {
    crate::search::exhaustive::scan_full(frame, tpl, params, width)
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

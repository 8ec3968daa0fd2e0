//! ScreenMatch is a soft-real-time screen template-matching engine.
//!
//! Captured display regions are scanned for small square templates with a
//! SAD (sum of absolute differences) kernel, optionally through a two-level
//! coarse-to-fine pyramid. Matching runs in repeated cycles on a background
//! thread; accepted matches feed per-template learning statistics that bias
//! later cycles toward historically productive templates and regions.
//!
//! Capture is abstracted behind [`capture::CaptureBackend`]: a preferred
//! duplication-style primary with a blocking fallback, plus in-memory
//! backends for tests and headless use. SIMD kernels are enabled via the
//! `simd` feature (on by default) and row-parallel scanning via `rayon`.

pub mod capture;
pub mod engine;
pub mod image;
pub mod kernel;
pub mod region;
pub mod search;
pub mod settings;
pub mod stats;
pub mod template;
pub(crate) mod trace;
pub mod util;

pub use capture::{BackendState, CaptureBackend, CaptureRect, CaptureStatus, FrameSource};
pub use engine::runner::{CycleRunner, DEFAULT_PERIOD};
pub use engine::{CycleTelemetry, MatchEngine, MatchResult, SharedState};
pub use image::{BgraView, OwnedBgra};
pub use kernel::{ScoreParams, SimdWidth, SCORE_REJECTED};
pub use region::SearchRegion;
pub use search::Placement;
pub use settings::{BackendPreference, Settings};
pub use stats::snapshot::StatsSnapshot;
pub use stats::TemplateStats;
pub use template::{Template, TemplateBank, DEFAULT_TEMPLATE_SIDE};
pub use util::{CaptureError, ScreenMatchError, ScreenMatchResult};

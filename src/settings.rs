//! Process-wide configuration.
//!
//! The on-disk representation is owned by a collaborator; the core consumes a
//! flat key/value mapping. Unknown keys are ignored and missing keys keep the
//! prior in-memory value, so a partial mapping is always safe to apply.

use crate::kernel::SimdWidth;

/// Which capture backend the frame source should prefer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BackendPreference {
    /// Duplication-style primary with fallback on failure.
    #[default]
    Duplication,
    /// Go straight to the blocking region-copy fallback.
    Blit,
}

/// Engine configuration applied once per cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Collaborator hint: act on a match. The core only reports matches.
    pub click_on_match: bool,
    /// Collaborator hint: act twice.
    pub double_click: bool,
    /// Dissimilarity score above which a candidate is rejected, 0-255.
    pub tolerance: u32,
    /// Pixels tested before early rejection may fire.
    pub early_pixel_count: u32,
    /// Use the sparse sampled probe for exhaustive scans.
    pub random_pixel_test: bool,
    /// Lane width for the vectorized kernels.
    pub simd_width: SimdWidth,
    /// Publish cycle timing through the shared state.
    pub show_fps: bool,
    /// Feed accepted matches into the learning statistics.
    pub enable_learning: bool,
    /// Coarse-to-fine search instead of exhaustive scanning.
    pub use_pyramid_search: bool,
    /// Preferred capture backend.
    pub capture_backend: BackendPreference,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            click_on_match: false,
            double_click: false,
            tolerance: 10,
            early_pixel_count: 100,
            random_pixel_test: false,
            simd_width: SimdWidth::Lanes8,
            show_fps: true,
            enable_learning: true,
            use_pyramid_search: true,
            capture_backend: BackendPreference::Duplication,
        }
    }
}

impl Settings {
    /// Applies one key/value pair. Unknown keys and unparsable values are
    /// ignored; out-of-range values are clamped.
    pub fn apply_pair(&mut self, key: &str, value: &str) {
        match key {
            "ClickOnMatch" => {
                if let Some(v) = parse_bool(value) {
                    self.click_on_match = v;
                }
            }
            "DoubleClick" => {
                if let Some(v) = parse_bool(value) {
                    self.double_click = v;
                }
            }
            "Tolerance" => {
                if let Ok(v) = value.trim().parse::<i64>() {
                    self.tolerance = v.clamp(0, 255) as u32;
                }
            }
            "EarlyPixelCount" => {
                if let Ok(v) = value.trim().parse::<i64>() {
                    self.early_pixel_count = v.max(0) as u32;
                }
            }
            "RandomPixelTest" => {
                if let Some(v) = parse_bool(value) {
                    self.random_pixel_test = v;
                }
            }
            // Historical alias: the original knob toggled AVX2 (8 lanes)
            // against SSE2 (4 lanes).
            "UseAVX2" => {
                if let Some(v) = parse_bool(value) {
                    self.simd_width = if v { SimdWidth::Lanes8 } else { SimdWidth::Lanes4 };
                }
            }
            "SIMDWidth" => match value.trim() {
                "8" => self.simd_width = SimdWidth::Lanes8,
                "4" => self.simd_width = SimdWidth::Lanes4,
                _ => {}
            },
            "ShowFPS" => {
                if let Some(v) = parse_bool(value) {
                    self.show_fps = v;
                }
            }
            "EnableLearning" => {
                if let Some(v) = parse_bool(value) {
                    self.enable_learning = v;
                }
            }
            "UsePyramidSearch" => {
                if let Some(v) = parse_bool(value) {
                    self.use_pyramid_search = v;
                }
            }
            "UseCaptureBackend" => {
                if let Some(v) = parse_bool(value) {
                    self.capture_backend = if v {
                        BackendPreference::Duplication
                    } else {
                        BackendPreference::Blit
                    };
                }
            }
            _ => {}
        }
    }

    /// Applies a whole mapping; see [`Settings::apply_pair`].
    pub fn apply_pairs<'a>(&mut self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) {
        for (key, value) in pairs {
            self.apply_pair(key, value);
        }
    }

    /// Serializes the settings back into the flat key/value mapping.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let as_int = |b: bool| if b { "1" } else { "0" }.to_string();
        vec![
            ("ClickOnMatch".into(), as_int(self.click_on_match)),
            ("DoubleClick".into(), as_int(self.double_click)),
            ("Tolerance".into(), self.tolerance.to_string()),
            ("EarlyPixelCount".into(), self.early_pixel_count.to_string()),
            ("RandomPixelTest".into(), as_int(self.random_pixel_test)),
            (
                "SIMDWidth".into(),
                match self.simd_width {
                    SimdWidth::Lanes8 => "8",
                    SimdWidth::Lanes4 => "4",
                }
                .to_string(),
            ),
            ("ShowFPS".into(), as_int(self.show_fps)),
            ("EnableLearning".into(), as_int(self.enable_learning)),
            ("UsePyramidSearch".into(), as_int(self.use_pyramid_search)),
            (
                "UseCaptureBackend".into(),
                as_int(self.capture_backend == BackendPreference::Duplication),
            ),
        ]
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

//! In-memory display and backends.
//!
//! `SharedDisplay` stands in for the live display: an owned BGRA image behind
//! a lock, with a generation counter bumped on every update. The two backends
//! built on it mirror the production pair: a duplication-style primary that
//! retains a pitched staging copy and reports stale frames when no new
//! generation arrived, and a blit-style fallback that copies directly. Both
//! carry failure-injection hooks so the [`FrameSource`](super::FrameSource)
//! recovery paths are testable in isolation.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::image::{OwnedBgra, BYTES_PER_PIXEL};
use crate::util::CaptureError;

use super::staging::copy_rect;
use super::{CaptureBackend, CaptureRect, CaptureStatus};

struct DisplayInner {
    image: OwnedBgra,
    generation: u64,
}

/// Shared mutable stand-in for the display contents.
#[derive(Clone)]
pub struct SharedDisplay {
    inner: Arc<RwLock<DisplayInner>>,
}

impl SharedDisplay {
    /// Creates a display showing `image`.
    pub fn new(image: OwnedBgra) -> Self {
        Self {
            inner: Arc::new(RwLock::new(DisplayInner {
                image,
                generation: 1,
            })),
        }
    }

    /// Replaces the display contents, making the next capture fresh.
    pub fn present(&self, image: OwnedBgra) {
        let mut inner = self.inner.write();
        inner.image = image;
        inner.generation += 1;
    }

    /// Returns the display dimensions in pixels.
    pub fn size(&self) -> (usize, usize) {
        let inner = self.inner.read();
        (inner.image.width(), inner.image.height())
    }

    fn generation(&self) -> u64 {
        self.inner.read().generation
    }
}

/// Duplication-style primary backend with a retained, pitched staging buffer.
///
/// The staging row pitch exceeds the packed width to exercise pitch-aware
/// copies. When the display generation has not advanced since the previous
/// capture, the call reports [`CaptureStatus::Stale`] and serves pixels from
/// the retained staging buffer, matching the bounded acquisition-timeout
/// behavior of a real duplication backend.
pub struct DuplicationBackend {
    display: SharedDisplay,
    staging: Vec<u8>,
    pitch: usize,
    display_width: usize,
    display_height: usize,
    seen_generation: u64,
    initialized: bool,
    fail_init: bool,
    fail_next_capture: Option<CaptureError>,
}

/// Extra bytes appended to each staging row.
const STAGING_ROW_PAD: usize = 16;

impl DuplicationBackend {
    pub fn new(display: SharedDisplay) -> Self {
        Self {
            display,
            staging: Vec::new(),
            pitch: 0,
            display_width: 0,
            display_height: 0,
            seen_generation: 0,
            initialized: false,
            fail_init: false,
            fail_next_capture: None,
        }
    }

    /// Makes every subsequent `initialize` fail, for degradation tests.
    pub fn set_fail_init(&mut self, fail: bool) {
        self.fail_init = fail;
    }

    /// Makes the next `capture` call fail with `err` (frame-loss injection).
    pub fn fail_next_capture(&mut self, err: CaptureError) {
        self.fail_next_capture = Some(err);
    }

    fn refresh_staging(&mut self) {
        let inner = self.display.inner.read();
        let width = inner.image.width();
        let height = inner.image.height();
        let pitch = width * BYTES_PER_PIXEL + STAGING_ROW_PAD;

        if self.staging.len() != pitch * height {
            self.staging = vec![0u8; pitch * height];
        }
        for y in 0..height {
            let src = &inner.image.as_slice()[y * width * BYTES_PER_PIXEL..(y + 1) * width * BYTES_PER_PIXEL];
            self.staging[y * pitch..y * pitch + width * BYTES_PER_PIXEL].copy_from_slice(src);
        }
        self.pitch = pitch;
        self.display_width = width;
        self.display_height = height;
        self.seen_generation = inner.generation;
    }
}

impl CaptureBackend for DuplicationBackend {
    fn initialize(&mut self) -> Result<(), CaptureError> {
        if self.fail_init {
            return Err(CaptureError::BackendUnavailable);
        }
        self.refresh_staging();
        // The frame acquired during (re)initialization has not been served
        // yet; the first capture afterwards must report it as fresh.
        self.seen_generation = 0;
        self.initialized = true;
        Ok(())
    }

    fn capture(&mut self, rect: CaptureRect, out: &mut [u8]) -> Result<CaptureStatus, CaptureError> {
        if !self.initialized {
            return Err(CaptureError::BackendUnavailable);
        }
        if let Some(err) = self.fail_next_capture.take() {
            self.initialized = false;
            return Err(err);
        }

        let status = if self.display.generation() != self.seen_generation {
            self.refresh_staging();
            CaptureStatus::Fresh
        } else {
            CaptureStatus::Stale
        };

        copy_rect(
            &self.staging,
            self.display_width,
            self.display_height,
            self.pitch,
            rect,
            out,
        )?;
        Ok(status)
    }
}

/// Blit-style fallback backend: a blocking, always-available region copy.
pub struct BlitBackend {
    display: SharedDisplay,
    fail_next_capture: Option<CaptureError>,
}

impl BlitBackend {
    pub fn new(display: SharedDisplay) -> Self {
        Self {
            display,
            fail_next_capture: None,
        }
    }

    /// Makes the next `capture` call fail, for both-backends-down tests.
    pub fn fail_next_capture(&mut self, err: CaptureError) {
        self.fail_next_capture = Some(err);
    }
}

impl CaptureBackend for BlitBackend {
    fn initialize(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn capture(&mut self, rect: CaptureRect, out: &mut [u8]) -> Result<CaptureStatus, CaptureError> {
        if let Some(err) = self.fail_next_capture.take() {
            return Err(err);
        }
        let inner = self.display.inner.read();
        let width = inner.image.width();
        copy_rect(
            inner.image.as_slice(),
            width,
            inner.image.height(),
            width * BYTES_PER_PIXEL,
            rect,
            out,
        )?;
        Ok(CaptureStatus::Fresh)
    }
}

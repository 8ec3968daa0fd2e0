//! Frame acquisition with primary/fallback backends.
//!
//! A [`FrameSource`] pairs a preferred backend (modelled on full-display
//! duplication into a staging surface) with an always-available fallback
//! (a blocking region copy). Recovery is an explicit state machine instead of
//! implicit retry control flow:
//!
//! - `Uninitialized` --InitSuccess--> `Active`
//! - `Uninitialized` --InitFailure--> `Degraded`
//! - `Active` --FrameLost--> `Uninitialized` (one-shot reinit, fallback for
//!   the current call)
//! - `Active` --FrameTimeout--> `Active` (stale frame, not an error)
//!
//! In `Degraded` the source permanently prefers the fallback for the session.
//! A hard error surfaces only when both backends fail for a call.

use crate::trace::{trace_event, trace_span};
use crate::util::CaptureError;

pub mod memory;
pub mod staging;

/// Capture rectangle in absolute display coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureRect {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
}

impl CaptureRect {
    pub fn new(x: i32, y: i32, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Packed output length in bytes for this rectangle.
    pub fn byte_len(&self) -> usize {
        self.width * self.height * 4
    }
}

/// Whether a capture delivered a new frame or reused a retained one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureStatus {
    /// The buffer holds pixels from a newly acquired frame.
    Fresh,
    /// No new frame arrived within the acquisition window; the buffer holds
    /// the most recent successfully captured pixels. Known staleness window,
    /// not an error.
    Stale,
}

/// One capture backend.
///
/// `capture` fills `out` (packed BGRA, `rect.byte_len()` bytes, top-down
/// rows) and reports whether the pixels are fresh or stale.
pub trait CaptureBackend {
    /// Acquires whatever device or context the backend needs.
    fn initialize(&mut self) -> Result<(), CaptureError>;

    /// Captures `rect` into `out`.
    fn capture(&mut self, rect: CaptureRect, out: &mut [u8]) -> Result<CaptureStatus, CaptureError>;
}

/// Recovery state of the primary backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendState {
    /// Primary not yet initialized (or invalidated by a lost frame).
    Uninitialized,
    /// Primary healthy.
    Active,
    /// Primary failed to (re)initialize; fallback is preferred for the rest
    /// of the session.
    Degraded,
}

/// Frame source combining a primary backend with an always-available fallback.
pub struct FrameSource<P, F> {
    primary: P,
    fallback: F,
    state: BackendState,
    prefer_primary: bool,
}

impl<P: CaptureBackend, F: CaptureBackend> FrameSource<P, F> {
    /// Creates a source in the `Uninitialized` state.
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            state: BackendState::Uninitialized,
            prefer_primary: true,
        }
    }

    /// Returns the primary backend's recovery state.
    pub fn state(&self) -> BackendState {
        self.state
    }

    /// Mutable access to the primary backend, e.g. for failure injection.
    pub fn primary_mut(&mut self) -> &mut P {
        &mut self.primary
    }

    /// Mutable access to the fallback backend.
    pub fn fallback_mut(&mut self) -> &mut F {
        &mut self.fallback
    }

    /// Selects whether the primary backend is used at all.
    ///
    /// With `false` every capture goes straight to the fallback; the recovery
    /// state is left untouched so re-enabling resumes where it left off.
    pub fn set_prefer_primary(&mut self, prefer: bool) {
        self.prefer_primary = prefer;
    }

    /// Captures `rect` into `out`, falling back and recovering as needed.
    ///
    /// Fails only when the backend that ends up serving the call fails, i.e.
    /// when both backends are broken for this capture.
    pub fn capture(
        &mut self,
        rect: CaptureRect,
        out: &mut [u8],
    ) -> Result<CaptureStatus, CaptureError> {
        let _span = trace_span!("capture", w = rect.width, h = rect.height).entered();

        if !self.prefer_primary || self.state == BackendState::Degraded {
            return self.fallback.capture(rect, out);
        }

        if self.state == BackendState::Uninitialized {
            match self.primary.initialize() {
                Ok(()) => self.state = BackendState::Active,
                Err(_) => {
                    trace_event!("capture_degraded", reason = "init_failure");
                    self.state = BackendState::Degraded;
                    return self.fallback.capture(rect, out);
                }
            }
        }

        match self.primary.capture(rect, out) {
            Ok(status) => Ok(status),
            Err(_) => {
                // FrameLost (or any non-timeout failure): invalidate, attempt
                // a one-shot reinit, and serve this call from the fallback.
                trace_event!("capture_frame_lost");
                self.state = BackendState::Uninitialized;
                match self.primary.initialize() {
                    Ok(()) => self.state = BackendState::Active,
                    Err(_) => self.state = BackendState::Degraded,
                }
                self.fallback.capture(rect, out)
            }
        }
    }
}

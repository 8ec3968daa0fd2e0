//! Shared utility helpers.

pub mod error;

pub use error::{CaptureError, ScreenMatchError, ScreenMatchResult};

//! Error types for screenmatch.

use thiserror::Error;

/// Result alias for screenmatch operations.
pub type ScreenMatchResult<T> = std::result::Result<T, ScreenMatchError>;

/// Errors that can occur when running screenmatch operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScreenMatchError {
    /// Width or height is zero or overflows the addressable range.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than a packed row.
    #[error("invalid stride: {stride} bytes for width {width}px")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is too small for the described view.
    #[error("buffer too small: needed {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Requested sub-rectangle does not fit in the image.
    #[error("roi out of bounds: ({x},{y}) {width}x{height} in {img_width}x{img_height}")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Index into a collection is out of range.
    #[error("index {index} out of bounds for {context} of length {len}")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// Template does not match the bank's uniform side length.
    #[error("template side {got} does not match bank side {expected}")]
    TemplateSideMismatch { expected: usize, got: usize },
    /// Template pixel buffer is not side*side*4 bytes.
    #[error("template buffer holds {got} bytes, side {side} needs {needed}")]
    TemplateBufferMismatch {
        side: usize,
        needed: usize,
        got: usize,
    },
    /// Region is too small to contain a template.
    #[error("region {width}x{height} is smaller than template side {side}")]
    RegionTooSmall {
        width: usize,
        height: usize,
        side: usize,
    },
    /// Both capture backends failed for a region.
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),
    /// Cycle runner is in the wrong state for the requested transition.
    #[error("runner state: {0}")]
    RunnerState(&'static str),
    /// Decoding or reading an image file failed.
    #[cfg(feature = "image-io")]
    #[error("image io failed: {reason}")]
    ImageIo { reason: String },
}

/// Capture-layer failures, absorbed into degraded-mode continuation where
/// possible and surfaced only when both backends fail.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum CaptureError {
    /// Backend device or context creation failed.
    #[error("capture backend unavailable")]
    BackendUnavailable,
    /// Underlying capture resource was invalidated mid-session.
    #[error("capture resource lost")]
    ResourceLost,
    /// Requested rectangle falls outside the backend's display bounds.
    #[error("capture rect out of display bounds")]
    RectOutOfBounds,
    /// Backend-specific failure that fallback cannot recover.
    #[error("capture failed: {0}")]
    Backend(&'static str),
}

//! Pitch-aware copies out of a staging surface.
//!
//! A mapped staging surface reports a row pitch that may exceed the packed
//! row width, so sub-rectangle extraction must walk row by row instead of
//! assuming a contiguous buffer.

use crate::image::{BgraView, BYTES_PER_PIXEL};
use crate::util::CaptureError;

use super::CaptureRect;

/// Copies `rect` out of a full-display staging buffer into packed `out`.
///
/// `pitch` is the staging surface's row stride in bytes. `out` must hold
/// `rect.byte_len()` bytes; rows are written top-down.
pub fn copy_rect(
    staging: &[u8],
    display_width: usize,
    display_height: usize,
    pitch: usize,
    rect: CaptureRect,
    out: &mut [u8],
) -> Result<(), CaptureError> {
    if rect.x < 0 || rect.y < 0 {
        return Err(CaptureError::RectOutOfBounds);
    }
    let x = rect.x as usize;
    let y = rect.y as usize;
    if x + rect.width > display_width || y + rect.height > display_height {
        return Err(CaptureError::RectOutOfBounds);
    }
    if out.len() != rect.byte_len() {
        return Err(CaptureError::Backend("output buffer length mismatch"));
    }

    let view = BgraView::new(staging, display_width, display_height, pitch)
        .map_err(|_| CaptureError::Backend("staging buffer smaller than display"))?;
    let roi = view
        .roi(x, y, rect.width, rect.height)
        .map_err(|_| CaptureError::RectOutOfBounds)?;

    let row_bytes = rect.width * BYTES_PER_PIXEL;
    for row in 0..rect.height {
        let src = roi
            .row(row)
            .ok_or(CaptureError::Backend("staging row out of range"))?;
        out[row * row_bytes..(row + 1) * row_bytes].copy_from_slice(src);
    }
    Ok(())
}

//! Half-resolution downsampling for BGRA images.
//!
//! Downsampling averages 2x2 pixel blocks per channel with truncating integer
//! division: `dst = (a + b + c + d) / 4`. Odd source dimensions floor to
//! `src / 2`; the trailing row or column is ignored rather than folded into a
//! partial block, keeping every output pixel the average of a full block.

use crate::image::{BgraView, OwnedBgra, BYTES_PER_PIXEL};
use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Produces a half-resolution copy of `src` by 2x2 block averaging.
///
/// Source dimensions below 2x2 have no complete block and are rejected.
pub fn half_resolution(src: BgraView<'_>) -> ScreenMatchResult<OwnedBgra> {
    let dst_width = src.width() / 2;
    let dst_height = src.height() / 2;
    if dst_width == 0 || dst_height == 0 {
        return Err(ScreenMatchError::InvalidDimensions {
            width: src.width(),
            height: src.height(),
        });
    }

    let mut dst = vec![0u8; dst_width * dst_height * BYTES_PER_PIXEL];
    for y in 0..dst_height {
        let row0 = src.row(y * 2).ok_or(ScreenMatchError::BufferTooSmall {
            needed: (y * 2 + 1) * src.stride(),
            got: src.as_slice().len(),
        })?;
        let row1 = src.row(y * 2 + 1).ok_or(ScreenMatchError::BufferTooSmall {
            needed: (y * 2 + 2) * src.stride(),
            got: src.as_slice().len(),
        })?;

        let dst_row = &mut dst[y * dst_width * BYTES_PER_PIXEL..(y + 1) * dst_width * BYTES_PER_PIXEL];
        for x in 0..dst_width {
            let left = x * 2 * BYTES_PER_PIXEL;
            let right = left + BYTES_PER_PIXEL;
            for c in 0..BYTES_PER_PIXEL {
                let sum = u16::from(row0[left + c])
                    + u16::from(row0[right + c])
                    + u16::from(row1[left + c])
                    + u16::from(row1[right + c]);
                dst_row[x * BYTES_PER_PIXEL + c] = (sum / 4) as u8;
            }
        }
    }

    OwnedBgra::from_vec(dst, dst_width, dst_height)
}

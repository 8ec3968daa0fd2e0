//! BGRA pixel views and owned buffers.
//!
//! `BgraView` is a borrowed 2D view into a byte buffer holding 4-byte BGRA
//! pixels with an explicit row stride. The stride counts bytes between the
//! starts of consecutive rows, so a stride larger than `width * 4` represents
//! padded rows (e.g. a mapped staging surface). ROI slices are zero-copy views
//! into the same backing slice and retain the original stride.

use crate::util::{ScreenMatchError, ScreenMatchResult};

pub mod downsample;
#[cfg(feature = "image-io")]
pub mod io;

/// Bytes per BGRA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Borrowed 2D BGRA view with an explicit byte stride.
#[derive(Copy, Clone)]
pub struct BgraView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> BgraView<'a> {
    /// Creates a packed view with `stride == width * 4`.
    pub fn from_slice(data: &'a [u8], width: usize, height: usize) -> ScreenMatchResult<Self> {
        Self::new(data, width, height, width * BYTES_PER_PIXEL)
    }

    /// Creates a view with an explicit byte stride.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> ScreenMatchResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(ScreenMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in bytes between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the 4 channel bytes of the pixel at `(x, y)` if in bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&'a [u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = y
            .checked_mul(self.stride)?
            .checked_add(x * BYTES_PER_PIXEL)?;
        self.data.get(start..start + BYTES_PER_PIXEL)
    }

    /// Returns the packed bytes for row `y`, `width * 4` long.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * BYTES_PER_PIXEL)?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> ScreenMatchResult<BgraView<'a>> {
        if width == 0 || height == 0 {
            return Err(ScreenMatchError::InvalidDimensions { width, height });
        }

        let img_width = self.width;
        let img_height = self.height;
        let oob = ScreenMatchError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width,
            img_height,
        };
        let end_x = match x.checked_add(width) {
            Some(v) => v,
            None => return Err(oob),
        };
        let end_y = match y.checked_add(height) {
            Some(v) => v,
            None => return Err(oob),
        };
        if end_x > img_width || end_y > img_height {
            return Err(oob);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x * BYTES_PER_PIXEL))
            .ok_or(ScreenMatchError::InvalidDimensions {
                width: img_width,
                height: img_height,
            })?;
        let data = self
            .data
            .get(start..)
            .ok_or(ScreenMatchError::BufferTooSmall {
                needed: start.saturating_add(1),
                got: self.data.len(),
            })?;

        BgraView::new(data, width, height, self.stride)
    }

    /// Copies the view into a packed owned buffer, dropping row padding.
    pub fn to_owned_bgra(&self) -> ScreenMatchResult<OwnedBgra> {
        let mut data = Vec::with_capacity(self.width * self.height * BYTES_PER_PIXEL);
        for y in 0..self.height {
            let row = self.row(y).ok_or(ScreenMatchError::BufferTooSmall {
                needed: (y + 1) * self.stride,
                got: self.data.len(),
            })?;
            data.extend_from_slice(row);
        }
        OwnedBgra::from_vec(data, self.width, self.height)
    }
}

/// Owned packed BGRA image buffer.
#[derive(Clone)]
pub struct OwnedBgra {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedBgra {
    /// Wraps a packed BGRA buffer of exactly `width * height * 4` bytes.
    pub fn from_vec(data: Vec<u8>, width: usize, height: usize) -> ScreenMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(ScreenMatchError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(BYTES_PER_PIXEL))
            .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(ScreenMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Allocates a zero-filled image.
    pub fn zeroed(width: usize, height: usize) -> ScreenMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(ScreenMatchError::InvalidDimensions { width, height });
        }
        let len = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(BYTES_PER_PIXEL))
            .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;
        Ok(Self {
            data: vec![0u8; len],
            width,
            height,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the packed pixel bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns the packed pixel bytes mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> BgraView<'_> {
        BgraView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width * BYTES_PER_PIXEL,
        }
    }

    /// Consumes the image and returns the packed buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> ScreenMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(ScreenMatchError::InvalidDimensions { width, height });
    }
    let row_bytes = width
        .checked_mul(BYTES_PER_PIXEL)
        .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;
    if stride < row_bytes {
        return Err(ScreenMatchError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_bytes))
        .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;
    Ok(needed)
}

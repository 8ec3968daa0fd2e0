//! Convenience helpers for loading templates via the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Decoded pixels are
//! converted to the packed BGRA layout the kernels expect.

use std::path::Path;

use crate::image::OwnedBgra;
use crate::template::Template;
use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Converts a decoded RGBA buffer to packed BGRA.
pub fn owned_from_rgba_image(img: &image::RgbaImage) -> ScreenMatchResult<OwnedBgra> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let mut data = Vec::with_capacity(width * height * 4);
    for px in img.pixels() {
        let [r, g, b, a] = px.0;
        data.extend_from_slice(&[b, g, r, a]);
    }
    OwnedBgra::from_vec(data, width, height)
}

/// Loads an image from disk as packed BGRA.
pub fn load_bgra_image<P: AsRef<Path>>(path: P) -> ScreenMatchResult<OwnedBgra> {
    let img = image::open(path).map_err(|err| ScreenMatchError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_rgba_image(&img.to_rgba8())
}

/// Loads a square template image from disk.
///
/// The file stem becomes the template name. Non-square images are rejected
/// because kernels assume side-by-side templates.
pub fn load_template<P: AsRef<Path>>(path: P) -> ScreenMatchResult<Template> {
    let path = path.as_ref();
    let bgra = load_bgra_image(path)?;
    let (width, height) = (bgra.width(), bgra.height());
    if width != height {
        return Err(ScreenMatchError::TemplateBufferMismatch {
            side: width,
            needed: width * width * 4,
            got: width * height * 4,
        });
    }
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("template")
        .to_owned();
    Template::new(bgra.into_vec(), width, name)
}

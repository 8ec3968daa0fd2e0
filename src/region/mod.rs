//! Search regions on the display.

use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Axis-aligned search rectangle in absolute display coordinates.
///
/// Regions are independent and may overlap. Both dimensions must be at least
/// the template side so a template fits at one placement; the engine rejects
/// anything smaller before scanning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRegion {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
    pub name: String,
    pub active: bool,
}

impl SearchRegion {
    /// Creates an active region.
    pub fn new(x: i32, y: i32, width: usize, height: usize, name: impl Into<String>) -> Self {
        Self {
            x,
            y,
            width,
            height,
            name: name.into(),
            active: true,
        }
    }

    /// Validates that a template of `side` pixels fits inside the region.
    pub fn check_fits(&self, side: usize) -> ScreenMatchResult<()> {
        if self.width < side || self.height < side {
            return Err(ScreenMatchError::RegionTooSmall {
                width: self.width,
                height: self.height,
                side,
            });
        }
        Ok(())
    }
}

//! Search strategies for locating template placements inside a frame.
//!
//! [`exhaustive`] evaluates every valid placement at full resolution;
//! [`pyramid`] shortlists candidates at half resolution first and verifies
//! only those with the full kernel.

pub mod exhaustive;
pub mod pyramid;

/// Best placement found by a search, in frame-local pixel coordinates.
///
/// `(x, y)` is the top-left corner of the template window; the score is the
/// verified full-resolution score at that placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: usize,
    pub y: usize,
    pub score: f32,
}

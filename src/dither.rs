//! Screen-door transparency: fragments of partially faded draws are dropped
//! against a fixed spatial threshold pattern instead of being blended.

use glam::Vec2;

use crate::noise::fract;

const PATTERN_AXIS: Vec2 = Vec2::new(171.0, 231.0);
const PATTERN_PERIOD: f32 = 71.0;

/// Threshold in [0, 1) for the pixel at `frag_coord`.
pub fn dither_threshold(frag_coord: Vec2) -> f32 {
    fract(PATTERN_AXIS.dot(frag_coord) / PATTERN_PERIOD)
}

/// Whether the fragment at `frag_coord` is dropped for a draw with `opacity`.
///
/// Opaque draws never discard; an opacity below zero discards everything.
pub fn should_discard(frag_coord: Vec2, opacity: f32) -> bool {
    if opacity >= 1.0 {
        return false;
    }
    dither_threshold(frag_coord) > opacity
}

//! Scene-linear HDR to display color: filmic curve, then gamma encode.

use glam::Vec3;

pub const DISPLAY_GAMMA: f32 = 2.2;

/// Filmic (ACES fitted) curve, applied per component and clamped to [0, 1].
pub fn tonemap(hdr: Vec3) -> Vec3 {
    const A: f32 = 2.51;
    const B: f32 = 0.03;
    const C: f32 = 2.43;
    const D: f32 = 0.59;
    const E: f32 = 0.14;
    let mapped = (hdr * (hdr * A + B)) / (hdr * (hdr * C + D) + E);
    mapped.clamp(Vec3::ZERO, Vec3::ONE)
}

pub fn gamma_encode(linear: Vec3, gamma: f32) -> Vec3 {
    linear.powf(1.0 / gamma)
}

/// Tonemaps in linear light and only then encodes for display.
pub fn tonemap_and_encode(hdr: Vec3, gamma: f32) -> Vec3 {
    gamma_encode(tonemap(hdr), gamma)
}

/// Quantizes a display color to 8-bit channels.
pub fn to_rgb8(color: Vec3) -> [u8; 3] {
    let scaled = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    [scaled.x as u8, scaled.y as u8, scaled.z as u8]
}

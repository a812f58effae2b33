//! Distance fog with a squared exponential falloff.

use glam::Vec3;

use crate::lighting::{mix, SKY_COLOR};

/// Fog density per world unit. Tuned for planets a few hundred units across.
pub const FOG_DENSITY: f32 = 0.0015;
pub const FOG_HORIZON_TINT: Vec3 = Vec3::new(0.7, 0.8, 0.9);
pub const FOG_TINT_MIX: f32 = 0.2;

/// Fraction of fog color at `distance`, in [0, 1].
pub fn fog_factor(distance: f32, density: f32) -> f32 {
    let d = distance * density;
    (1.0 - (-d * d * 0.5).exp()).clamp(0.0, 1.0)
}

/// Horizon colour the scene fades into.
pub fn fog_color(sky_color: Vec3, horizon_tint: Vec3, tint_mix: f32) -> Vec3 {
    mix(sky_color * 0.8, horizon_tint, tint_mix)
}

/// Blends `lit_color` towards `fog` by the camera distance to `world_pos`.
pub fn apply_fog(camera_pos: Vec3, world_pos: Vec3, lit_color: Vec3, fog: Vec3, density: f32) -> Vec3 {
    let factor = fog_factor(camera_pos.distance(world_pos), density);
    mix(lit_color, fog, factor)
}

/// Fog color for the built-in palette.
pub fn default_fog_color() -> Vec3 {
    fog_color(SKY_COLOR, FOG_HORIZON_TINT, FOG_TINT_MIX)
}

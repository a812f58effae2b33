//! Linear-light surface shading: sun, hemispheric ambient and Fresnel rim.

use glam::Vec3;

use crate::config::ShadingConfig;
use crate::noise::detail_noise;

pub const SUN_COLOR: Vec3 = Vec3::new(1.6, 1.5, 1.3);
pub const SKY_COLOR: Vec3 = Vec3::new(0.35, 0.5, 0.75);
pub const GROUND_COLOR: Vec3 = Vec3::new(0.15, 0.12, 0.1);

/// Fraction of light removed at zero visibility.
pub const SHADOW_STRENGTH: f32 = 0.85;
pub const DETAIL_NOISE_STRENGTH: f32 = 0.03;
pub const RIM_STRENGTH: f32 = 0.2;
pub const FRESNEL_POWER: f32 = 3.0;

/// Surface attributes going into [`shade_surface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub world_pos: Vec3,
    /// Unit length.
    pub normal: Vec3,
    /// Unit vector from the surface towards the camera.
    pub view_dir: Vec3,
    /// Gamma encoded vertex color.
    pub color: Vec3,
}

/// Combines every lighting term into unclamped linear HDR color.
pub fn shade_surface(
    config: &ShadingConfig,
    surface: &SurfacePoint,
    sun_dir: Vec3,
    shadow_raw: f32,
) -> Vec3 {
    let normal = surface.normal;
    let noise = detail_noise(surface.world_pos, normal, config.triplanar_sharpness);
    let albedo = degamma(surface.color, config.gamma) * (1.0 + config.detail_noise_strength * noise);

    let shadow = shadow_term(shadow_raw, config.shadow_strength);
    let direct = direct_light(config.sun_color, n_dot_l(normal, sun_dir), shadow);
    let ambient = hemispheric_ambient(
        config.ground_color,
        config.sky_color,
        hemisphere_factor(normal, surface.world_pos),
    );
    let rim = config.sky_color
        * fresnel(normal, surface.view_dir, config.fresnel_power)
        * config.rim_strength
        * shadow;

    albedo * (direct + ambient + rim)
}

/// Decodes gamma encoded color to linear light.
pub fn degamma(color: Vec3, gamma: f32) -> Vec3 {
    color.powf(gamma)
}

pub fn n_dot_l(normal: Vec3, sun_dir: Vec3) -> f32 {
    normal.dot(sun_dir).max(0.0)
}

/// Remaps raw visibility so fully shadowed surfaces keep `1 - strength` of
/// their light.
pub fn shadow_term(shadow_raw: f32, strength: f32) -> f32 {
    mix_f32(1.0 - strength, 1.0, shadow_raw)
}

pub fn direct_light(sun_color: Vec3, n_dot_l: f32, shadow: f32) -> Vec3 {
    sun_color * n_dot_l * shadow
}

/// Alignment of the normal with the local "up", remapped to [0, 1].
///
/// Up is the direction from the planet centre, which sits at the world
/// origin.
pub fn hemisphere_factor(normal: Vec3, world_pos: Vec3) -> f32 {
    normal.dot(world_pos.normalize()) * 0.5 + 0.5
}

pub fn hemispheric_ambient(ground: Vec3, sky: Vec3, hemi: f32) -> Vec3 {
    mix(ground, sky, hemi)
}

pub fn fresnel(normal: Vec3, view_dir: Vec3, power: f32) -> f32 {
    (1.0 - normal.dot(view_dir).max(0.0)).powf(power)
}

/// `a * (1 - t) + b * t`; exact at both ends.
pub fn mix(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a * (1.0 - t) + b * t
}

fn mix_f32(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

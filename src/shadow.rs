//! Shadow map queries: bounds cull, slope scaled bias and a 3x3 weighted
//! percentage-closer filter over a depth comparison sampler.

use glam::{UVec2, Vec2, Vec3};
use log::debug;

use crate::error::ShadowMapError;

pub const BIAS_SLOPE: f32 = 0.0005;
pub const BIAS_MIN: f32 = 0.0001;
/// Gaussian falloff of the filter tap weights, `exp(-(x² + y²) * falloff)`.
pub const FILTER_FALLOFF: f32 = 1.5;

/// Offsets, in texels, of the nine comparison taps.
const TAP_OFFSETS: [Vec2; 9] = [
    Vec2::new(-1.0, -1.0),
    Vec2::new(0.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 1.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
];

/// A depth texture bound together with a comparison sampler.
pub trait ShadowMap: Sync {
    /// Size of one texel in texture coordinates.
    fn texel_size(&self) -> Vec2;

    /// Returns the filtered result of `depth_ref <= stored depth` around `uv`,
    /// 1.0 meaning lit.
    fn sample_compare(&self, uv: Vec2, depth_ref: f32) -> f32;
}

/// Bias and filter parameters for [`fetch_shadow`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowFilter {
    pub bias_slope: f32,
    pub bias_min: f32,
    pub falloff: f32,
}

impl Default for ShadowFilter {
    fn default() -> Self {
        Self {
            bias_slope: BIAS_SLOPE,
            bias_min: BIAS_MIN,
            falloff: FILTER_FALLOFF,
        }
    }
}

/// Resolves sun visibility in [0, 1] for a shadow space position.
///
/// Positions outside the light frustum (xy outside [0, 1] or z > 1) are
/// treated as lit.
pub fn fetch_shadow<M>(map: &M, shadow_pos: Vec3, n_dot_l: f32, filter: &ShadowFilter) -> f32
where
    M: ShadowMap + ?Sized,
{
    if outside_light_frustum(shadow_pos) {
        return 1.0;
    }
    let bias = slope_scaled_bias(n_dot_l, filter.bias_slope, filter.bias_min);
    filtered_visibility(map, shadow_pos.truncate(), shadow_pos.z - bias, filter.falloff)
}

pub fn outside_light_frustum(shadow_pos: Vec3) -> bool {
    shadow_pos.z > 1.0
        || shadow_pos.x < 0.0
        || shadow_pos.x > 1.0
        || shadow_pos.y < 0.0
        || shadow_pos.y > 1.0
}

/// Depth bias growing as the surface turns away from the light.
pub fn slope_scaled_bias(n_dot_l: f32, slope: f32, min: f32) -> f32 {
    (slope * (1.0 - n_dot_l)).max(min)
}

pub fn tap_weight(offset: Vec2, falloff: f32) -> f32 {
    (-offset.length_squared() * falloff).exp()
}

/// Weighted average of the nine comparison taps around `uv`.
pub fn filtered_visibility<M>(map: &M, uv: Vec2, compared_depth: f32, falloff: f32) -> f32
where
    M: ShadowMap + ?Sized,
{
    let texel = map.texel_size();
    let mut visibility = 0.0;
    let mut total_weight = 0.0;
    for offset in TAP_OFFSETS {
        let weight = tap_weight(offset, falloff);
        visibility += weight * map.sample_compare(uv + offset * texel, compared_depth);
        total_weight += weight;
    }
    visibility / total_weight
}

/// CPU side depth texture sampled like a `LessEqual` comparison sampler with
/// linear filtering and clamp-to-edge addressing.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthShadowMap {
    size: UVec2,
    depths: Vec<f32>,
}

impl DepthShadowMap {
    /// Wraps row-major depths, row 0 being `v == 0`.
    pub fn new(width: u32, height: u32, depths: Vec<f32>) -> Result<Self, ShadowMapError> {
        if width == 0 || height == 0 {
            return Err(ShadowMapError::Empty { width, height });
        }
        let expected = width as usize * height as usize;
        if depths.len() != expected {
            return Err(ShadowMapError::SizeMismatch {
                expected,
                actual: depths.len(),
            });
        }
        if let Some(index) = depths.iter().position(|depth| !depth.is_finite()) {
            return Err(ShadowMapError::NonFiniteDepth { index });
        }
        debug!("created {width}x{height} shadow map");
        Ok(Self {
            size: UVec2::new(width, height),
            depths,
        })
    }

    /// A map cleared to the far plane, so every lookup is lit.
    pub fn cleared(width: u32, height: u32) -> Result<Self, ShadowMapError> {
        Self::new(width, height, vec![1.0; width as usize * height as usize])
    }

    /// Builds a map by evaluating `depth_at(x, y)` for every texel.
    pub fn from_fn<F>(width: u32, height: u32, mut depth_at: F) -> Result<Self, ShadowMapError>
    where
        F: FnMut(u32, u32) -> f32,
    {
        let mut depths = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                depths.push(depth_at(x, y));
            }
        }
        Self::new(width, height, depths)
    }

    pub fn width(&self) -> u32 {
        self.size.x
    }

    pub fn height(&self) -> u32 {
        self.size.y
    }

    /// Stored depth at a texel, clamped to the edge.
    pub fn depth(&self, x: i64, y: i64) -> f32 {
        let x = x.clamp(0, self.size.x as i64 - 1) as usize;
        let y = y.clamp(0, self.size.y as i64 - 1) as usize;
        self.depths[y * self.size.x as usize + x]
    }

    fn compare(&self, x: i64, y: i64, depth_ref: f32) -> f32 {
        if depth_ref <= self.depth(x, y) {
            1.0
        } else {
            0.0
        }
    }
}

impl ShadowMap for DepthShadowMap {
    fn texel_size(&self) -> Vec2 {
        Vec2::ONE / self.size.as_vec2()
    }

    fn sample_compare(&self, uv: Vec2, depth_ref: f32) -> f32 {
        let texel = uv * self.size.as_vec2() - Vec2::splat(0.5);
        let base = texel.floor();
        let frac = texel - base;
        let (x, y) = (base.x as i64, base.y as i64);

        let top = lerp(
            self.compare(x, y, depth_ref),
            self.compare(x + 1, y, depth_ref),
            frac.x,
        );
        let bottom = lerp(
            self.compare(x, y + 1, depth_ref),
            self.compare(x + 1, y + 1, depth_ref),
            frac.x,
        );
        lerp(top, bottom, frac.y)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Left half occluded at depth 0.5, right half empty.
    fn split_map() -> DepthShadowMap {
        DepthShadowMap::from_fn(16, 16, |x, _| if x < 8 { 0.5 } else { 1.0 }).unwrap()
    }

    #[test]
    fn outside_the_frustum_is_fully_lit() {
        let map = DepthShadowMap::new(2, 2, vec![0.0; 4]).unwrap();
        let filter = ShadowFilter::default();
        for pos in [
            Vec3::new(-0.01, 0.5, 0.5),
            Vec3::new(1.01, 0.5, 0.5),
            Vec3::new(0.5, -0.2, 0.5),
            Vec3::new(0.5, 1.5, 0.5),
            Vec3::new(0.5, 0.5, 1.01),
        ] {
            assert_eq!(fetch_shadow(&map, pos, 1.0, &filter), 1.0);
        }
    }

    #[test]
    fn visibility_stays_in_unit_range() {
        let map = split_map();
        let filter = ShadowFilter::default();
        for i in 0..=20 {
            for z in [0.0, 0.25, 0.5, 0.75, 1.0] {
                let pos = Vec3::new(i as f32 / 20.0, 0.5, z);
                let visibility = fetch_shadow(&map, pos, 0.3, &filter);
                assert!((0.0..=1.0).contains(&visibility), "{visibility} at {pos}");
            }
        }
    }

    #[test]
    fn occluded_and_open_regions() {
        let map = split_map();
        let filter = ShadowFilter::default();
        assert_eq!(fetch_shadow(&map, Vec3::new(0.2, 0.5, 0.9), 1.0, &filter), 0.0);
        assert_eq!(fetch_shadow(&map, Vec3::new(0.8, 0.5, 0.9), 1.0, &filter), 1.0);
    }

    #[test]
    fn edge_is_filtered_between_lit_and_shadowed() {
        let map = split_map();
        let visibility = filtered_visibility(&map, Vec2::new(0.5, 0.5), 0.9, FILTER_FALLOFF);
        assert!(visibility > 0.0 && visibility < 1.0);
    }

    #[test]
    fn visibility_does_not_decrease_as_compared_depth_decreases() {
        let map = DepthShadowMap::from_fn(8, 8, |x, y| 0.1 + 0.1 * ((x + y) % 9) as f32).unwrap();
        let uv = Vec2::new(0.43, 0.61);
        let mut previous = 0.0;
        for step in (0..=100).rev() {
            let depth = step as f32 / 100.0;
            let visibility = filtered_visibility(&map, uv, depth, FILTER_FALLOFF);
            assert!(visibility + 1e-6 >= previous, "{visibility} < {previous} at {depth}");
            previous = visibility;
        }
        assert_eq!(previous, 1.0);
    }

    #[test]
    fn bias_grows_at_grazing_angles_with_a_floor() {
        assert_eq!(slope_scaled_bias(1.0, BIAS_SLOPE, BIAS_MIN), BIAS_MIN);
        assert!((slope_scaled_bias(0.0, BIAS_SLOPE, BIAS_MIN) - 0.0005).abs() < 1e-9);
        assert!(slope_scaled_bias(0.2, BIAS_SLOPE, BIAS_MIN) > slope_scaled_bias(0.6, BIAS_SLOPE, BIAS_MIN));
    }

    #[test]
    fn bias_is_subtracted_and_shrinks_towards_the_light() {
        let map = DepthShadowMap::new(4, 4, vec![0.5; 16]).unwrap();
        let filter = ShadowFilter::default();
        let pos = Vec3::new(0.5, 0.5, 0.5004);
        // Grazing: 0.5004 - 0.0005 lands in front of the occluder.
        assert_eq!(fetch_shadow(&map, pos, 0.0, &filter), 1.0);
        // Facing the sun: 0.5004 - 0.0001 stays behind it.
        assert_eq!(fetch_shadow(&map, pos, 1.0, &filter), 0.0);
    }

    #[test]
    fn centre_tap_dominates_the_kernel() {
        let centre = tap_weight(Vec2::ZERO, FILTER_FALLOFF);
        let side = tap_weight(Vec2::X, FILTER_FALLOFF);
        let corner = tap_weight(Vec2::ONE, FILTER_FALLOFF);
        assert_eq!(centre, 1.0);
        assert!((side - (-1.5f32).exp()).abs() < 1e-6);
        assert!((corner - (-3.0f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn fetch_is_deterministic() {
        let map = split_map();
        let filter = ShadowFilter::default();
        let pos = Vec3::new(0.49, 0.3, 0.7);
        assert_eq!(fetch_shadow(&map, pos, 0.4, &filter), fetch_shadow(&map, pos, 0.4, &filter));
    }

    #[test]
    fn construction_rejects_bad_input() {
        assert_eq!(
            DepthShadowMap::new(0, 4, vec![]),
            Err(ShadowMapError::Empty { width: 0, height: 4 })
        );
        assert_eq!(
            DepthShadowMap::new(2, 2, vec![1.0; 3]),
            Err(ShadowMapError::SizeMismatch { expected: 4, actual: 3 })
        );
        assert_eq!(
            DepthShadowMap::new(1, 2, vec![1.0, f32::NAN]),
            Err(ShadowMapError::NonFiniteDepth { index: 1 })
        );
    }

    #[test]
    fn cleared_map_is_lit_everywhere() {
        let map = DepthShadowMap::cleared(4, 4).unwrap();
        assert_eq!(map.sample_compare(Vec2::new(0.3, 0.9), 0.999), 1.0);
        assert_eq!(map.texel_size(), Vec2::splat(0.25));
    }
}

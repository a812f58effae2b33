//! Procedural triplanar detail noise used to break up flat vertex colors.

use glam::{Vec2, Vec3};

/// Exponent applied to the absolute normal when weighting the three planes.
pub const TRIPLANAR_SHARPNESS: f32 = 16.0;

/// Sine-dot-fract hash, returns a value in [0, 1).
pub fn hash2(p: Vec2) -> f32 {
    fract((p.dot(Vec2::new(12.9898, 78.233))).sin() * 43758.5453)
}

/// Per-axis plane weights, normalized to sum to one.
///
/// A steep exponent selects the dominant axis almost exclusively while still
/// blending smoothly across plane boundaries.
pub fn triplanar_weights(normal: Vec3, sharpness: f32) -> Vec3 {
    let n = normal.abs();
    let weights = Vec3::new(n.x.powf(sharpness), n.y.powf(sharpness), n.z.powf(sharpness));
    weights / (weights.x + weights.y + weights.z)
}

/// Detail noise in [-1, 1] for a surface point.
///
/// `normal` must be unit length (or at least non-zero).
pub fn detail_noise(position: Vec3, normal: Vec3, sharpness: f32) -> f32 {
    let weights = triplanar_weights(normal, sharpness);
    let x_plane = hash2(Vec2::new(position.y, position.z));
    let y_plane = hash2(Vec2::new(position.x, position.z));
    let z_plane = hash2(Vec2::new(position.x, position.y));
    let blended = x_plane * weights.x + y_plane * weights.y + z_plane * weights.z;
    blended * 2.0 - 1.0
}

pub(crate) fn fract(x: f32) -> f32 {
    x - x.floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_in_unit_interval() {
        for i in -50..50 {
            for j in -50..50 {
                let h = hash2(Vec2::new(i as f32 * 0.37, j as f32 * 1.91));
                assert!((0.0..1.0).contains(&h), "{h}");
            }
        }
    }

    #[test]
    fn dominant_axis_takes_nearly_all_weight() {
        let weights = triplanar_weights(Vec3::new(0.2, 0.97, 0.1).normalize(), TRIPLANAR_SHARPNESS);
        assert!(weights.y > 0.999);
        assert!(((weights.x + weights.y + weights.z) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn diagonal_normal_splits_weight_evenly() {
        let weights = triplanar_weights(Vec3::ONE.normalize(), TRIPLANAR_SHARPNESS);
        for w in weights.to_array() {
            assert!((w - 1.0 / 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn noise_is_signed_unit_range_and_deterministic() {
        let normal = Vec3::new(0.3, -0.8, 0.52).normalize();
        for i in 0..200 {
            let p = Vec3::new(i as f32 * 0.71, 13.0 - i as f32 * 0.29, i as f32 * 1.3);
            let n = detail_noise(p, normal, TRIPLANAR_SHARPNESS);
            assert!((-1.0..=1.0).contains(&n), "{n}");
            assert_eq!(n, detail_noise(p, normal, TRIPLANAR_SHARPNESS));
        }
    }

    #[test]
    fn axis_aligned_normal_uses_only_its_plane() {
        let p = Vec3::new(4.25, 7.5, -2.0);
        let expected = hash2(Vec2::new(p.x, p.z)) * 2.0 - 1.0;
        assert_eq!(detail_noise(p, Vec3::Y, TRIPLANAR_SHARPNESS), expected);
    }
}

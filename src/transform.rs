//! Geometry transform stage: object space to world, clip and shadow space.

use glam::{Mat3, Mat4, Vec3, Vec4};

use crate::frame::{GlobalFrameState, PerDrawState, VertexAttributes, VertexOutput};

/// World units the shadow lookup position is pushed along the surface normal.
pub const NORMAL_OFFSET: f32 = 0.05;

/// Runs the vertex stage for one vertex.
pub fn transform_vertex(
    vertex: &VertexAttributes,
    frame: &GlobalFrameState,
    draw: &PerDrawState,
    normal_offset: f32,
) -> VertexOutput {
    let world = draw.model * vertex.position.extend(1.0);
    let world_pos = world.truncate();
    let world_normal = world_normal(&draw.model, vertex.normal);

    VertexOutput {
        clip_pos: frame.view_proj * world,
        world_pos,
        world_normal,
        color: vertex.color,
        shadow_pos: shadow_coords(
            world_pos,
            world_normal,
            &frame.light_view_proj,
            normal_offset,
        ),
    }
}

/// Transforms an object space normal with the model matrix's upper 3x3.
///
/// This is not the inverse transpose, so the result is only correct for
/// rotations and uniform scale. Meshes are never scaled non-uniformly.
pub fn world_normal(model: &Mat4, normal: Vec3) -> Vec3 {
    (Mat3::from_mat4(*model) * normal).normalize()
}

/// Projects a normal-offset world position into shadow map texture space.
pub fn shadow_coords(
    world_pos: Vec3,
    world_normal: Vec3,
    light_view_proj: &Mat4,
    normal_offset: f32,
) -> Vec3 {
    let biased = world_pos + world_normal * normal_offset;
    clip_to_shadow_texture(*light_view_proj * biased.extend(1.0))
}

/// Maps light clip space to texture space, flipping v.
///
/// The light projection is orthographic (w == 1), so no divide happens and
/// z is kept as the comparison depth.
pub fn clip_to_shadow_texture(light_clip: Vec4) -> Vec3 {
    Vec3::new(
        light_clip.x * 0.5 + 0.5,
        -light_clip.y * 0.5 + 0.5,
        light_clip.z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> GlobalFrameState {
        GlobalFrameState {
            view_proj: Mat4::IDENTITY,
            light_view_proj: Mat4::IDENTITY,
            camera_pos: Vec3::new(0.0, 0.0, 5.0),
            sun_dir: Vec3::Y,
        }
    }

    #[test]
    fn world_and_clip_positions_follow_the_matrices() {
        let draw = PerDrawState {
            model: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            opacity: 1.0,
        };
        let mut frame = frame();
        frame.view_proj = Mat4::from_scale(Vec3::splat(2.0));
        let vertex = VertexAttributes {
            position: Vec3::ONE,
            color: Vec3::new(0.2, 0.4, 0.6),
            normal: Vec3::Y,
        };

        let out = transform_vertex(&vertex, &frame, &draw, NORMAL_OFFSET);
        assert_eq!(out.world_pos, Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(out.clip_pos, Vec4::new(4.0, 6.0, 8.0, 1.0));
        assert_eq!(out.color, vertex.color);
    }

    #[test]
    fn normals_are_rotated_and_renormalized() {
        let model = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2) * Mat4::from_scale(Vec3::splat(3.0));
        let normal = world_normal(&model, Vec3::X);
        assert!((normal - Vec3::Y).length() < 1e-5);
        assert!((normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shadow_position_is_offset_along_the_normal_and_flipped() {
        let coords = shadow_coords(Vec3::new(0.0, 0.5, 0.25), Vec3::Y, &Mat4::IDENTITY, 0.05);
        assert!((coords.x - 0.5).abs() < 1e-6);
        assert!((coords.y - (-(0.55) * 0.5 + 0.5)).abs() < 1e-6);
        assert!((coords.z - 0.25).abs() < 1e-6);
    }

    #[test]
    fn clip_corners_map_to_texture_corners() {
        let top_left = clip_to_shadow_texture(Vec4::new(-1.0, 1.0, 0.3, 1.0));
        let bottom_right = clip_to_shadow_texture(Vec4::new(1.0, -1.0, 0.7, 1.0));
        assert_eq!(top_left, Vec3::new(0.0, 0.0, 0.3));
        assert_eq!(bottom_right, Vec3::new(1.0, 1.0, 0.7));
    }
}

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Camera and sun state shared read-only by every invocation of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalFrameState {
    pub view_proj: Mat4,
    pub light_view_proj: Mat4,
    pub camera_pos: Vec3,
    /// Unit vector pointing from the surface towards the sun.
    pub sun_dir: Vec3,
}

/// Per draw call state: object placement and fade opacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerDrawState {
    pub model: Mat4,
    pub opacity: f32,
}

impl Default for PerDrawState {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            opacity: 1.0,
        }
    }
}

impl PerDrawState {
    pub fn with_opacity(opacity: f32) -> Self {
        Self {
            opacity,
            ..Self::default()
        }
    }
}

/// One vertex as stored in the mesh buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexAttributes {
    pub position: Vec3,
    /// Gamma encoded, components in [0, 1].
    pub color: Vec3,
    pub normal: Vec3,
}

/// Result of the geometry transform stage for a single vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    pub clip_pos: Vec4,
    pub world_pos: Vec3,
    pub world_normal: Vec3,
    pub color: Vec3,
    /// Shadow map texture coordinates in xy, comparison depth in z.
    pub shadow_pos: Vec3,
}

/// Attributes seen by the fragment stage after rasterization.
///
/// `frag_coord` is the window space position of the pixel (pixel centres sit
/// at `.5`), which is what the fragment stage receives as its clip position
/// builtin. `world_normal` is generally not unit length after interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentInput {
    pub frag_coord: Vec2,
    pub world_pos: Vec3,
    pub world_normal: Vec3,
    pub color: Vec3,
    pub shadow_pos: Vec3,
}

impl FragmentInput {
    /// Wraps a single vertex output as the fragment covering `frag_coord`.
    pub fn from_vertex(vertex: &VertexOutput, frag_coord: Vec2) -> Self {
        Self {
            frag_coord,
            world_pos: vertex.world_pos,
            world_normal: vertex.world_normal,
            color: vertex.color,
            shadow_pos: vertex.shadow_pos,
        }
    }

    /// Linear barycentric interpolation of a triangle's vertex outputs.
    pub fn interpolate(vertices: &[VertexOutput; 3], barycentric: Vec3, frag_coord: Vec2) -> Self {
        let [a, b, c] = vertices;
        let blend = |x: Vec3, y: Vec3, z: Vec3| {
            x * barycentric.x + y * barycentric.y + z * barycentric.z
        };
        Self {
            frag_coord,
            world_pos: blend(a.world_pos, b.world_pos, c.world_pos),
            world_normal: blend(a.world_normal, b.world_normal, c.world_normal),
            color: blend(a.color, b.color, c.color),
            shadow_pos: blend(a.shadow_pos, b.shadow_pos, c.shadow_pos),
        }
    }
}

use bytemuck::{Pod, Zeroable};

use crate::frame::{GlobalFrameState, PerDrawState, VertexAttributes};

/// Edge length of the sun shadow map.
pub const SHADOW_MAP_SIZE: u32 = 4096;
pub const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Per-frame uniform block, bound at group 0 binding 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub sun_dir: [f32; 4],
}

impl From<&GlobalFrameState> for GlobalUniform {
    fn from(frame: &GlobalFrameState) -> Self {
        Self {
            view_proj: frame.view_proj.to_cols_array_2d(),
            light_view_proj: frame.light_view_proj.to_cols_array_2d(),
            camera_pos: frame.camera_pos.extend(1.0).into(),
            sun_dir: frame.sun_dir.extend(0.0).into(),
        }
    }
}

impl GlobalUniform {
    /// Uniforms for the depth-only pass: the light matrix doubles as the
    /// view projection.
    pub fn for_shadow_pass(frame: &GlobalFrameState) -> Self {
        Self {
            view_proj: frame.light_view_proj.to_cols_array_2d(),
            ..Self::from(frame)
        }
    }
}

/// Per-draw uniform block, bound at group 1 binding 0.
///
/// `params.x` is the opacity, the other components are reserved.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LocalUniform {
    pub model: [[f32; 4]; 4],
    pub params: [f32; 4],
}

impl From<&PerDrawState> for LocalUniform {
    fn from(draw: &PerDrawState) -> Self {
        Self {
            model: draw.model.to_cols_array_2d(),
            params: [draw.opacity, 0.0, 0.0, 0.0],
        }
    }
}

/// Interleaved mesh vertex: position, gamma encoded color, normal.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl From<&Vertex> for VertexAttributes {
    fn from(vertex: &Vertex) -> Self {
        Self {
            position: vertex.pos.into(),
            color: vertex.color.into(),
            normal: vertex.normal.into(),
        }
    }
}

impl From<&VertexAttributes> for Vertex {
    fn from(vertex: &VertexAttributes) -> Self {
        Self {
            pos: vertex.position.into(),
            color: vertex.color.into(),
            normal: vertex.normal.into(),
        }
    }
}

/// Comparison sampler the fragment stage filters the shadow map with.
pub fn shadow_sampler_descriptor() -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("shadow-sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        compare: Some(wgpu::CompareFunction::LessEqual),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};

    #[test]
    fn uniform_blocks_match_the_shader_layout() {
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 160);
        assert_eq!(std::mem::size_of::<LocalUniform>(), 80);
        assert_eq!(std::mem::size_of::<Vertex>(), 36);
    }

    #[test]
    fn vertex_layout_is_position_color_normal() {
        let layout = Vertex::layout();
        assert_eq!(layout.array_stride, 36);
        let offsets: Vec<_> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        let locations: Vec<_> = layout.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }

    #[test]
    fn frame_state_packs_with_padding() {
        let frame = GlobalFrameState {
            view_proj: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            light_view_proj: Mat4::IDENTITY,
            camera_pos: Vec3::new(4.0, 5.0, 6.0),
            sun_dir: Vec3::Y,
        };
        let uniform = GlobalUniform::from(&frame);
        assert_eq!(uniform.view_proj[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.camera_pos, [4.0, 5.0, 6.0, 1.0]);
        assert_eq!(uniform.sun_dir, [0.0, 1.0, 0.0, 0.0]);

        let shadow = GlobalUniform::for_shadow_pass(&frame);
        assert_eq!(shadow.view_proj, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(bytemuck::bytes_of(&shadow).len(), 160);
    }

    #[test]
    fn opacity_lands_in_params_x() {
        let local = LocalUniform::from(&PerDrawState::with_opacity(0.25));
        assert_eq!(local.params, [0.25, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn vertex_round_trips_through_attributes() {
        let vertex = Vertex {
            pos: [1.0, 2.0, 3.0],
            color: [0.1, 0.2, 0.3],
            normal: [0.0, 0.0, 1.0],
        };
        assert_eq!(Vertex::from(&VertexAttributes::from(&vertex)), vertex);
    }

    #[test]
    fn sampler_compares_less_equal_with_clamped_edges() {
        let descriptor = shadow_sampler_descriptor();
        assert_eq!(descriptor.compare, Some(wgpu::CompareFunction::LessEqual));
        assert_eq!(descriptor.address_mode_u, wgpu::AddressMode::ClampToEdge);
        assert_eq!(descriptor.mag_filter, wgpu::FilterMode::Linear);
    }
}

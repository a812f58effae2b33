use glam::{Vec3, Vec4};
use rayon::prelude::*;

use crate::atmosphere::apply_fog;
use crate::config::ShadingConfig;
use crate::display::tonemap_and_encode;
use crate::dither::should_discard;
use crate::frame::{FragmentInput, GlobalFrameState, PerDrawState, VertexAttributes, VertexOutput};
use crate::lighting::{n_dot_l, shade_surface, SurfacePoint};
use crate::shadow::{fetch_shadow, ShadowMap, ShadowFilter};
use crate::transform::transform_vertex;

/// Vertex and fragment stages bound to one frame's read-only inputs.
///
/// Every method is a pure function of its arguments, the bound frame state
/// and the shadow map contents, so invocations can run in any order and on
/// any thread.
pub struct ShadingPipeline<'a, M: ShadowMap + ?Sized> {
    frame: &'a GlobalFrameState,
    config: &'a ShadingConfig,
    shadow_map: &'a M,
    shadow_filter: ShadowFilter,
    fog_color: Vec3,
}

impl<'a, M: ShadowMap + ?Sized> ShadingPipeline<'a, M> {
    pub fn new(frame: &'a GlobalFrameState, config: &'a ShadingConfig, shadow_map: &'a M) -> Self {
        Self {
            frame,
            config,
            shadow_map,
            shadow_filter: config.shadow_filter(),
            fog_color: config.fog_color(),
        }
    }

    pub fn frame(&self) -> &GlobalFrameState {
        self.frame
    }

    pub fn config(&self) -> &ShadingConfig {
        self.config
    }

    /// Geometry transform stage.
    pub fn shade_vertex(&self, draw: &PerDrawState, vertex: &VertexAttributes) -> VertexOutput {
        transform_vertex(vertex, self.frame, draw, self.config.normal_offset)
    }

    /// Fragment stage. Returns `None` when the transparency gate drops the
    /// fragment, otherwise the display encoded color with alpha 1.
    pub fn shade_fragment(&self, draw: &PerDrawState, fragment: &FragmentInput) -> Option<Vec4> {
        if should_discard(fragment.frag_coord, draw.opacity) {
            return None;
        }
        let hdr = self.shade_linear(fragment);
        Some(tonemap_and_encode(hdr, self.config.gamma).extend(1.0))
    }

    /// Lit and fogged scene-linear color, before display mapping.
    pub fn shade_linear(&self, fragment: &FragmentInput) -> Vec3 {
        let normal = fragment.world_normal.normalize();
        let sun_dir = self.frame.sun_dir;
        let shadow_raw = fetch_shadow(
            self.shadow_map,
            fragment.shadow_pos,
            n_dot_l(normal, sun_dir),
            &self.shadow_filter,
        );

        let surface = SurfacePoint {
            world_pos: fragment.world_pos,
            normal,
            // Zero at the camera itself, which saturates the rim term.
            view_dir: (self.frame.camera_pos - fragment.world_pos).normalize_or_zero(),
            color: fragment.color,
        };
        let lit = shade_surface(self.config, &surface, sun_dir, shadow_raw);
        apply_fog(
            self.frame.camera_pos,
            fragment.world_pos,
            lit,
            self.fog_color,
            self.config.fog_density,
        )
    }

    /// Runs the vertex stage over a buffer in parallel, preserving order.
    pub fn shade_vertices(&self, draw: &PerDrawState, vertices: &[VertexAttributes]) -> Vec<VertexOutput> {
        vertices
            .par_iter()
            .map(|vertex| self.shade_vertex(draw, vertex))
            .collect()
    }

    /// Runs the fragment stage over a buffer in parallel, preserving order.
    pub fn shade_fragments(&self, draw: &PerDrawState, fragments: &[FragmentInput]) -> Vec<Option<Vec4>> {
        fragments
            .par_iter()
            .map(|fragment| self.shade_fragment(draw, fragment))
            .collect()
    }
}

use glam::{Vec2, Vec3};
use log::{debug, info};
use rayon::prelude::*;

use crate::config::ShadingConfig;
use crate::display::{tonemap_and_encode, to_rgb8};
use crate::error::ShadowMapError;
use crate::frame::FragmentInput;
use crate::pipeline::ShadingPipeline;
use crate::scene::PlanetScene;
use crate::shadow::DepthShadowMap;

/// Output size and shadow resolution for a headless frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub shadow_map_size: u32,
}

impl RenderOptions {
    /// Number of pixels in the frame, counted in `usize` so large frames do
    /// not wrap.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            shadow_map_size: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Pixels whose final color came out of the fragment stage.
    pub shaded: usize,
    /// Fragments dropped by the transparency gate.
    pub discarded: usize,
    /// Pixels where no fragment survived.
    pub background: usize,
}

/// A rendered frame as tightly packed 8-bit RGB rows.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    pub stats: FrameStats,
}

enum PixelOutcome {
    Shaded([u8; 3], usize),
    Background(usize),
}

/// Bakes the sun shadow map and shades every pixel of the scene.
///
/// Each pixel walks its surface crossings front to back and keeps the first
/// fragment the transparency gate lets through, which is what depth testing
/// with discard produces on the GPU.
pub fn render_frame(
    scene: &PlanetScene,
    config: &ShadingConfig,
    options: &RenderOptions,
) -> Result<RenderedFrame, ShadowMapError> {
    let aspect = options.width as f32 / options.height.max(1) as f32;
    let frame = scene.frame_state(aspect, options.shadow_map_size);
    let shadow_map = scene.bake_shadow_map(&frame.light_view_proj, options.shadow_map_size)?;
    info!(
        "baked {}x{} shadow map",
        shadow_map.width(),
        shadow_map.height()
    );

    let pipeline = ShadingPipeline::new(&frame, config, &shadow_map);
    let inverse_view_proj = frame.view_proj.inverse();
    let viewport = Vec2::new(options.width as f32, options.height as f32);
    let background = to_rgb8(tonemap_and_encode(config.fog_color(), config.gamma));

    let width = options.width as usize;
    let outcomes: Vec<PixelOutcome> = (0..options.pixel_count())
        .into_par_iter()
        .map(|index| {
            let x = index % width;
            let y = index / width;
            let frag_coord = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            shade_pixel(scene, &pipeline, &inverse_view_proj, frag_coord, viewport)
        })
        .collect();

    let mut stats = FrameStats::default();
    let mut rgb = Vec::with_capacity(outcomes.len() * 3);
    for outcome in outcomes {
        match outcome {
            PixelOutcome::Shaded(color, discarded) => {
                stats.shaded += 1;
                stats.discarded += discarded;
                rgb.extend_from_slice(&color);
            }
            PixelOutcome::Background(discarded) => {
                stats.background += 1;
                stats.discarded += discarded;
                rgb.extend_from_slice(&background);
            }
        }
    }
    debug!("frame stats: {stats:?}");

    Ok(RenderedFrame {
        width: options.width,
        height: options.height,
        rgb,
        stats,
    })
}

fn shade_pixel(
    scene: &PlanetScene,
    pipeline: &ShadingPipeline<'_, DepthShadowMap>,
    inverse_view_proj: &glam::Mat4,
    frag_coord: Vec2,
    viewport: Vec2,
) -> PixelOutcome {
    let (origin, dir, span) = scene.camera_ray(inverse_view_proj, frag_coord, viewport);
    let mut discarded = 0;
    for hit in scene.hits_along(origin, dir, span) {
        let draw = scene.objects[hit.object].draw_state();
        let vertex = pipeline.shade_vertex(&draw, &hit.vertex);
        let fragment = FragmentInput::from_vertex(&vertex, frag_coord);
        match pipeline.shade_fragment(&draw, &fragment) {
            Some(color) => return PixelOutcome::Shaded(to_rgb8(color.truncate()), discarded),
            None => discarded += 1,
        }
    }
    PixelOutcome::Background(discarded)
}

/// Mean display color of the pixels, handy for coarse comparisons.
pub fn mean_color(frame: &RenderedFrame) -> Vec3 {
    let pixels = frame.rgb.len() / 3;
    if pixels == 0 {
        return Vec3::ZERO;
    }
    let sum = frame
        .rgb
        .chunks_exact(3)
        .fold(Vec3::ZERO, |acc, px| {
            acc + Vec3::new(px[0] as f32, px[1] as f32, px[2] as f32)
        });
    sum / (pixels as f32 * 255.0)
}

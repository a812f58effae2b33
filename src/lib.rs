//! Per-vertex and per-fragment shading for voxel planet terrain.
//!
//! The stages mirror the GPU pipeline one to one: the vertex transform,
//! the filtered sun shadow lookup, the lighting compositor, distance fog,
//! filmic tonemapping and the dithered transparency gate used while chunks
//! fade in and out. Everything runs on the CPU so the math can be tested
//! and reused by headless tools; [`gpu`] carries the matching WGSL and
//! buffer layouts for a wgpu host.

pub mod app;
pub mod atmosphere;
pub mod config;
pub mod display;
pub mod dither;
pub mod error;
pub mod fade;
pub mod frame;
pub mod gpu;
pub mod lighting;
pub mod noise;
pub mod pipeline;
pub mod scene;
pub mod shadow;
pub mod transform;

pub use app::{render_frame, FrameStats, RenderOptions, RenderedFrame};
pub use config::ShadingConfig;
pub use error::{ConfigError, ShadowMapError};
pub use fade::{FadeDirection, FadeState};
pub use frame::{FragmentInput, GlobalFrameState, PerDrawState, VertexAttributes, VertexOutput};
pub use pipeline::ShadingPipeline;
pub use scene::{PlanetScene, SceneObject, Sphere};
pub use shadow::{DepthShadowMap, ShadowFilter, ShadowMap};

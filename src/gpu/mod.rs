//! Binding contract for running the pipeline on the GPU.
//!
//! Only plain data and descriptors live here; creating devices, buffers and
//! textures is left to the host renderer.

mod layout;
mod shader;

pub use layout::{
    shadow_sampler_descriptor, GlobalUniform, LocalUniform, Vertex, SHADOW_FORMAT, SHADOW_MAP_SIZE,
};
pub use shader::SHADER;

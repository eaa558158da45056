//! wgpu renderer for the horizon scene: surface management, the sky and lit
//! mesh passes, and ACES tone mapping.

pub mod buffer;
pub mod depth;
pub mod gpu;
pub mod mesh_pipeline;
pub mod pass;
pub mod renderer;
pub mod shader;
pub mod sky_pipeline;
pub mod surface;
pub mod tonemap;

#[cfg(test)]
mod test_support;

pub use buffer::{BufferAllocator, MeshBuffer, VertexPositionNormal};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use mesh_pipeline::{CameraUniform, GpuMesh, LightUniform, MeshPipeline, ModelUniform};
pub use pass::{CLEAR_COLOR, FrameEncoder, RenderPassBuilder};
pub use renderer::GpuRenderer;
pub use shader::{ShaderError, ShaderLibrary};
pub use sky_pipeline::SkyPipeline;
pub use surface::{PhysicalSize, SurfaceTracker};
pub use tonemap::{aces_filmic, tone_map};
